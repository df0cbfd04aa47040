use rocket::{Request, catch, serde::json::Json};
use poll_shared::error::{ErrorCode, ErrorResponse};

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::InvalidInput, "Invalid request parameters."))
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> Json<ErrorResponse> {
    let error_msg = match req.headers().get_one("Authorization") {
        Some(_) => "Wrong admin password.",
        None => "Admin password required.",
    };
    Json(ErrorResponse::new(ErrorCode::Unauthorized, error_msg))
}

#[catch(403)]
pub fn forbidden(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::Unauthorized, "Access forbidden."))
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::NotFound, "The requested resource was not found."))
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::InvalidInput, "The request body could not be read."))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::SystemError, "An internal server error occurred."))
}
