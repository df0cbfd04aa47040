use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use thiserror::Error;
use poll_shared::error::{ErrorCode, ErrorResponse};
use poll_shared::validation::ValidationError;
use crate::generator::GenerationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Generation(GenerationError::MissingApiKey) => Status::BadRequest,
            ApiError::Generation(_) => Status::BadGateway,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::ValidationFailed,
            ApiError::Generation(_) => ErrorCode::GenerationFailed,
            ApiError::Internal(_) => ErrorCode::SystemError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = Json(ErrorResponse::new(self.code(), self.to_string()));

        rocket::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
