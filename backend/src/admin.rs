use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::constant_time::verify_slices_are_equal;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use tracing::{error, warn};
use crate::routes::AppState;

pub struct AdminGate {
    password: String,
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self { password: password.into() }
    }

    pub fn check(&self, candidate: &str) -> bool {
        verify_slices_are_equal(self.password.as_bytes(), candidate.as_bytes()).is_ok()
    }
}

/// Password part of an `Authorization: Basic ...` header. The user name is ignored.
pub fn basic_password(header: &str) -> Option<String> {
    let encoded = header.strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (_, password) = decoded.split_once(':')?;
    Some(password.to_string())
}

/// Request guard for the host views.
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AppState>() else {
            error!("AppState not managed - admin gate closed");
            return Outcome::Error((Status::InternalServerError, ()));
        };

        let password = req.headers().get_one("Authorization").and_then(basic_password);
        match password {
            Some(password) if state.admin.check(&password) => Outcome::Success(AdminSession),
            Some(_) => {
                warn!("Rejected admin login with wrong password");
                Outcome::Error((Status::Unauthorized, ()))
            }
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
