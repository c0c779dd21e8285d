use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::{AuthError, UserId};
use crate::error::AppError;

/// The verified identity of the caller.
///
/// `AuthMiddleware` inserts it into the request extensions after the Bearer
/// token checks out; handlers take it as an argument and pass the inner
/// [`UserId`] to every store operation.
///
/// If the extension is absent (the route is not wrapped by `AuthMiddleware`),
/// extraction fails with 401 rather than falling back to any default identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    pub fn id(&self) -> &UserId {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                log::error!(
                    "No authenticated user on {}; is AuthMiddleware applied?",
                    req.path()
                );
                ready(Err(AppError::Unauthorized(AuthError::MissingCredential).into()))
            }
        }
    }
}
