use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

use crate::auth::{AuthError, AuthenticatedUser, TokenVerifier};
use crate::error::AppError;

/// Verifies the Bearer token on every request passing through the wrapped scope.
///
/// On success the verified identity is stored in the request extensions as an
/// [`AuthenticatedUser`]. On failure the request is answered with 401 before
/// any extractor or handler runs, so unauthenticated requests never reach the store.
pub struct AuthMiddleware {
    verifier: Arc<TokenVerifier>,
}

impl AuthMiddleware {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            verifier: Arc::clone(&self.verifier),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = bearer_token(req.headers()).and_then(|token| self.verifier.verify(token));

        match outcome {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                log::warn!(
                    "Authentication failed ({}) for {} {}",
                    err.kind(),
                    req.method(),
                    req.path()
                );
                let response = AppError::Unauthorized(err).error_response();
                let res = req.into_response(response).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// An absent header or an empty Bearer value counts as no credential at all;
/// any other shape is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| AuthError::MalformedCredential)?,
        None => return Err(AuthError::MissingCredential),
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredential);
    }

    match token.trim() {
        "" => Err(AuthError::MissingCredential),
        token => Ok(token),
    }
}
