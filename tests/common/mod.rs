#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::header,
    test, web, App,
};
use chrono::Duration;
use std::sync::Arc;
use todo_api::auth::{TokenIssuer, TokenVerifier, UserId};
use todo_api::routes::{self, health};
use todo_api::store::MemoryTaskStore;
use todo_api::TaskService;

pub const SECRET: &str = "integration-test-secret";

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::hours(1))
}

pub fn token_for(user: &str) -> String {
    issuer()
        .issue(&UserId::new(user))
        .expect("failed to issue test token")
}

/// `Authorization` header pair for `user`.
pub fn bearer(user: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
}

pub fn task_service() -> web::Data<TaskService> {
    web::Data::new(TaskService::new(Arc::new(MemoryTaskStore::new())))
}

/// The full application over a fresh in-memory store.
pub async fn init_app() -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    init_app_with(task_service()).await
}

/// The full application over the given service.
pub async fn init_app_with(
    tasks: web::Data<TaskService>,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let verifier = Arc::new(TokenVerifier::new(SECRET));
    test::init_service(
        App::new()
            .app_data(tasks)
            .service(health::health)
            .configure(|cfg| routes::config(cfg, verifier)),
    )
    .await
}
