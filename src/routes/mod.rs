pub mod health;
pub mod tasks;

use actix_web::{error::JsonPayloadError, web, HttpRequest};
use std::sync::Arc;

use crate::auth::{AuthMiddleware, TokenVerifier};
use crate::error::AppError;

/// Mounts the versioned API under `/api/v1`, behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig, verifier: Arc<TokenVerifier>) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(AuthMiddleware::new(verifier))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(|_, _| {
                AppError::task_not_found().into()
            }))
            .service(
                web::scope("/tasks")
                    .service(tasks::list_tasks)
                    .service(tasks::create_task)
                    .service(tasks::get_task)
                    .service(tasks::replace_task)
                    .service(tasks::update_task)
                    .service(tasks::delete_task),
            ),
    );
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}
