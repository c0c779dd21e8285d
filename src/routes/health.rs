use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

const SERVICE: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Liveness probe for load balancers. Public, touches no store.
///
/// ## Responses
/// - `200 OK`: `{"status": "healthy", "service", "version", "timestamp"}`
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": SERVICE,
        "version": VERSION,
        "timestamp": Utc::now()
    }))
}

/// Service banner.
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Task Management API",
        "version": VERSION
    }))
}
