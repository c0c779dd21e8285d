mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{rt, test, App, HttpServer};
use chrono::{Duration, Utc};
use common::{bearer, init_app, issuer, task_service, SECRET};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use todo_api::auth::{TokenIssuer, TokenVerifier, UserId};
use todo_api::routes::{self, health};

async fn expect_unauthorized(authorization: Option<String>, expected_detail: &str) {
    let app = init_app().await;

    let mut req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .set_json(json!({ "title": "should never be stored" }));
    if let Some(value) = authorization {
        req = req.append_header((header::AUTHORIZATION, value));
    }
    let resp = test::call_service(&app, req.to_request()).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], expected_detail);
}

#[test_log::test(actix_rt::test)]
async fn test_missing_token() {
    expect_unauthorized(None, "Missing authentication token").await;
    expect_unauthorized(Some("Bearer ".to_string()), "Missing authentication token").await;
}

#[test_log::test(actix_rt::test)]
async fn test_malformed_token() {
    expect_unauthorized(Some("Bearer not.a.jwt".to_string()), "Invalid token").await;
    expect_unauthorized(Some("Bearer garbage".to_string()), "Invalid token").await;
    expect_unauthorized(Some("Basic dXNlcjpwYXNz".to_string()), "Invalid token").await;
}

#[test_log::test(actix_rt::test)]
async fn test_token_signed_with_other_secret() {
    let token = TokenIssuer::new("some-other-secret", Duration::hours(1))
        .issue(&UserId::new("1"))
        .unwrap();
    expect_unauthorized(
        Some(format!("Bearer {}", token)),
        "Token signature verification failed",
    )
    .await;
}

#[test_log::test(actix_rt::test)]
async fn test_expired_token() {
    let token = issuer()
        .issue_expiring_at(&UserId::new("1"), Utc::now() - Duration::minutes(1))
        .unwrap();
    expect_unauthorized(Some(format!("Bearer {}", token)), "Token expired").await;
}

#[test_log::test(actix_rt::test)]
async fn test_every_task_endpoint_requires_a_token() {
    let app = init_app().await;
    let uri = format!("/api/v1/tasks/{}", uuid::Uuid::new_v4());

    let requests = vec![
        test::TestRequest::get().uri("/api/v1/tasks"),
        test::TestRequest::post()
            .uri("/api/v1/tasks")
            .set_json(json!({ "title": "x" })),
        test::TestRequest::get().uri(&uri),
        test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "title": "x", "completed": true })),
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "completed": true })),
        test::TestRequest::delete().uri(&uri),
    ];
    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // Authentication is checked before the body or path is looked at.
    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .set_payload("{not json")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let req = test::TestRequest::get()
        .uri("/api/v1/tasks/not-a-uuid")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[test_log::test(actix_rt::test)]
async fn test_rejected_token_does_not_create_a_task() {
    let app = init_app().await;

    let expired = issuer()
        .issue_expiring_at(&UserId::new("1"), Utc::now() - Duration::seconds(1))
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", expired)))
        .set_json(json!({ "title": "ghost" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/tasks")
        .append_header(bearer("1"))
        .to_request();
    let tasks: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(tasks.is_empty());
}

#[test_log::test(actix_rt::test)]
async fn test_health_is_public() {
    let app = init_app().await;
    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[test_log::test(actix_rt::test)]
async fn test_unauthorized_over_real_server() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let tasks = task_service();
    let verifier = Arc::new(TokenVerifier::new(SECRET));
    let server = HttpServer::new(move || {
        let verifier = Arc::clone(&verifier);
        App::new()
            .app_data(tasks.clone())
            .service(health::health)
            .configure(|cfg| routes::config(cfg, verifier))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/v1/tasks", port);

    let resp = client
        .post(&url)
        .json(&json!({ "title": "Unauthorized Task" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Missing authentication token");

    let resp = client
        .post(&url)
        .bearer_auth(common::token_for("42"))
        .json(&json!({ "title": "Authorized Task" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["owner_id"], "42");
    assert_eq!(body["completed"], false);

    handle.stop(true).await;
}
