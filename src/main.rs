use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use todo_api::auth::TokenVerifier;
use todo_api::config::Config;
use todo_api::routes::{self, health};
use todo_api::store::{postgres, PgTaskStore};
use todo_api::TaskService;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = postgres::connect(&config)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    if config.run_migrations {
        postgres::migrate(&pool)
            .await
            .map_err(|e| startup_error("Failed to run migrations", e))?;
    }

    let store = PgTaskStore::new(pool.clone(), config.db_query_timeout);
    let tasks = web::Data::new(TaskService::new(Arc::new(store)));
    let verifier = Arc::new(TokenVerifier::new(&config.auth_secret));
    let frontend_url = config.frontend_url.clone();

    log::info!("Starting todo-api at {}", config.server_url());
    HttpServer::new(move || {
        let verifier = Arc::clone(&verifier);
        App::new()
            .app_data(tasks.clone())
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allowed_origin(&frontend_url)
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
                    .max_age(3600),
            )
            .service(health::health)
            .service(health::index)
            .configure(|cfg| routes::config(cfg, verifier))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    log::info!("Server stopped; draining connection pool");
    pool.close().await;
    Ok(())
}
