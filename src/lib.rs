#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "A todo list backend: Bearer-token authentication against a shared HS256 secret,"]
#![doc = "and task CRUD in which every operation is scoped to the verified user."]
#![doc = "The binary (`main.rs`) wires configuration, the Postgres pool and the HTTP server"]
#![doc = "together; tests build the same routes over the in-memory store."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;

pub use crate::error::AppError;
pub use crate::service::TaskService;
