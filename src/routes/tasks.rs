use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTask, ReplaceTask, UpdateTask},
    service::TaskService,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

/// Lists the authenticated user's tasks.
///
/// Tasks are ordered by creation date, newest first. A user without tasks
/// gets an empty array.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects.
/// - `401 Unauthorized`: missing, malformed, mis-signed or expired token.
#[get("")]
pub async fn list_tasks(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list(user.id()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// The owner is always the authenticated user; any owner field in the body
/// is ignored.
///
/// ## Request Body:
/// - `title`: required, 1-200 characters after trimming.
/// - `description` (optional): at most 2000 characters.
///
/// ## Responses:
/// - `201 Created`: the new `Task`, with `completed: false`.
/// - `400 Bad Request`: the body is not valid JSON or a field fails validation.
/// - `401 Unauthorized`
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    body: web::Json<CreateTask>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(user.id(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `401 Unauthorized`
/// - `404 Not Found`: no such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(user.id(), task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces every mutable field of a task.
///
/// ## Request Body:
/// - `title`: required.
/// - `description` (optional): cleared when omitted.
/// - `completed`: required.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`, `401 Unauthorized`, `404 Not Found`
#[put("/{id}")]
pub async fn replace_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    body: web::Json<ReplaceTask>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .replace(user.id(), task_id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates only the fields present in the body.
///
/// `{"completed": true}` flips the flag and leaves title and description as
/// they were. `"description": null` clears the description.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`, `401 Unauthorized`, `404 Not Found`
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    body: web::Json<UpdateTask>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(user.id(), task_id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Permanently deletes a task. Deleting it again yields 404.
///
/// ## Responses:
/// - `204 No Content`
/// - `401 Unauthorized`, `404 Not Found`
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks.delete(user.id(), task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
