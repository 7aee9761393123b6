use crate::api::session;
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, NotFoundResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi};
use validator::Validate;

/// Builds a router for all the task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_data): AppState,
                 session: session::Session,
                 Query(list_query): Query<TaskListQuery>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    list_tasks(
                        session.user_id,
                        list_query,
                        Utc::now().date_naive(),
                        &mut ext_cxn,
                        &task_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/",
            post(
                |State(app_data): AppState,
                 session: session::Session,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    create_task(session.user_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |State(app_data): AppState,
                 session: session::Session,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    get_task(session.user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            patch(
                |State(app_data): AppState,
                 session: session::Session,
                 Path(task_id): Path<i32>,
                 Json(task_update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    update_task(
                        session.user_id,
                        task_id,
                        task_update,
                        &mut ext_cxn,
                        &task_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/:task_id/complete",
            patch(
                |State(app_data): AppState,
                 session: session::Session,
                 Path(task_id): Path<i32>,
                 Json(completion): Json<dto::task::SetTaskCompletion>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    set_task_completion(
                        session.user_id,
                        task_id,
                        completion,
                        &mut ext_cxn,
                        &task_service,
                    )
                    .await
                },
            ),
        )
        .route(
            "/:task_id",
            delete(
                |State(app_data): AppState,
                 session: session::Session,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::todo::TaskService {};

                    delete_task(session.user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

#[derive(OpenApi)]
#[openapi(paths(
    list_tasks,
    create_task,
    get_task,
    update_task,
    set_task_completion,
    delete_task,
))]
pub struct TasksApi;

/// Query parameters accepted when listing tasks
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Restricts the list to upcoming, overdue, or completed tasks
    pub filter: Option<dto::task::TaskStatusFilter>,
}

/// Maps task lookup and mutation failures onto API error responses
fn task_error_response(err: TaskError) -> ErrorResponse {
    match err {
        TaskError::TaskNotFound => NotFoundResponse.into(),
        TaskError::InvalidParent => (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse::new(
                "invalid_parent",
                "The specified parent task does not exist or cannot be used as a parent.",
            )),
        )
            .into(),
        TaskError::PortError(port_err) => {
            error!("Task request failure: {port_err}");
            GenericErrorResponse(port_err).into()
        }
    }
}

/// Lists the signed-in user's top-level tasks, optionally narrowed to a status slice
#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    params(TaskListQuery),
    responses(
        (status = 200, description = "The user's tasks", body = Vec<dto::task::TodoTask>),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn list_tasks(
    user_id: i32,
    list_query: TaskListQuery,
    today: NaiveDate,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<Vec<dto::task::TodoTask>>, ErrorResponse> {
    info!("Task list requested for user {user_id}");
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};

    let tasks = task_service
        .tasks_for_user(
            user_id,
            list_query.filter.map(Into::into),
            today,
            &mut *ext_cxn,
            &task_read,
        )
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Creates a new task owned by the signed-in user
#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    security(("bearer_token" = [])),
    request_body = inline(dto::task::NewTask),
    responses(
        (status = 201, description = "Task successfully created", body = dto::task::InsertedTask),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn create_task(
    user_id: i32,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::task::InsertedTask>), ErrorResponse> {
    info!("Creating a task for user {user_id}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    let domain_task: domain::todo::NewTask = new_task.into();
    let new_task_id = task_service
        .create_task_for_user(user_id, &domain_task, &mut *ext_cxn, &task_read, &task_write)
        .await
        .map_err(task_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::task::InsertedTask { id: new_task_id }),
    ))
}

/// Retrieves one of the signed-in user's tasks along with its nested children
#[utoipa::path(
    get,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to look up"),
    ),
    responses(
        (status = 200, description = "The requested task", body = dto::task::TodoTask),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn get_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<Json<dto::task::TodoTask>, ErrorResponse> {
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};

    let task = task_service
        .user_task_by_id(user_id, task_id, &mut *ext_cxn, &task_read)
        .await
        .map_err(task_error_response)?;

    Ok(Json(task.into()))
}

/// Replaces the content of one of the signed-in user's tasks
#[utoipa::path(
    patch,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to update"),
    ),
    request_body = inline(dto::task::UpdateTask),
    responses(
        (status = 200, description = "Task successfully updated"),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn update_task(
    user_id: i32,
    task_id: i32,
    task_update: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Updating task {task_id} for user {user_id}");
    task_update
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    let domain_update: domain::todo::UpdateTask = task_update.into();
    task_service
        .update_task(
            user_id,
            task_id,
            &domain_update,
            &mut *ext_cxn,
            &task_read,
            &task_write,
        )
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::OK)
}

/// Marks one of the signed-in user's tasks complete or incomplete
#[utoipa::path(
    patch,
    path = "/todos/{task_id}/complete",
    tag = "todos",
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to mark"),
    ),
    request_body = inline(dto::task::SetTaskCompletion),
    responses(
        (status = 200, description = "Completion state successfully changed"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn set_task_completion(
    user_id: i32,
    task_id: i32,
    completion: dto::task::SetTaskCompletion,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    task_service
        .set_task_completion(
            user_id,
            task_id,
            completion.is_complete,
            &mut *ext_cxn,
            &task_read,
            &task_write,
        )
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::OK)
}

/// Deletes one of the signed-in user's tasks along with its descendants
#[utoipa::path(
    delete,
    path = "/todos/{task_id}",
    tag = "todos",
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to delete"),
    ),
    responses(
        (status = 204, description = "Task successfully deleted"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn delete_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::todo::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id} for user {user_id}");
    let task_read = persistence::db_todo_driven_ports::DbTaskReader {};
    let task_write = persistence::db_todo_driven_ports::DbTaskWriter {};

    task_service
        .delete_task(user_id, task_id, &mut *ext_cxn, &task_read, &task_write)
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
