//! HTTP handlers for the task and user services.
//!
//! Thin verb→store mapping. Validation and relation guards live here; the
//! store stays dumb CRUD. All state is injected through `SharedState` — no
//! globals, so tests can stand up as many servers as they like.

use crate::error::ApiError;
use crate::models::{
    CreateTaskRequest, Envelope, Task, TaskPatch, TaskResponse, User, UserDetailResponse,
    UserPayload,
};
use crate::store::{NewTask, Store};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

// ── Shared state ───────────────────────────────────────────────

pub struct AppState {
    pub store: Store,
}

pub type SharedState = Arc<AppState>;

// ── Router ─────────────────────────────────────────────────────

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Helpers ────────────────────────────────────────────────────

/// Join a task with its assignee/creator rows. Dangling references
/// resolve to None rather than an error.
fn join_users(store: &Store, task: Task) -> Result<TaskResponse, ApiError> {
    let assignee = match task.assignee_id {
        Some(id) => store.get_user(id)?,
        None => None,
    };
    let creator = store.get_user(task.creator_id)?;
    Ok(TaskResponse::new(task, assignee, creator))
}

fn require(field: Option<String>, message: &str) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::Validation(message.to_string())),
    }
}

// ── Task service ───────────────────────────────────────────────

// POST /api/tasks
async fn create_task(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let (title, creator_id) = match (payload.title, payload.creator_id) {
        (Some(title), Some(creator_id)) if !title.trim().is_empty() => (title, creator_id),
        _ => {
            return Err(ApiError::Validation(
                "Title and creatorId are required".to_string(),
            ))
        }
    };

    let task = state.store.create_task(NewTask {
        title,
        description: payload.description.unwrap_or_default(),
        assignee_id: payload.assignee_id,
        creator_id,
        due_date: payload.due_date,
    })?;

    let response = join_users(&state.store, task)?;
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/tasks
async fn list_tasks(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.store.list_tasks()?;

    let mut responses = Vec::with_capacity(tasks.len());
    for task in tasks {
        responses.push(join_users(&state.store, task)?);
    }
    Ok(Json(responses))
}

// GET /api/tasks/:id
async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .store
        .get_task(id)?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(join_users(&state.store, task)?))
}

// PUT /api/tasks/:id
async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskResponse>, ApiError> {
    let mut task = state
        .store
        .get_task(id)?
        .ok_or(ApiError::NotFound("Task"))?;

    // Partial patch: absent fields stay untouched; explicit null clears
    // the nullable fields. Title is required, so it can't be cleared.
    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title cannot be blank".to_string()));
        }
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(assignee_id) = patch.assignee_id {
        task.assignee_id = assignee_id;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    task.updated_at = Utc::now();

    state.store.update_task(&task)?;
    Ok(Json(join_users(&state.store, task)?))
}

// DELETE /api/tasks/:id
async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_task(id)? {
        return Err(ApiError::NotFound("Task"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── User service ───────────────────────────────────────────────

// POST /api/users
async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<UserPayload>,
) -> Result<(StatusCode, Json<Envelope<User>>), ApiError> {
    let name = require(payload.name, "Name and email are required")?;
    let email = require(payload.email, "Name and email are required")?;

    let user = state.store.create_user(name, email)?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(user))))
}

// GET /api/users
async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list_users()?))
}

// GET /api/users/:id
async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Envelope<UserDetailResponse>>, ApiError> {
    let user = state
        .store
        .get_user(id)?
        .ok_or(ApiError::NotFound("User"))?;

    let detail = UserDetailResponse {
        tasks: state.store.tasks_assigned_to(id)?,
        created_tasks: state.store.tasks_created_by(id)?,
        id: user.id,
        name: user.name,
        email: user.email,
    };
    Ok(Json(Envelope::ok(detail)))
}

// PUT /api/users/:id
async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<Envelope<User>>, ApiError> {
    let name = require(payload.name, "Name and email are required")?;
    let email = require(payload.email, "Name and email are required")?;

    let user = state
        .store
        .update_user(id, name, email)?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(Envelope::ok(user)))
}

// DELETE /api/users/:id
//
// Deleting a creator would leave tasks with a dangling required reference,
// so that's a 409. Assignee references are nullified instead.
async fn delete_user(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.store.get_user(id)?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    let created = state.store.tasks_created_by(id)?;
    if !created.is_empty() {
        return Err(ApiError::Conflict(format!(
            "Cannot delete user: creator of {} task(s)",
            created.len()
        )));
    }

    state.store.clear_assignee(id)?;
    state.store.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}
