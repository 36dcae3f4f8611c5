use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    auth::AuthUser,
    entities::user,
    errors::{ApiError, ErrorResponse},
    services::users::UserInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, put},
    Router,
};
use tracing::info;

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "User list", body = [user::Model])),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    let users = state
        .services
        .users
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(users))
}

/// Every user except the caller, used to pick team members
#[utoipa::path(
    get,
    path = "/api/users/other-users",
    responses((status = 200, description = "Other users", body = [user::Model])),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn other_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Response, ApiError> {
    let users = state
        .services
        .users
        .other_users(caller.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = user::Model),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let user = state
        .services
        .users
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(user))
}

/// Create a user; the password is stored as an argon2 hash
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = user::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .users
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("User created: {}", created.id);
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UserInput,
    responses(
        (status = 200, description = "User updated", body = user::Model),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .users
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Set the calendar color of a user
#[utoipa::path(
    put,
    path = "/api/users/{id}/change-color/{color}",
    params(
        ("id" = i32, Path, description = "User ID"),
        ("color" = String, Path, description = "Six hex digits, without '#'"),
    ),
    responses(
        (status = 200, description = "Color changed", body = user::Model),
        (status = 422, description = "Invalid color", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_color(
    State(state): State<AppState>,
    Path((id, color)): Path<(i32, String)>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .users
        .change_color(id, &color)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Delete a user with everything they own
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .users
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("User deleted: {}", id);
    Ok(no_content_response())
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/other-users", get(other_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/change-color/:color", put(change_color))
}
