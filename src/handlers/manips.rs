use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    auth::AuthUser,
    errors::{ApiError, ErrorResponse},
    services::manips::{ManipFilter, ManipInput, ManipResponse},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List manips, optionally restricted to a calendar range and location
#[utoipa::path(
    get,
    path = "/api/manips",
    params(ManipFilter),
    responses(
        (status = 200, description = "Manip list", body = [ManipResponse]),
        (status = 422, description = "Invalid range", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn list_manips(
    State(state): State<AppState>,
    Query(filter): Query<ManipFilter>,
) -> Result<Response, ApiError> {
    let manips = state
        .services
        .manips
        .list(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(manips))
}

/// Manips the caller owns or belongs to as a team member
#[utoipa::path(
    get,
    path = "/api/manips/user",
    responses((status = 200, description = "Caller's manips", body = [ManipResponse])),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn my_manips(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Response, ApiError> {
    let manips = state
        .services
        .manips
        .list_for_user(caller.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(manips))
}

#[utoipa::path(
    get,
    path = "/api/manips/{id}",
    params(("id" = i32, Path, description = "Manip ID")),
    responses(
        (status = 200, description = "Manip found", body = ManipResponse),
        (status = 404, description = "Manip not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn get_manip(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let manip = state
        .services
        .manips
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(manip))
}

/// Reserve equipment. With a `recurrence`, every occurrence is created or none is.
#[utoipa::path(
    post,
    path = "/api/manips",
    request_body = ManipInput,
    responses(
        (status = 201, description = "Manip created; a list when a recurrence was given", body = ManipResponse),
        (status = 409, description = "Concurrent reservation, retry", body = ErrorResponse),
        (status = 422, description = "Validation or reservation rule failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn create_manip(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<ManipInput>,
) -> Result<Response, ApiError> {
    let recurring = payload.recurrence.is_some();
    let mut created = state
        .services
        .manips
        .create(caller.user_id, payload)
        .await
        .map_err(map_service_error)?;
    info!("Manips created: {}", created.len());

    if recurring {
        return Ok(created_response(created));
    }
    match created.pop() {
        Some(manip) => Ok(created_response(manip)),
        None => Err(ApiError::BadRequest("No manip was created".to_string())),
    }
}

#[utoipa::path(
    put,
    path = "/api/manips/{id}",
    params(("id" = i32, Path, description = "Manip ID")),
    request_body = ManipInput,
    responses(
        (status = 200, description = "Manip updated", body = ManipResponse),
        (status = 404, description = "Manip not found", body = ErrorResponse),
        (status = 409, description = "Concurrent reservation, retry", body = ErrorResponse),
        (status = 422, description = "Validation or reservation rule failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn update_manip(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ManipInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .manips
        .update(id, caller.user_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/manips/{id}",
    params(("id" = i32, Path, description = "Manip ID")),
    responses(
        (status = 204, description = "Manip deleted"),
        (status = 404, description = "Manip not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "manips"
)]
pub async fn delete_manip(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .manips
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Manip deleted: {}", id);
    Ok(no_content_response())
}

pub fn manip_routes() -> Router<AppState> {
    Router::new()
        .route("/manips", get(list_manips).post(create_manip))
        .route("/manips/user", get(my_manips))
        .route(
            "/manips/:id",
            get(get_manip).put(update_manip).delete(delete_manip),
        )
}
