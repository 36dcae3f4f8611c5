use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    auth::AuthUser,
    errors::{ApiError, ErrorResponse},
    services::preferences::{PreferenceInput, PreferenceResponse},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/preferences",
    responses((status = 200, description = "Preference list", body = [PreferenceResponse])),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn list_preferences(State(state): State<AppState>) -> Result<Response, ApiError> {
    let preferences = state
        .services
        .preferences
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(preferences))
}

/// Preferences saved by the caller
#[utoipa::path(
    get,
    path = "/api/preferences/user",
    responses((status = 200, description = "Caller's preferences", body = [PreferenceResponse])),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn my_preferences(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Response, ApiError> {
    let preferences = state
        .services
        .preferences
        .list_for_user(caller.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(preferences))
}

#[utoipa::path(
    get,
    path = "/api/preferences/{id}",
    params(("id" = i32, Path, description = "Preference ID")),
    responses(
        (status = 200, description = "Preference found", body = PreferenceResponse),
        (status = 404, description = "Preference not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn get_preference(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let preference = state
        .services
        .preferences
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(preference))
}

/// Save an equipment selection; the owner defaults to the caller
#[utoipa::path(
    post,
    path = "/api/preferences",
    request_body = PreferenceInput,
    responses(
        (status = 201, description = "Preference created", body = PreferenceResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn create_preference(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<PreferenceInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .preferences
        .create(caller.user_id, payload)
        .await
        .map_err(map_service_error)?;
    info!("Preference created: {}", created.id);
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/preferences/{id}",
    params(("id" = i32, Path, description = "Preference ID")),
    request_body = PreferenceInput,
    responses(
        (status = 200, description = "Preference updated", body = PreferenceResponse),
        (status = 404, description = "Preference not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn update_preference(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PreferenceInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .preferences
        .update(id, caller.user_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/preferences/{id}",
    params(("id" = i32, Path, description = "Preference ID")),
    responses(
        (status = 204, description = "Preference deleted"),
        (status = 404, description = "Preference not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn delete_preference(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .preferences
        .delete(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(list_preferences).post(create_preference))
        .route("/preferences/user", get(my_preferences))
        .route(
            "/preferences/:id",
            get(get_preference)
                .put(update_preference)
                .delete(delete_preference),
        )
}
