use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    entities::location,
    errors::{ApiError, ErrorResponse},
    services::locations::{LocationFilter, LocationInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List locations
#[utoipa::path(
    get,
    path = "/api/locations",
    params(LocationFilter),
    responses(
        (status = 200, description = "Location list", body = [location::Model]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(filter): Query<LocationFilter>,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .locations
        .list(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location found", body = location::Model),
        (status = 404, description = "Location not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .locations
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Create a location; `site_id` must reference an existing site
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = LocationInput,
    responses(
        (status = 201, description = "Location created", body = location::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .locations
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("Location created: {}", created.id);
    Ok(created_response(created))
}

/// Update a location
#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    request_body = LocationInput,
    responses(
        (status = 200, description = "Location updated", body = location::Model),
        (status = 404, description = "Location not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<LocationInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .locations
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Delete a location
#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .locations
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Location deleted: {}", id);
    Ok(no_content_response())
}

pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/:id",
            get(get_location).put(update_location).delete(delete_location),
        )
}
