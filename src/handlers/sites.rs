use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    entities::site,
    errors::{ApiError, ErrorResponse},
    services::sites::SiteInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List sites
#[utoipa::path(
    get,
    path = "/api/sites",
    responses(
        (status = 200, description = "Site list", body = [site::Model]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "sites"
)]
pub async fn list_sites(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .sites
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/sites/{id}",
    params(("id" = i32, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site found", body = site::Model),
        (status = 404, description = "Site not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "sites"
)]
pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .sites
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Create a site
#[utoipa::path(
    post,
    path = "/api/sites",
    request_body = SiteInput,
    responses(
        (status = 201, description = "Site created", body = site::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "sites"
)]
pub async fn create_site(
    State(state): State<AppState>,
    Json(payload): Json<SiteInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .sites
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("Site created: {}", created.id);
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/sites/{id}",
    params(("id" = i32, Path, description = "Site ID")),
    request_body = SiteInput,
    responses(
        (status = 200, description = "Site updated", body = site::Model),
        (status = 404, description = "Site not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "sites"
)]
pub async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SiteInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .sites
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Delete a site
#[utoipa::path(
    delete,
    path = "/api/sites/{id}",
    params(("id" = i32, Path, description = "Site ID")),
    responses(
        (status = 204, description = "Site deleted"),
        (status = 404, description = "Site not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "sites"
)]
pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .sites
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Site deleted: {}", id);
    Ok(no_content_response())
}

pub fn site_routes() -> Router<AppState> {
    Router::new()
        .route("/sites", get(list_sites).post(create_site))
        .route(
            "/sites/:id",
            get(get_site).put(update_site).delete(delete_site),
        )
}
