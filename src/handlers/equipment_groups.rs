use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    entities::equipment_group,
    errors::{ApiError, ErrorResponse},
    services::equipment_groups::{EquipmentGroupFilter, EquipmentGroupInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List equipment groups
#[utoipa::path(
    get,
    path = "/api/equipment-groups",
    params(EquipmentGroupFilter),
    responses(
        (status = 200, description = "Equipment group list", body = [equipment_group::Model]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "equipment-groups"
)]
pub async fn list_equipment_groups(
    State(state): State<AppState>,
    Query(filter): Query<EquipmentGroupFilter>,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .equipment_groups
        .list(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

/// Get an equipment group by ID
#[utoipa::path(
    get,
    path = "/api/equipment-groups/{id}",
    params(("id" = i32, Path, description = "Equipment group ID")),
    responses(
        (status = 200, description = "Equipment group found", body = equipment_group::Model),
        (status = 404, description = "Equipment group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipment-groups"
)]
pub async fn get_equipment_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .equipment_groups
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Create an equipment group under a category
#[utoipa::path(
    post,
    path = "/api/equipment-groups",
    request_body = EquipmentGroupInput,
    responses(
        (status = 201, description = "Equipment group created", body = equipment_group::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipment-groups"
)]
pub async fn create_equipment_group(
    State(state): State<AppState>,
    Json(payload): Json<EquipmentGroupInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .equipment_groups
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("Equipment group created: {}", created.id);
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/equipment-groups/{id}",
    params(("id" = i32, Path, description = "Equipment group ID")),
    request_body = EquipmentGroupInput,
    responses(
        (status = 200, description = "Equipment group updated", body = equipment_group::Model),
        (status = 404, description = "Equipment group not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipment-groups"
)]
pub async fn update_equipment_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EquipmentGroupInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .equipment_groups
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/equipment-groups/{id}",
    params(("id" = i32, Path, description = "Equipment group ID")),
    responses(
        (status = 204, description = "Equipment group deleted"),
        (status = 404, description = "Equipment group not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipment-groups"
)]
pub async fn delete_equipment_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .equipment_groups
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Equipment group deleted: {}", id);
    Ok(no_content_response())
}

pub fn equipment_group_routes() -> Router<AppState> {
    Router::new()
        .route("/equipment-groups", get(list_equipment_groups).post(create_equipment_group))
        .route(
            "/equipment-groups/:id",
            get(get_equipment_group).put(update_equipment_group).delete(delete_equipment_group),
        )
}
