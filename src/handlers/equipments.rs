use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    entities::equipment,
    errors::{ApiError, ErrorResponse},
    services::equipments::{EquipmentFilter, EquipmentInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List equipments
#[utoipa::path(
    get,
    path = "/api/equipments",
    params(EquipmentFilter),
    responses(
        (status = 200, description = "Equipment list", body = [equipment::Model]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "equipments"
)]
pub async fn list_equipments(
    State(state): State<AppState>,
    Query(filter): Query<EquipmentFilter>,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .equipments
        .list(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/equipments/{id}",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment found", body = equipment::Model),
        (status = 404, description = "Equipment not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipments"
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .equipments
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Register an equipment; new equipment is operational unless stated otherwise
#[utoipa::path(
    post,
    path = "/api/equipments",
    request_body = EquipmentInput,
    responses(
        (status = 201, description = "Equipment created", body = equipment::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipments"
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    Json(payload): Json<EquipmentInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .equipments
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("Equipment created: {}", created.id);
    Ok(created_response(created))
}

/// Update an equipment. `operational` is left unchanged when omitted
#[utoipa::path(
    put,
    path = "/api/equipments/{id}",
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = EquipmentInput,
    responses(
        (status = 200, description = "Equipment updated", body = equipment::Model),
        (status = 404, description = "Equipment not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipments"
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EquipmentInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .equipments
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Delete an equipment and its reservation links
#[utoipa::path(
    delete,
    path = "/api/equipments/{id}",
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 204, description = "Equipment deleted"),
        (status = 404, description = "Equipment not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "equipments"
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .equipments
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Equipment deleted: {}", id);
    Ok(no_content_response())
}

pub fn equipment_routes() -> Router<AppState> {
    Router::new()
        .route("/equipments", get(list_equipments).post(create_equipment))
        .route(
            "/equipments/:id",
            get(get_equipment).put(update_equipment).delete(delete_equipment),
        )
}
