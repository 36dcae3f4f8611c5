use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    entities::category,
    errors::{ApiError, ErrorResponse},
    services::categories::CategoryInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::info;

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Category list", body = [category::Model]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .categories
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = category::Model),
        (status = 404, description = "Category not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let item = state
        .services
        .categories
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = category::Model),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .categories
        .create(payload)
        .await
        .map_err(map_service_error)?;
    info!("Category created: {}", created.id);
    Ok(created_response(created))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = category::Model),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .categories
        .update(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(updated))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state
        .services
        .categories
        .delete(id)
        .await
        .map_err(map_service_error)?;
    info!("Category deleted: {}", id);
    Ok(no_content_response())
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}
