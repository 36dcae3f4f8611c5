use crate::{
    db::DbPool,
    entities::category,
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{find_or_not_found, present};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Optics")]
    pub name: Option<String>,
}

/// Service for managing equipment categories
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<category::Model, ServiceError> {
        find_or_not_found::<category::Entity, _>(&*self.db_pool, id, "Category").await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CategoryInput) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let created = category::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(category_id = created.id, "Category created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        let mut active = find_or_not_found::<category::Entity, _>(db, id, "Category")
            .await?
            .into_active_model();
        active.name = Set(present(input.name).trim().to_string());

        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = category::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Category {} not found", id)));
        }
        info!(category_id = id, "Category deleted");
        Ok(())
    }
}
