use crate::{
    db::DbPool,
    entities::site,
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
pub struct SiteInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "North campus")]
    pub name: Option<String>,
}

/// Service for managing sites
#[derive(Clone)]
pub struct SiteService {
    db_pool: Arc<DbPool>,
}

impl SiteService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<site::Model>, ServiceError> {
        site::Entity::find()
            .order_by_asc(site::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<site::Model, ServiceError> {
        find_or_not_found::<site::Entity, _>(&*self.db_pool, id, "Site").await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: SiteInput) -> Result<site::Model, ServiceError> {
        input.validate()?;

        let created = site::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(site_id = created.id, "Site created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: SiteInput) -> Result<site::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        let mut active = find_or_not_found::<site::Entity, _>(db, id, "Site")
            .await?
            .into_active_model();
        active.name = Set(present(input.name).trim().to_string());

        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Removes the site and, through cascading keys, its locations and their manips
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = site::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Site {} not found", id)));
        }
        info!(site_id = id, "Site deleted");
        Ok(())
    }
}
