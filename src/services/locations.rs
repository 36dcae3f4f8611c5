use crate::{
    db::DbPool,
    entities::{location, site},
    errors::{ServiceError, ValidationReport},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{check_references, find_or_not_found, present};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LocationInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Room 204")]
    pub name: Option<String>,
    #[validate(required)]
    pub site_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LocationFilter {
    /// Only locations of this site
    pub site_id: Option<i32>,
}

/// Service for managing locations
#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DbPool>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: LocationFilter) -> Result<Vec<location::Model>, ServiceError> {
        let mut query = location::Entity::find().order_by_asc(location::Column::Name);
        if let Some(site_id) = filter.site_id {
            query = query.filter(location::Column::SiteId.eq(site_id));
        }
        query
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<location::Model, ServiceError> {
        find_or_not_found::<location::Entity, _>(&*self.db_pool, id, "Location").await
    }

    async fn validate(&self, input: &LocationInput) -> Result<(), ServiceError> {
        let mut report = match input.validate() {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        if let Some(site_id) = input.site_id {
            check_references::<site::Entity, _>(
                &*self.db_pool,
                site::Column::Id,
                "site_id",
                &[site_id],
                &mut report,
            )
            .await?;
        }
        report.into_result()
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: LocationInput) -> Result<location::Model, ServiceError> {
        self.validate(&input).await?;

        let created = location::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            site_id: Set(present(input.site_id)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(location_id = created.id, site_id = created.site_id, "Location created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: LocationInput,
    ) -> Result<location::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = find_or_not_found::<location::Entity, _>(db, id, "Location").await?;
        self.validate(&input).await?;

        let mut active = existing.into_active_model();
        active.name = Set(present(input.name).trim().to_string());
        active.site_id = Set(present(input.site_id));

        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = location::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Location {} not found", id)));
        }
        info!(location_id = id, "Location deleted");
        Ok(())
    }
}
