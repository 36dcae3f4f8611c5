use crate::{
    db::DbPool,
    entities::{category, equipment_group},
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
pub struct EquipmentGroupInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Microscopes")]
    pub name: Option<String>,
    #[validate(required)]
    pub category_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EquipmentGroupFilter {
    pub category_id: Option<i32>,
}

/// Service for managing equipment groups
#[derive(Clone)]
pub struct EquipmentGroupService {
    db_pool: Arc<DbPool>,
}

impl EquipmentGroupService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: EquipmentGroupFilter,
    ) -> Result<Vec<equipment_group::Model>, ServiceError> {
        let mut query =
            equipment_group::Entity::find().order_by_asc(equipment_group::Column::Name);
        if let Some(category_id) = filter.category_id {
            query = query.filter(equipment_group::Column::CategoryId.eq(category_id));
        }
        query
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<equipment_group::Model, ServiceError> {
        find_or_not_found::<equipment_group::Entity, _>(&*self.db_pool, id, "Equipment group")
            .await
    }

    async fn validate(&self, input: &EquipmentGroupInput) -> Result<(), ServiceError> {
        let mut report = match input.validate() {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        if let Some(category_id) = input.category_id {
            check_references::<category::Entity, _>(
                &*self.db_pool,
                category::Column::Id,
                "category_id",
                &[category_id],
                &mut report,
            )
            .await?;
        }
        report.into_result()
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: EquipmentGroupInput,
    ) -> Result<equipment_group::Model, ServiceError> {
        self.validate(&input).await?;

        let created = equipment_group::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            category_id: Set(present(input.category_id)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(equipment_group_id = created.id, "Equipment group created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: EquipmentGroupInput,
    ) -> Result<equipment_group::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing =
            find_or_not_found::<equipment_group::Entity, _>(db, id, "Equipment group").await?;
        self.validate(&input).await?;

        let mut active = existing.into_active_model();
        active.name = Set(present(input.name).trim().to_string());
        active.category_id = Set(present(input.category_id));

        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = equipment_group::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Equipment group {} not found",
                id
            )));
        }
        info!(equipment_group_id = id, "Equipment group deleted");
        Ok(())
    }
}
