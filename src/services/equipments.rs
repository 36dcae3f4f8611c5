use crate::{
    db::DbPool,
    entities::{equipment, equipment_group},
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
pub struct EquipmentInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Microscope A")]
    pub name: Option<String>,
    #[validate(required)]
    pub equipment_group_id: Option<i32>,
    /// Defaults to true
    pub operational: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EquipmentFilter {
    pub equipment_group_id: Option<i32>,
    /// Only equipment that can currently be reserved
    pub operational: Option<bool>,
}

/// Service for managing equipment
#[derive(Clone)]
pub struct EquipmentService {
    db_pool: Arc<DbPool>,
}

impl EquipmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: EquipmentFilter) -> Result<Vec<equipment::Model>, ServiceError> {
        let mut query = equipment::Entity::find().order_by_asc(equipment::Column::Name);
        if let Some(group_id) = filter.equipment_group_id {
            query = query.filter(equipment::Column::EquipmentGroupId.eq(group_id));
        }
        if let Some(operational) = filter.operational {
            query = query.filter(equipment::Column::Operational.eq(operational));
        }
        query
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<equipment::Model, ServiceError> {
        find_or_not_found::<equipment::Entity, _>(&*self.db_pool, id, "Equipment").await
    }

    async fn validate(&self, input: &EquipmentInput) -> Result<(), ServiceError> {
        let mut report = match input.validate() {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        if let Some(group_id) = input.equipment_group_id {
            check_references::<equipment_group::Entity, _>(
                &*self.db_pool,
                equipment_group::Column::Id,
                "equipment_group_id",
                &[group_id],
                &mut report,
            )
            .await?;
        }
        report.into_result()
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: EquipmentInput) -> Result<equipment::Model, ServiceError> {
        self.validate(&input).await?;

        let created = equipment::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            equipment_group_id: Set(present(input.equipment_group_id)),
            operational: Set(input.operational.unwrap_or(true)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(equipment_id = created.id, "Equipment created");
        Ok(created)
    }

    /// Replaces name and group; `operational` is only changed when supplied
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: EquipmentInput,
    ) -> Result<equipment::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = find_or_not_found::<equipment::Entity, _>(db, id, "Equipment").await?;
        self.validate(&input).await?;

        let mut active = existing.into_active_model();
        active.name = Set(present(input.name).trim().to_string());
        active.equipment_group_id = Set(present(input.equipment_group_id));
        if let Some(operational) = input.operational {
            active.operational = Set(operational);
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = equipment::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Equipment {} not found", id)));
        }
        info!(equipment_id = id, "Equipment deleted");
        Ok(())
    }
}
