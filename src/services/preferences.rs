use crate::{
    db::DbPool,
    entities::{equipment, equipment_preference, preference, user},
    errors::{ServiceError, ValidationReport},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, LoaderTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{check_references, find_or_not_found, present, unique_ids};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PreferenceInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Morning imaging")]
    pub name: Option<String>,
    /// Owner; defaults to the authenticated user
    pub user_id: Option<i32>,
    #[validate(
        required,
        length(min = 1, message = "The equipments must contain at least 1 item(s).")
    )]
    #[schema(example = json!([5, 7]))]
    pub equipments: Option<Vec<i32>>,
}

/// A preference with its saved equipment selection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreferenceResponse {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub equipments: Vec<equipment::Model>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceResponse {
    fn from_parts(model: preference::Model, equipments: Vec<equipment::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
            equipments,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Service for managing saved equipment selections
#[derive(Clone)]
pub struct PreferenceService {
    db_pool: Arc<DbPool>,
}

impl PreferenceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PreferenceResponse>, ServiceError> {
        let models = preference::Entity::find()
            .order_by_asc(preference::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        self.with_equipments(models).await
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<PreferenceResponse>, ServiceError> {
        let models = preference::Entity::find()
            .filter(preference::Column::UserId.eq(user_id))
            .order_by_asc(preference::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        self.with_equipments(models).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<PreferenceResponse, ServiceError> {
        let model =
            find_or_not_found::<preference::Entity, _>(&*self.db_pool, id, "Preference").await?;
        self.with_equipments(vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Preference {} not found", id)))
    }

    async fn with_equipments(
        &self,
        models: Vec<preference::Model>,
    ) -> Result<Vec<PreferenceResponse>, ServiceError> {
        let equipments = models
            .load_many_to_many(
                equipment::Entity,
                equipment_preference::Entity,
                &*self.db_pool,
            )
            .await
            .map_err(ServiceError::db_error)?;
        Ok(models
            .into_iter()
            .zip(equipments)
            .map(|(model, equipments)| PreferenceResponse::from_parts(model, equipments))
            .collect())
    }

    async fn validate<C: ConnectionTrait>(
        conn: &C,
        input: &PreferenceInput,
        owner_id: i32,
    ) -> Result<(), ServiceError> {
        let mut report = match input.validate() {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        check_references::<user::Entity, _>(conn, user::Column::Id, "user_id", &[owner_id], &mut report)
            .await?;
        if let Some(ids) = &input.equipments {
            check_references::<equipment::Entity, _>(
                conn,
                equipment::Column::Id,
                "equipments",
                &unique_ids(ids),
                &mut report,
            )
            .await?;
        }
        report.into_result()
    }

    async fn replace_equipments(
        txn: &DatabaseTransaction,
        preference_id: i32,
        equipment_ids: &[i32],
    ) -> Result<(), ServiceError> {
        equipment_preference::Entity::delete_many()
            .filter(equipment_preference::Column::PreferenceId.eq(preference_id))
            .exec(txn)
            .await
            .map_err(ServiceError::db_error)?;
        if equipment_ids.is_empty() {
            return Ok(());
        }
        let rows = equipment_ids
            .iter()
            .map(|equipment_id| equipment_preference::ActiveModel {
                preference_id: Set(preference_id),
                equipment_id: Set(*equipment_id),
            });
        equipment_preference::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        caller_id: i32,
        input: PreferenceInput,
    ) -> Result<PreferenceResponse, ServiceError> {
        let owner_id = input.user_id.unwrap_or(caller_id);
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        Self::validate(&txn, &input, owner_id).await?;

        let created = preference::ActiveModel {
            name: Set(present(input.name).trim().to_string()),
            user_id: Set(owner_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;
        Self::replace_equipments(&txn, created.id, &unique_ids(&present(input.equipments)))
            .await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(preference_id = created.id, user_id = owner_id, "Preference created");
        self.get(created.id).await
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        caller_id: i32,
        input: PreferenceInput,
    ) -> Result<PreferenceResponse, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let existing = find_or_not_found::<preference::Entity, _>(&txn, id, "Preference").await?;
        let owner_id = input.user_id.unwrap_or(existing.user_id);
        Self::validate(&txn, &input, owner_id).await?;

        let mut active = existing.into_active_model();
        active.name = Set(present(input.name).trim().to_string());
        active.user_id = Set(owner_id);
        active.update(&txn).await.map_err(ServiceError::db_error)?;
        Self::replace_equipments(&txn, id, &unique_ids(&present(input.equipments))).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(preference_id = id, caller_id, "Preference updated");
        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = preference::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Preference {} not found", id)));
        }
        info!(preference_id = id, "Preference deleted");
        Ok(())
    }
}
