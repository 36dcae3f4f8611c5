use crate::{
    auth::password::hash_password,
    db::DbPool,
    entities::user,
    errors::{ServiceError, ValidationReport, ViolationKind},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{find_or_not_found, present};

/// Six hex digits, no leading '#'
pub static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{6}$").expect("color regex compiles"));

pub const DEFAULT_COLOR: &str = "3f51b5";

#[derive(Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UserInput {
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Ada")]
    pub first_name: Option<String>,
    #[validate(required, custom = "super::not_blank", length(max = 255))]
    #[schema(example = "Lovelace")]
    pub last_name: Option<String>,
    #[validate(required, email, length(max = 255))]
    #[schema(example = "ada@example.org")]
    pub email: Option<String>,
    /// Required on create; on update, a new password replaces the old one
    #[validate(length(
        min = 8,
        max = 255,
        message = "The password must be between 8 and 255 characters."
    ))]
    #[schema(write_only)]
    pub password: Option<String>,
    #[validate(regex(path = "COLOR_RE", message = "The color must be six hexadecimal digits."))]
    #[schema(example = "3f51b5")]
    pub color: Option<String>,
}

impl std::fmt::Debug for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInput")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("color", &self.color)
            .finish()
    }
}

/// Service for managing users
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<user::Model>, ServiceError> {
        user::Entity::find()
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Every user except `caller_id`, for picking team members
    #[instrument(skip(self))]
    pub async fn other_users(&self, caller_id: i32) -> Result<Vec<user::Model>, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Id.ne(caller_id))
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<user::Model, ServiceError> {
        find_or_not_found::<user::Entity, _>(&*self.db_pool, id, "User").await
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    async fn validate<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: &UserInput,
        existing_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut report = match input.validate() {
            Ok(()) => ValidationReport::new(),
            Err(errors) => errors.into(),
        };
        if existing_id.is_none() && input.password.is_none() {
            report.required("password");
        }
        if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
            let mut query = user::Entity::find().filter(user::Column::Email.eq(normalize_email(email)));
            if let Some(id) = existing_id {
                query = query.filter(user::Column::Id.ne(id));
            }
            let taken = query.one(conn).await.map_err(ServiceError::db_error)?;
            if taken.is_some() {
                report.push(
                    "email",
                    ViolationKind::BusinessRuleViolation,
                    "The email has already been taken.",
                );
            }
        }
        report.into_result()
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: UserInput) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        self.validate(db, &input, None).await?;

        let password_hash = hash_password(&present(input.password))?;
        let created = user::ActiveModel {
            first_name: Set(present(input.first_name).trim().to_string()),
            last_name: Set(present(input.last_name).trim().to_string()),
            email: Set(normalize_email(&present(input.email))),
            password_hash: Set(password_hash),
            color: Set(input
                .color
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(user_id = created.id, "User created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: UserInput) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = find_or_not_found::<user::Entity, _>(db, id, "User").await?;
        self.validate(db, &input, Some(id)).await?;

        let mut active = existing.into_active_model();
        active.first_name = Set(present(input.first_name).trim().to_string());
        active.last_name = Set(present(input.last_name).trim().to_string());
        active.email = Set(normalize_email(&present(input.email)));
        if let Some(password) = input.password {
            active.password_hash = Set(hash_password(&password)?);
        }
        if let Some(color) = input.color {
            active.color = Set(color.to_ascii_lowercase());
        }

        active.update(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn change_color(&self, id: i32, color: &str) -> Result<user::Model, ServiceError> {
        if !COLOR_RE.is_match(color) {
            return Err(ServiceError::validation(
                "color",
                ViolationKind::FieldFormat,
                "The color must be six hexadecimal digits.",
            ));
        }
        let db = &*self.db_pool;
        let mut active = find_or_not_found::<user::Entity, _>(db, id, "User")
            .await?
            .into_active_model();
        active.color = Set(color.to_ascii_lowercase());

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(user_id = id, color = %updated.color, "User color changed");
        Ok(updated)
    }

    /// Removes the user with the manips they own, their memberships and preferences
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = user::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", id)));
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
