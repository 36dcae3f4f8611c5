use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
#[schema(as = User)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    /// Calendar color, six hex digits without the leading '#'
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::manip_user::Entity")]
    ManipUser,
    #[sea_orm(has_many = "super::preference::Entity")]
    Preference,
}

/// Team memberships; owned manips are found through `manip::Column::UserId`
impl Related<super::manip::Entity> for Entity {
    fn to() -> RelationDef {
        super::manip_user::Relation::Manip.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::manip_user::Relation::User.def().rev())
    }
}

impl Related<super::preference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Preference.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}
