use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A scheduled reservation of equipment at a location.
///
/// `begin_date` and `end_date` are wall-clock times; the operating-hours rule
/// applies to them as stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "manips")]
#[schema(as = Manip)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Owner
    pub user_id: i32,
    pub location_id: i32,
    pub begin_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id",
        on_delete = "Cascade"
    )]
    Location,
    #[sea_orm(has_many = "super::equipment_manip::Entity")]
    EquipmentManip,
    #[sea_orm(has_many = "super::manip_user::Entity")]
    ManipUser,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        super::equipment_manip::Relation::Equipment.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::equipment_manip::Relation::Manip.def().rev())
    }
}

/// Team members; the owner is reached through `Relation::Owner`
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::manip_user::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::manip_user::Relation::Manip.def().rev())
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
