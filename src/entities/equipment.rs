use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A bookable piece of equipment. Non operational items cannot be reserved.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "equipments")]
#[schema(as = Equipment)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub operational: bool,
    pub equipment_group_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::equipment_group::Entity",
        from = "Column::EquipmentGroupId",
        to = "super::equipment_group::Column::Id",
        on_delete = "Cascade"
    )]
    EquipmentGroup,
    #[sea_orm(has_many = "super::equipment_manip::Entity")]
    EquipmentManip,
    #[sea_orm(has_many = "super::equipment_preference::Entity")]
    EquipmentPreference,
}

impl Related<super::equipment_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EquipmentGroup.def()
    }
}

impl Related<super::manip::Entity> for Entity {
    fn to() -> RelationDef {
        super::equipment_manip::Relation::Manip.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::equipment_manip::Relation::Equipment.def().rev())
    }
}

impl Related<super::preference::Entity> for Entity {
    fn to() -> RelationDef {
        super::equipment_preference::Relation::Preference.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::equipment_preference::Relation::Equipment.def().rev())
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
