use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "equipment_manip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub manip_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub equipment_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manip::Entity",
        from = "Column::ManipId",
        to = "super::manip::Column::Id",
        on_delete = "Cascade"
    )]
    Manip,
    #[sea_orm(
        belongs_to = "super::equipment::Entity",
        from = "Column::EquipmentId",
        to = "super::equipment::Column::Id",
        on_delete = "Cascade"
    )]
    Equipment,
}

impl Related<super::manip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manip.def()
    }
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Equipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
