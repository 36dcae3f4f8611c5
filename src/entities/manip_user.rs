use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team membership of a user in a manip
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manip_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub manip_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
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
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::manip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manip.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
