use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "medrecord", table_name = "patients")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    /// Unified civil number, the ten digit national identification number.
    pub ucn: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub height: i32,
    pub weight: i32,
    pub medication: String,
    pub note: String,
    pub approved: bool,
    pub first_continuation: bool,
    #[serde(skip_deserializing)]
    pub user_id: Id,
    #[serde(skip_deserializing)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::medications::Entity",
        from = "Column::Medication",
        to = "super::medications::Column::Name",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Medications,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::medications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medications.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
