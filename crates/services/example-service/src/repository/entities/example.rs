//! Example database entity for SeaORM.

use datatype::{CustomTime, NullDate};
use sea_orm::entity::prelude::*;

use crate::model::Example;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "examples")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: String,
    pub active: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub birthday: NullDate,
    #[sea_orm(column_type = "Text")]
    pub created_at: CustomTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to API model
impl From<Model> for Example {
    fn from(model: Model) -> Self {
        Example {
            id: model.id,
            name: model.name,
            age: model.age,
            email: model.email,
            active: model.active,
            birthday: model.birthday,
            created_at: model.created_at,
        }
    }
}
