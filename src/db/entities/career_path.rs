use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "career_paths")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::career_path_mapper::Entity")]
    CareerPathMappers,
    #[sea_orm(has_many = "super::career_enrollment::Entity")]
    CareerEnrollments,
}

impl Related<super::career_path_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CareerPathMappers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
