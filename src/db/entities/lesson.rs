use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Position within the owning module
    pub position: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lesson_mapper::Entity")]
    LessonMappers,
    #[sea_orm(has_many = "super::material_mapper::Entity")]
    MaterialMappers,
    #[sea_orm(has_many = "super::course_progress::Entity")]
    CourseProgress,
}

impl Related<super::lesson_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonMappers.def()
    }
}

impl Related<super::material_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialMappers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
