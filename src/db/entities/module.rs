use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "modules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_mapper::Entity")]
    CourseMappers,
    #[sea_orm(has_many = "super::lesson_mapper::Entity")]
    LessonMappers,
}

impl Related<super::course_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseMappers.def()
    }
}

impl Related<super::lesson_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonMappers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
