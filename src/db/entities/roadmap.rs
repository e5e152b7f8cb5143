use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roadmaps")]
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
    #[sea_orm(has_many = "super::roadmap_mapper::Entity")]
    RoadmapMappers,
    #[sea_orm(has_many = "super::roadmap_enrollment::Entity")]
    RoadmapEnrollments,
}

impl Related<super::roadmap_mapper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoadmapMappers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
