use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered career path -> roadmap link
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "career_path_mappers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub career_path_id: Uuid,
    pub roadmap_id: Uuid,
    pub position: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::career_path::Entity",
        from = "Column::CareerPathId",
        to = "super::career_path::Column::Id"
    )]
    CareerPath,
    #[sea_orm(
        belongs_to = "super::roadmap::Entity",
        from = "Column::RoadmapId",
        to = "super::roadmap::Column::Id"
    )]
    Roadmap,
}

impl Related<super::career_path::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CareerPath.def()
    }
}

impl Related<super::roadmap::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roadmap.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
