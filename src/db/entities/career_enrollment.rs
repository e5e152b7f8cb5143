use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "career_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub career_path_id: Uuid,
    /// Completed roadmap count within the career path
    pub progress: i32,
    pub cancelled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::career_path::Entity",
        from = "Column::CareerPathId",
        to = "super::career_path::Column::Id"
    )]
    CareerPath,
}

impl Related<super::career_path::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CareerPath.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
