use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quizzes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub question: String,
    /// Answer options as a JSON array of strings
    pub options: Json,
    pub answer_index: i32,
    pub explanation: Option<String>,
    /// Set when the quiz is owned by a quiz group
    pub quiz_group_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quiz_group::Entity",
        from = "Column::QuizGroupId",
        to = "super::quiz_group::Column::Id"
    )]
    QuizGroup,
}

impl Related<super::quiz_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuizGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
