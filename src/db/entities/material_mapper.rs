//! Ordered lesson -> material link
//!
//! A mapper row points at exactly one material through a per-type nullable
//! foreign key column. The `MaterialRef` sum type is the in-code view of
//! that constraint; rows are only ever written through it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Material discriminator, also used in API payloads
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Video,
    Quiz,
    QuizGroup,
    Link,
    Article,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Quiz => "quiz",
            Self::QuizGroup => "quiz_group",
            Self::Link => "link",
            Self::Article => "article",
        }
    }
}

/// A reference to one concrete material row
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MaterialRef {
    Video(Uuid),
    Quiz(Uuid),
    QuizGroup(Uuid),
    Link(Uuid),
    Article(Uuid),
}

impl MaterialRef {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Self::Video(_) => MaterialKind::Video,
            Self::Quiz(_) => MaterialKind::Quiz,
            Self::QuizGroup(_) => MaterialKind::QuizGroup,
            Self::Link(_) => MaterialKind::Link,
            Self::Article(_) => MaterialKind::Article,
        }
    }

    pub fn target_id(&self) -> Uuid {
        match self {
            Self::Video(id)
            | Self::Quiz(id)
            | Self::QuizGroup(id)
            | Self::Link(id)
            | Self::Article(id) => *id,
        }
    }

    pub fn from_kind(kind: MaterialKind, id: Uuid) -> Self {
        match kind {
            MaterialKind::Video => Self::Video(id),
            MaterialKind::Quiz => Self::Quiz(id),
            MaterialKind::QuizGroup => Self::QuizGroup(id),
            MaterialKind::Link => Self::Link(id),
            MaterialKind::Article => Self::Article(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_mappers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub video_id: Option<Uuid>,
    pub quiz_id: Option<Uuid>,
    pub quiz_group_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub article_id: Option<Uuid>,
    pub position: i32,
    /// Estimated time to complete, in minutes
    pub duration_minutes: i32,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Reconstruct the material reference; None for a row that violates the
    /// exactly-one-set invariant (should not happen past the migration's
    /// foreign keys, but the readers stay defensive).
    pub fn material_ref(&self) -> Option<MaterialRef> {
        let refs = [
            self.video_id.map(MaterialRef::Video),
            self.quiz_id.map(MaterialRef::Quiz),
            self.quiz_group_id.map(MaterialRef::QuizGroup),
            self.resource_id.map(MaterialRef::Link),
            self.article_id.map(MaterialRef::Article),
        ];
        let mut found = None;
        for r in refs.into_iter().flatten() {
            if found.is_some() {
                return None;
            }
            found = Some(r);
        }
        found
    }
}

impl ActiveModel {
    /// Set the one FK column matching the reference, clearing the others
    pub fn set_material_ref(&mut self, material: MaterialRef) {
        use sea_orm::Set;
        self.video_id = Set(None);
        self.quiz_id = Set(None);
        self.quiz_group_id = Set(None);
        self.resource_id = Set(None);
        self.article_id = Set(None);
        match material {
            MaterialRef::Video(id) => self.video_id = Set(Some(id)),
            MaterialRef::Quiz(id) => self.quiz_id = Set(Some(id)),
            MaterialRef::QuizGroup(id) => self.quiz_group_id = Set(Some(id)),
            MaterialRef::Link(id) => self.resource_id = Set(Some(id)),
            MaterialRef::Article(id) => self.article_id = Set(Some(id)),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id"
    )]
    Lesson,
    #[sea_orm(
        belongs_to = "super::video::Entity",
        from = "Column::VideoId",
        to = "super::video::Column::Id"
    )]
    Video,
    #[sea_orm(
        belongs_to = "super::quiz::Entity",
        from = "Column::QuizId",
        to = "super::quiz::Column::Id"
    )]
    Quiz,
    #[sea_orm(
        belongs_to = "super::quiz_group::Entity",
        from = "Column::QuizGroupId",
        to = "super::quiz_group::Column::Id"
    )]
    QuizGroup,
    #[sea_orm(
        belongs_to = "super::resource::Entity",
        from = "Column::ResourceId",
        to = "super::resource::Column::Id"
    )]
    Resource,
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id"
    )]
    Article,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn blank_row() -> Model {
        Model {
            id: Uuid::new_v4(),
            lesson_id: Uuid::new_v4(),
            video_id: None,
            quiz_id: None,
            quiz_group_id: None,
            resource_id: None,
            article_id: None,
            position: 1,
            duration_minutes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_material_ref_round_trip() {
        let id = Uuid::new_v4();
        for kind in [
            MaterialKind::Video,
            MaterialKind::Quiz,
            MaterialKind::QuizGroup,
            MaterialKind::Link,
            MaterialKind::Article,
        ] {
            let m = MaterialRef::from_kind(kind, id);
            assert_eq!(m.kind(), kind);
            assert_eq!(m.target_id(), id);
        }
    }

    #[test]
    fn test_exactly_one_column_set() {
        let mut row = blank_row();
        row.quiz_id = Some(Uuid::new_v4());
        assert_eq!(row.material_ref().map(|m| m.kind()), Some(MaterialKind::Quiz));

        // Two columns set is invalid and surfaces as None
        row.video_id = Some(Uuid::new_v4());
        assert!(row.material_ref().is_none());

        // No column set is also invalid
        let row = blank_row();
        assert!(row.material_ref().is_none());
    }
}
