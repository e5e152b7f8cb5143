//! Per-type material CRUD and lesson linking
//!
//! Deleting a material removes its mapper rows and the material itself in
//! one transaction; the migration's cascades back this up at the schema
//! level, so a mapper can never outlive its target.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entities::{
    article, lesson, material_mapper, quiz, quiz_group, resource, video, MaterialKind, MaterialRef,
};
use crate::services::catalog::{QuizInput, ResourceInput, VideoInput};
use crate::types::{LyceumError, Result};

// ---------------------------------------------------------------------------
// Quiz

pub async fn create_quiz(db: &DatabaseConnection, input: QuizInput) -> Result<quiz::Model> {
    input.validate()?;
    let now = Utc::now();
    Ok(quiz::ActiveModel {
        id: Set(Uuid::new_v4()),
        question: Set(input.question),
        options: Set(serde_json::json!(input.options)),
        answer_index: Set(input.answer_index),
        explanation: Set(input.explanation),
        quiz_group_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn get_quiz(db: &DatabaseConnection, id: Uuid) -> Result<quiz::Model> {
    quiz::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Quiz {} not found", id)))
}

pub async fn list_quizzes(db: &DatabaseConnection) -> Result<Vec<quiz::Model>> {
    Ok(quiz::Entity::find()
        .order_by_asc(quiz::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuizInput {
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub answer_index: Option<i32>,
    pub explanation: Option<String>,
}

pub async fn update_quiz(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateQuizInput,
) -> Result<quiz::Model> {
    let existing = get_quiz(db, id).await?;

    // Validate the merged options/answer pair before touching the row
    let options = input.options.clone().unwrap_or_else(|| {
        existing
            .options
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    });
    let answer_index = input.answer_index.unwrap_or(existing.answer_index);
    if options.len() < 2 || answer_index < 0 || answer_index as usize >= options.len() {
        return Err(LyceumError::Validation(
            "Quiz answer index is out of range".into(),
        ));
    }

    let mut active: quiz::ActiveModel = existing.into();
    if let Some(question) = input.question {
        active.question = Set(question);
    }
    if input.options.is_some() {
        active.options = Set(serde_json::json!(options));
    }
    active.answer_index = Set(answer_index);
    if let Some(explanation) = input.explanation {
        active.explanation = Set(Some(explanation));
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Delete a quiz and its mapper rows in one transaction
pub async fn delete_quiz(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;

    material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::QuizId.eq(id))
        .exec(&txn)
        .await?;

    let result = quiz::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Quiz {} not found", id)));
    }

    txn.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Quiz group

#[derive(Debug, Clone, Deserialize)]
pub struct QuizGroupInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub quizzes: Vec<QuizInput>,
}

/// Create a quiz group with its owned quizzes
pub async fn create_quiz_group(
    db: &DatabaseConnection,
    input: QuizGroupInput,
) -> Result<quiz_group::Model> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Quiz group title is required".into()));
    }
    for q in &input.quizzes {
        q.validate()?;
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let group_id = Uuid::new_v4();

    let group = quiz_group::ActiveModel {
        id: Set(group_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for q in input.quizzes {
        quiz::ActiveModel {
            id: Set(Uuid::new_v4()),
            question: Set(q.question),
            options: Set(serde_json::json!(q.options)),
            answer_index: Set(q.answer_index),
            explanation: Set(q.explanation),
            quiz_group_id: Set(Some(group_id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(group)
}

pub async fn list_quiz_groups(db: &DatabaseConnection) -> Result<Vec<quiz_group::Model>> {
    Ok(quiz_group::Entity::find()
        .order_by_asc(quiz_group::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuizGroupInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub async fn update_quiz_group(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateQuizGroupInput,
) -> Result<quiz_group::Model> {
    let existing = quiz_group::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Quiz group {} not found", id)))?;

    let mut active: quiz_group::ActiveModel = existing.into();
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(LyceumError::Validation("Quiz group title is required".into()));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = input.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Delete a quiz group, its owned quizzes and all mapper rows
pub async fn delete_quiz_group(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;

    material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::QuizGroupId.eq(id))
        .exec(&txn)
        .await?;

    // Owned quizzes may be individually linked somewhere as well
    let owned: Vec<Uuid> = quiz::Entity::find()
        .filter(quiz::Column::QuizGroupId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    if !owned.is_empty() {
        material_mapper::Entity::delete_many()
            .filter(material_mapper::Column::QuizId.is_in(owned))
            .exec(&txn)
            .await?;
    }

    quiz::Entity::delete_many()
        .filter(quiz::Column::QuizGroupId.eq(id))
        .exec(&txn)
        .await?;

    let result = quiz_group::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Quiz group {} not found", id)));
    }

    txn.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Video

pub async fn create_video(db: &DatabaseConnection, input: VideoInput) -> Result<video::Model> {
    if input.title.trim().is_empty() || input.url.trim().is_empty() {
        return Err(LyceumError::Validation("Video title and url are required".into()));
    }
    let now = Utc::now();
    Ok(video::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title),
        url: Set(input.url),
        duration_minutes: Set(input.duration_minutes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn list_videos(db: &DatabaseConnection) -> Result<Vec<video::Model>> {
    Ok(video::Entity::find()
        .order_by_asc(video::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVideoInput {
    pub title: Option<String>,
    pub url: Option<String>,
    pub duration_minutes: Option<i32>,
}

pub async fn update_video(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateVideoInput,
) -> Result<video::Model> {
    let existing = video::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Video {} not found", id)))?;

    let mut active: video::ActiveModel = existing.into();
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(url) = input.url {
        active.url = Set(url);
    }
    if let Some(minutes) = input.duration_minutes {
        active.duration_minutes = Set(minutes);
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn delete_video(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;

    material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::VideoId.eq(id))
        .exec(&txn)
        .await?;

    let result = video::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Video {} not found", id)));
    }

    txn.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Resource (link)

pub async fn create_resource(
    db: &DatabaseConnection,
    input: ResourceInput,
) -> Result<resource::Model> {
    if input.title.trim().is_empty() || input.url.trim().is_empty() {
        return Err(LyceumError::Validation(
            "Resource title and url are required".into(),
        ));
    }
    let now = Utc::now();
    Ok(resource::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title),
        url: Set(input.url),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn list_resources(db: &DatabaseConnection) -> Result<Vec<resource::Model>> {
    Ok(resource::Entity::find()
        .order_by_asc(resource::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResourceInput {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

pub async fn update_resource(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateResourceInput,
) -> Result<resource::Model> {
    let existing = resource::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Resource {} not found", id)))?;

    let mut active: resource::ActiveModel = existing.into();
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(url) = input.url {
        active.url = Set(url);
    }
    if let Some(description) = input.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn delete_resource(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;

    material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::ResourceId.eq(id))
        .exec(&txn)
        .await?;

    let result = resource::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Resource {} not found", id)));
    }

    txn.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Article

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub reading_minutes: i32,
}

pub async fn create_article(db: &DatabaseConnection, input: ArticleInput) -> Result<article::Model> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Article title is required".into()));
    }
    let now = Utc::now();
    Ok(article::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title),
        body: Set(input.body),
        reading_minutes: Set(input.reading_minutes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn list_articles(db: &DatabaseConnection) -> Result<Vec<article::Model>> {
    Ok(article::Entity::find()
        .order_by_asc(article::Column::CreatedAt)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub reading_minutes: Option<i32>,
}

pub async fn update_article(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateArticleInput,
) -> Result<article::Model> {
    let existing = article::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Article {} not found", id)))?;

    let mut active: article::ActiveModel = existing.into();
    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(body) = input.body {
        active.body = Set(body);
    }
    if let Some(minutes) = input.reading_minutes {
        active.reading_minutes = Set(minutes);
    }
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn delete_article(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    let txn = db.begin().await?;

    material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::ArticleId.eq(id))
        .exec(&txn)
        .await?;

    let result = article::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Article {} not found", id)));
    }

    txn.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lesson linking

#[derive(Debug, Clone, Deserialize)]
pub struct LinkMaterialInput {
    pub lesson_id: Uuid,
    pub material_id: Uuid,
    pub material_type: MaterialKind,
    #[serde(default)]
    pub duration_minutes: i32,
}

/// Link an existing material to a lesson at the next free position
pub async fn link_material(
    db: &DatabaseConnection,
    input: LinkMaterialInput,
) -> Result<material_mapper::Model> {
    let material = MaterialRef::from_kind(input.material_type, input.material_id);

    let txn = db.begin().await?;

    lesson::Entity::find_by_id(input.lesson_id)
        .one(&txn)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Lesson {} not found", input.lesson_id)))?;
    ensure_material_exists(&txn, material).await?;

    let next_position = material_mapper::Entity::find()
        .filter(material_mapper::Column::LessonId.eq(input.lesson_id))
        .order_by_desc(material_mapper::Column::Position)
        .one(&txn)
        .await?
        .map(|m| m.position + 1)
        .unwrap_or(1);

    let mut row = material_mapper::ActiveModel {
        id: Set(Uuid::new_v4()),
        lesson_id: Set(input.lesson_id),
        video_id: Set(None),
        quiz_id: Set(None),
        quiz_group_id: Set(None),
        resource_id: Set(None),
        article_id: Set(None),
        position: Set(next_position),
        duration_minutes: Set(input.duration_minutes),
        created_at: Set(Utc::now()),
    };
    row.set_material_ref(material);

    let mapper = row.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            LyceumError::Conflict("Material is already linked to this lesson".into())
        }
        _ => e.into(),
    })?;

    txn.commit().await?;
    Ok(mapper)
}

/// Remove a material link from a lesson
pub async fn unlink_material(db: &DatabaseConnection, input: LinkMaterialInput) -> Result<()> {
    let column = match input.material_type {
        MaterialKind::Video => material_mapper::Column::VideoId,
        MaterialKind::Quiz => material_mapper::Column::QuizId,
        MaterialKind::QuizGroup => material_mapper::Column::QuizGroupId,
        MaterialKind::Link => material_mapper::Column::ResourceId,
        MaterialKind::Article => material_mapper::Column::ArticleId,
    };

    let result = material_mapper::Entity::delete_many()
        .filter(material_mapper::Column::LessonId.eq(input.lesson_id))
        .filter(column.eq(input.material_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound("Material link not found".into()));
    }
    Ok(())
}

async fn ensure_material_exists<C: ConnectionTrait>(db: &C, material: MaterialRef) -> Result<()> {
    let found = match material {
        MaterialRef::Video(id) => video::Entity::find_by_id(id).one(db).await?.is_some(),
        MaterialRef::Quiz(id) => quiz::Entity::find_by_id(id).one(db).await?.is_some(),
        MaterialRef::QuizGroup(id) => quiz_group::Entity::find_by_id(id).one(db).await?.is_some(),
        MaterialRef::Link(id) => resource::Entity::find_by_id(id).one(db).await?.is_some(),
        MaterialRef::Article(id) => article::Entity::find_by_id(id).one(db).await?.is_some(),
    };
    if !found {
        return Err(LyceumError::NotFound(format!(
            "{} {} not found",
            material.kind().as_str(),
            material.target_id()
        )));
    }
    Ok(())
}
