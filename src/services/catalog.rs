//! Course catalog writers
//!
//! Course creation accepts the full nested payload (modules -> lessons ->
//! materials) and runs in a single transaction: any missing referenced id
//! aborts the whole call. Mapper positions are 1-based array indexes;
//! material positions share one counter across the video/resource/quiz
//! arrays so ordering reflects insertion sequence across types.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entities::{
    course, course_mapper, lesson, lesson_mapper, material_mapper, module, quiz, resource, video,
    MaterialRef,
};
use crate::types::{LyceumError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: course::Level,
    #[serde(default)]
    pub duration_hours: i32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub modules: Vec<ModuleInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleInput {
    /// Reuse an existing module instead of creating one
    #[serde(default)]
    pub is_existing: bool,
    pub id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonInput {
    #[serde(default)]
    pub is_existing: bool,
    pub id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub videos: Vec<VideoInput>,
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
    #[serde(default)]
    pub quizzes: Vec<QuizInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoInput {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInput {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizInput {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: i32,
    pub explanation: Option<String>,
}

impl QuizInput {
    pub fn validate(&self) -> Result<()> {
        if self.options.len() < 2 {
            return Err(LyceumError::Validation(
                "A quiz needs at least two options".into(),
            ));
        }
        if self.answer_index < 0 || self.answer_index as usize >= self.options.len() {
            return Err(LyceumError::Validation(
                "Quiz answer index is out of range".into(),
            ));
        }
        Ok(())
    }
}

/// Create a course with its nested modules, lessons and materials.
/// All-or-nothing: the whole tree is written in one transaction.
pub async fn create_course(db: &DatabaseConnection, input: CreateCourseInput) -> Result<Uuid> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Course title is required".into()));
    }
    for m in &input.modules {
        for l in &m.lessons {
            for q in &l.quizzes {
                q.validate()?;
            }
        }
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let course_id = Uuid::new_v4();

    course::ActiveModel {
        id: Set(course_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        level: Set(input.level),
        duration_hours: Set(input.duration_hours),
        is_published: Set(input.is_published),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for (module_index, module_input) in input.modules.into_iter().enumerate() {
        let module_id = resolve_module(&txn, &module_input).await?;

        course_mapper::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course_id),
            module_id: Set(module_id),
            position: Set(module_index as i32 + 1),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for (lesson_index, lesson_input) in module_input.lessons.into_iter().enumerate() {
            let lesson_id = resolve_lesson(&txn, &lesson_input, lesson_index as i32 + 1).await?;

            lesson_mapper::ActiveModel {
                id: Set(Uuid::new_v4()),
                module_id: Set(module_id),
                lesson_id: Set(lesson_id),
                position: Set(lesson_index as i32 + 1),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            // One counter across all material arrays: order reflects
            // insertion sequence, not per-type position
            let mut material_order = 1i32;

            for v in lesson_input.videos {
                let video_id = Uuid::new_v4();
                video::ActiveModel {
                    id: Set(video_id),
                    title: Set(v.title),
                    url: Set(v.url),
                    duration_minutes: Set(v.duration_minutes),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?;
                insert_mapper(
                    &txn,
                    lesson_id,
                    MaterialRef::Video(video_id),
                    material_order,
                    v.duration_minutes,
                )
                .await?;
                material_order += 1;
            }

            for r in lesson_input.resources {
                let resource_id = Uuid::new_v4();
                resource::ActiveModel {
                    id: Set(resource_id),
                    title: Set(r.title),
                    url: Set(r.url),
                    description: Set(r.description),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?;
                insert_mapper(&txn, lesson_id, MaterialRef::Link(resource_id), material_order, 0)
                    .await?;
                material_order += 1;
            }

            for q in lesson_input.quizzes {
                let quiz_id = Uuid::new_v4();
                quiz::ActiveModel {
                    id: Set(quiz_id),
                    question: Set(q.question),
                    options: Set(serde_json::json!(q.options)),
                    answer_index: Set(q.answer_index),
                    explanation: Set(q.explanation),
                    quiz_group_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?;
                insert_mapper(&txn, lesson_id, MaterialRef::Quiz(quiz_id), material_order, 0)
                    .await?;
                material_order += 1;
            }
        }
    }

    txn.commit().await?;
    Ok(course_id)
}

async fn resolve_module<C: ConnectionTrait>(db: &C, input: &ModuleInput) -> Result<Uuid> {
    if input.is_existing {
        let id = input
            .id
            .ok_or_else(|| LyceumError::Validation("Existing module requires an id".into()))?;
        module::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| LyceumError::NotFound(format!("Module {} not found", id)))?;
        Ok(id)
    } else {
        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LyceumError::Validation("New module requires a title".into()))?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        module::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        Ok(id)
    }
}

async fn resolve_lesson<C: ConnectionTrait>(
    db: &C,
    input: &LessonInput,
    position: i32,
) -> Result<Uuid> {
    if input.is_existing {
        let id = input
            .id
            .ok_or_else(|| LyceumError::Validation("Existing lesson requires an id".into()))?;
        lesson::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| LyceumError::NotFound(format!("Lesson {} not found", id)))?;
        Ok(id)
    } else {
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LyceumError::Validation("New lesson requires a name".into()))?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        lesson::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(input.description.clone()),
            position: Set(position),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        Ok(id)
    }
}

async fn insert_mapper<C: ConnectionTrait>(
    db: &C,
    lesson_id: Uuid,
    material: MaterialRef,
    position: i32,
    duration_minutes: i32,
) -> Result<()> {
    let mut row = material_mapper::ActiveModel {
        id: Set(Uuid::new_v4()),
        lesson_id: Set(lesson_id),
        video_id: Set(None),
        quiz_id: Set(None),
        quiz_group_id: Set(None),
        resource_id: Set(None),
        article_id: Set(None),
        position: Set(position),
        duration_minutes: Set(duration_minutes),
        created_at: Set(Utc::now()),
    };
    row.set_material_ref(material);
    row.insert(db).await?;
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<course::Level>,
    pub duration_hours: Option<i32>,
    pub is_published: Option<bool>,
}

pub async fn update_course(
    db: &DatabaseConnection,
    course_id: Uuid,
    input: UpdateCourseInput,
) -> Result<course::Model> {
    let existing = course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))?;

    let mut active: course::ActiveModel = existing.into();
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(LyceumError::Validation("Course title is required".into()));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = input.description {
        active.description = Set(description);
    }
    if let Some(level) = input.level {
        active.level = Set(level);
    }
    if let Some(hours) = input.duration_hours {
        active.duration_hours = Set(hours);
    }
    if let Some(published) = input.is_published {
        active.is_published = Set(published);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Delete a course. Mapper rows and enrollments go with it via the
/// cascade; shared modules and lessons survive.
pub async fn delete_course(db: &DatabaseConnection, course_id: Uuid) -> Result<()> {
    let result = course::Entity::delete_by_id(course_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Course {} not found", course_id)));
    }
    Ok(())
}

pub async fn list_courses(
    db: &DatabaseConnection,
    published_only: bool,
) -> Result<Vec<course::Model>> {
    let mut query = course::Entity::find().order_by_asc(course::Column::CreatedAt);
    if published_only {
        query = query.filter(course::Column::IsPublished.eq(true));
    }
    Ok(query.all(db).await?)
}

pub async fn get_course(db: &DatabaseConnection, course_id: Uuid) -> Result<course::Model> {
    course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))
}

// Plain module/lesson CRUD used by the admin surface

#[derive(Debug, Clone, Deserialize)]
pub struct CreateModuleInput {
    pub title: String,
}

pub async fn create_module(db: &DatabaseConnection, input: CreateModuleInput) -> Result<module::Model> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Module title is required".into()));
    }
    let now = Utc::now();
    Ok(module::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn list_modules(db: &DatabaseConnection) -> Result<Vec<module::Model>> {
    Ok(module::Entity::find()
        .order_by_asc(module::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn delete_module(db: &DatabaseConnection, module_id: Uuid) -> Result<()> {
    let result = module::Entity::delete_by_id(module_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Module {} not found", module_id)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLessonInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: i32,
}

pub async fn create_lesson(db: &DatabaseConnection, input: CreateLessonInput) -> Result<lesson::Model> {
    if input.name.trim().is_empty() {
        return Err(LyceumError::Validation("Lesson name is required".into()));
    }
    let now = Utc::now();
    Ok(lesson::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description),
        position: Set(input.position),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

pub async fn list_lessons(db: &DatabaseConnection) -> Result<Vec<lesson::Model>> {
    Ok(lesson::Entity::find()
        .order_by_asc(lesson::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn delete_lesson(db: &DatabaseConnection, lesson_id: Uuid) -> Result<()> {
    let result = lesson::Entity::delete_by_id(lesson_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Lesson {} not found", lesson_id)));
    }
    Ok(())
}

/// Attach an existing module to a course at the next free position
pub async fn link_module(
    db: &DatabaseConnection,
    course_id: Uuid,
    module_id: Uuid,
) -> Result<course_mapper::Model> {
    let txn = db.begin().await?;

    get_course_in(&txn, course_id).await?;
    module::Entity::find_by_id(module_id)
        .one(&txn)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Module {} not found", module_id)))?;

    let next_position = course_mapper::Entity::find()
        .filter(course_mapper::Column::CourseId.eq(course_id))
        .order_by_desc(course_mapper::Column::Position)
        .one(&txn)
        .await?
        .map(|m| m.position + 1)
        .unwrap_or(1);

    let mapper = course_mapper::ActiveModel {
        id: Set(Uuid::new_v4()),
        course_id: Set(course_id),
        module_id: Set(module_id),
        position: Set(next_position),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            LyceumError::Conflict("Module is already linked to this course".into())
        }
        _ => e.into(),
    })?;

    txn.commit().await?;
    Ok(mapper)
}

async fn get_course_in<C: ConnectionTrait>(db: &C, course_id: Uuid) -> Result<course::Model> {
    course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_input_validation() {
        let mut q = QuizInput {
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into()],
            answer_index: 1,
            explanation: None,
        };
        assert!(q.validate().is_ok());

        q.answer_index = 2;
        assert!(q.validate().is_err());

        q.answer_index = -1;
        assert!(q.validate().is_err());

        q.options = vec!["4".into()];
        q.answer_index = 0;
        assert!(q.validate().is_err());
    }
}
