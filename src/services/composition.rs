//! Catalog composition readers
//!
//! Walks the mapper chain (course -> module -> lesson -> material, and
//! career path -> roadmap -> course above it) and assembles nested response
//! trees. Each material row is dispatched on its type tag to the matching
//! per-type lookup, shaped into a tagged view, and the resulting list is
//! sorted by mapper position. A mapper whose target row is missing is
//! silently dropped rather than surfacing a hole to the client.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::db::entities::{
    article, career_path, career_path_mapper, course, course_mapper, lesson, lesson_mapper,
    material_mapper, module, quiz, quiz_group, resource, roadmap, roadmap_mapper, video,
    MaterialRef,
};
use crate::services::enrollments;
use crate::types::{LyceumError, Result};

/// A material shaped for the API: position + type tag + typed payload
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialView {
    Video {
        order: i32,
        duration_minutes: i32,
        video: video::Model,
    },
    Quiz {
        order: i32,
        quiz: quiz::Model,
    },
    QuizGroup {
        order: i32,
        quiz_group: QuizGroupView,
    },
    Link {
        order: i32,
        resource: resource::Model,
    },
    Article {
        order: i32,
        article: article::Model,
    },
}

impl MaterialView {
    pub fn order(&self) -> i32 {
        match self {
            Self::Video { order, .. }
            | Self::Quiz { order, .. }
            | Self::QuizGroup { order, .. }
            | Self::Link { order, .. }
            | Self::Article { order, .. } => *order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizGroupView {
    #[serde(flatten)]
    pub group: quiz_group::Model,
    pub quizzes: Vec<quiz::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub order: i32,
    pub materials: Vec<MaterialView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: course::Model,
    pub modules: Vec<ModuleView>,
    /// Total linked materials, recomputed from mapper rows
    pub material_count: usize,
    /// Total mapper durations in minutes, recomputed from mapper rows
    pub total_duration_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enrolled: Option<bool>,
}

/// Materials of one lesson, shaped and sorted by mapper position
pub async fn lesson_materials<C: ConnectionTrait>(
    db: &C,
    lesson_id: Uuid,
) -> Result<Vec<MaterialView>> {
    let mappers = material_mapper::Entity::find()
        .filter(material_mapper::Column::LessonId.eq(lesson_id))
        .all(db)
        .await?;

    let mut views = Vec::with_capacity(mappers.len());
    for mapper in &mappers {
        // Rows that point at a vanished material are dropped, not surfaced
        if let Some(view) = resolve_material(db, mapper).await? {
            views.push(view);
        }
    }
    views.sort_by_key(|v| v.order());
    Ok(views)
}

/// Dispatch one mapper row to its per-type lookup
async fn resolve_material<C: ConnectionTrait>(
    db: &C,
    mapper: &material_mapper::Model,
) -> Result<Option<MaterialView>> {
    let Some(material) = mapper.material_ref() else {
        return Ok(None);
    };

    let view = match material {
        MaterialRef::Video(id) => video::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|v| MaterialView::Video {
                order: mapper.position,
                duration_minutes: mapper.duration_minutes,
                video: v,
            }),
        MaterialRef::Quiz(id) => quiz::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|q| MaterialView::Quiz {
                order: mapper.position,
                quiz: q,
            }),
        MaterialRef::QuizGroup(id) => match quiz_group::Entity::find_by_id(id).one(db).await? {
            Some(group) => {
                let quizzes = quiz::Entity::find()
                    .filter(quiz::Column::QuizGroupId.eq(id))
                    .order_by_asc(quiz::Column::CreatedAt)
                    .all(db)
                    .await?;
                Some(MaterialView::QuizGroup {
                    order: mapper.position,
                    quiz_group: QuizGroupView { group, quizzes },
                })
            }
            None => None,
        },
        MaterialRef::Link(id) => resource::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|r| MaterialView::Link {
                order: mapper.position,
                resource: r,
            }),
        MaterialRef::Article(id) => article::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|a| MaterialView::Article {
                order: mapper.position,
                article: a,
            }),
    };
    Ok(view)
}

/// Lessons of one module, each with materials, sorted by mapper position
pub async fn module_lessons<C: ConnectionTrait>(
    db: &C,
    module_id: Uuid,
) -> Result<Vec<LessonView>> {
    let mappers = lesson_mapper::Entity::find()
        .filter(lesson_mapper::Column::ModuleId.eq(module_id))
        .order_by_asc(lesson_mapper::Column::Position)
        .all(db)
        .await?;

    let mut lessons = Vec::with_capacity(mappers.len());
    for mapper in mappers {
        let Some(row) = lesson::Entity::find_by_id(mapper.lesson_id).one(db).await? else {
            continue;
        };
        let materials = lesson_materials(db, row.id).await?;
        lessons.push(LessonView {
            id: row.id,
            name: row.name,
            description: row.description,
            order: mapper.position,
            materials,
        });
    }
    Ok(lessons)
}

/// Full nested course tree; `user_id` adds the enrollment annotation
pub async fn course_details(
    db: &sea_orm::DatabaseConnection,
    course_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<CourseDetails> {
    let course_row = course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))?;

    let mappers = course_mapper::Entity::find()
        .filter(course_mapper::Column::CourseId.eq(course_id))
        .order_by_asc(course_mapper::Column::Position)
        .all(db)
        .await?;

    let mut modules = Vec::with_capacity(mappers.len());
    let mut material_count = 0usize;
    let mut total_duration_minutes = 0i64;

    for mapper in mappers {
        let Some(module_row) = module::Entity::find_by_id(mapper.module_id).one(db).await? else {
            continue;
        };
        let lessons = module_lessons(db, module_row.id).await?;
        for l in &lessons {
            material_count += l.materials.len();
            for m in &l.materials {
                if let MaterialView::Video { duration_minutes, .. } = m {
                    total_duration_minutes += *duration_minutes as i64;
                }
            }
        }
        modules.push(ModuleView {
            id: module_row.id,
            title: module_row.title,
            order: mapper.position,
            lessons,
        });
    }

    let is_enrolled = match user_id {
        Some(uid) => Some(enrollments::is_enrolled(db, uid, course_id).await?),
        None => None,
    };

    Ok(CourseDetails {
        course: course_row,
        modules,
        material_count,
        total_duration_minutes,
        is_enrolled,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: course::Model,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapDetails {
    #[serde(flatten)]
    pub roadmap: roadmap::Model,
    pub courses: Vec<CourseSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enrolled: Option<bool>,
}

/// Roadmap with its ordered course summaries
pub async fn roadmap_details(
    db: &sea_orm::DatabaseConnection,
    roadmap_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<RoadmapDetails> {
    let roadmap_row = roadmap::Entity::find_by_id(roadmap_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Roadmap {} not found", roadmap_id)))?;

    let courses = roadmap_courses(db, roadmap_id).await?;

    let is_enrolled = match user_id {
        Some(uid) => Some(enrollments::is_enrolled_roadmap(db, uid, roadmap_id).await?),
        None => None,
    };

    Ok(RoadmapDetails {
        roadmap: roadmap_row,
        courses,
        is_enrolled,
    })
}

async fn roadmap_courses<C: ConnectionTrait>(
    db: &C,
    roadmap_id: Uuid,
) -> Result<Vec<CourseSummary>> {
    let mappers = roadmap_mapper::Entity::find()
        .filter(roadmap_mapper::Column::RoadmapId.eq(roadmap_id))
        .order_by_asc(roadmap_mapper::Column::Position)
        .all(db)
        .await?;

    let mut courses = Vec::with_capacity(mappers.len());
    for mapper in mappers {
        let Some(row) = course::Entity::find_by_id(mapper.course_id).one(db).await? else {
            continue;
        };
        courses.push(CourseSummary {
            course: row,
            order: mapper.position,
        });
    }
    Ok(courses)
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapSummary {
    #[serde(flatten)]
    pub roadmap: roadmap::Model,
    pub order: i32,
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerPathDetails {
    #[serde(flatten)]
    pub career_path: career_path::Model,
    pub roadmaps: Vec<RoadmapSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enrolled: Option<bool>,
}

/// Career path with its ordered roadmaps, each with ordered courses
pub async fn career_path_details(
    db: &sea_orm::DatabaseConnection,
    career_path_id: Uuid,
    user_id: Option<Uuid>,
) -> Result<CareerPathDetails> {
    let path_row = career_path::Entity::find_by_id(career_path_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            LyceumError::NotFound(format!("Career path {} not found", career_path_id))
        })?;

    let mappers = career_path_mapper::Entity::find()
        .filter(career_path_mapper::Column::CareerPathId.eq(career_path_id))
        .order_by_asc(career_path_mapper::Column::Position)
        .all(db)
        .await?;

    let mut roadmaps = Vec::with_capacity(mappers.len());
    for mapper in mappers {
        let Some(row) = roadmap::Entity::find_by_id(mapper.roadmap_id).one(db).await? else {
            continue;
        };
        let courses = roadmap_courses(db, row.id).await?;
        roadmaps.push(RoadmapSummary {
            roadmap: row,
            order: mapper.position,
            courses,
        });
    }

    let is_enrolled = match user_id {
        Some(uid) => Some(enrollments::is_enrolled_career_path(db, uid, career_path_id).await?),
        None => None,
    };

    Ok(CareerPathDetails {
        career_path: path_row,
        roadmaps,
        is_enrolled,
    })
}
