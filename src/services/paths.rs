//! Roadmap and career path writers
//!
//! Both mirror the course creation pattern one and two levels up: an
//! ordered mapper row per referenced child, written in one transaction,
//! with any missing reference aborting the whole call.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entities::{career_path, career_path_mapper, course, roadmap, roadmap_mapper};
use crate::types::{LyceumError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoadmapInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_published: bool,
    /// Ordered course ids; position = index + 1
    #[serde(default)]
    pub course_ids: Vec<Uuid>,
}

pub async fn create_roadmap(db: &DatabaseConnection, input: CreateRoadmapInput) -> Result<Uuid> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Roadmap title is required".into()));
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let roadmap_id = Uuid::new_v4();

    roadmap::ActiveModel {
        id: Set(roadmap_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        is_published: Set(input.is_published),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for (index, course_id) in input.course_ids.into_iter().enumerate() {
        course::Entity::find_by_id(course_id)
            .one(&txn)
            .await?
            .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))?;

        roadmap_mapper::ActiveModel {
            id: Set(Uuid::new_v4()),
            roadmap_id: Set(roadmap_id),
            course_id: Set(course_id),
            position: Set(index as i32 + 1),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(roadmap_id)
}

pub async fn list_roadmaps(
    db: &DatabaseConnection,
    published_only: bool,
) -> Result<Vec<roadmap::Model>> {
    let mut query = roadmap::Entity::find().order_by_asc(roadmap::Column::CreatedAt);
    if published_only {
        query = query.filter(roadmap::Column::IsPublished.eq(true));
    }
    Ok(query.all(db).await?)
}

pub async fn delete_roadmap(db: &DatabaseConnection, roadmap_id: Uuid) -> Result<()> {
    let result = roadmap::Entity::delete_by_id(roadmap_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Roadmap {} not found", roadmap_id)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCareerPathInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_published: bool,
    /// Ordered roadmap ids; position = index + 1
    #[serde(default)]
    pub roadmap_ids: Vec<Uuid>,
}

pub async fn create_career_path(
    db: &DatabaseConnection,
    input: CreateCareerPathInput,
) -> Result<Uuid> {
    if input.title.trim().is_empty() {
        return Err(LyceumError::Validation("Career path title is required".into()));
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let career_path_id = Uuid::new_v4();

    career_path::ActiveModel {
        id: Set(career_path_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        is_published: Set(input.is_published),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for (index, roadmap_id) in input.roadmap_ids.into_iter().enumerate() {
        roadmap::Entity::find_by_id(roadmap_id)
            .one(&txn)
            .await?
            .ok_or_else(|| LyceumError::NotFound(format!("Roadmap {} not found", roadmap_id)))?;

        career_path_mapper::ActiveModel {
            id: Set(Uuid::new_v4()),
            career_path_id: Set(career_path_id),
            roadmap_id: Set(roadmap_id),
            position: Set(index as i32 + 1),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(career_path_id)
}

pub async fn list_career_paths(
    db: &DatabaseConnection,
    published_only: bool,
) -> Result<Vec<career_path::Model>> {
    let mut query = career_path::Entity::find().order_by_asc(career_path::Column::CreatedAt);
    if published_only {
        query = query.filter(career_path::Column::IsPublished.eq(true));
    }
    Ok(query.all(db).await?)
}

pub async fn delete_career_path(db: &DatabaseConnection, career_path_id: Uuid) -> Result<()> {
    let result = career_path::Entity::delete_by_id(career_path_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!(
            "Career path {} not found",
            career_path_id
        )));
    }
    Ok(())
}
