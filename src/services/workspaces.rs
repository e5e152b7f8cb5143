//! Study workspaces
//!
//! A workspace is a user's saved study session: a document or video plus
//! the last reading position. Backs the dashboard's recent-workspaces
//! sidebar.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::entities::workspace::{self, Kind};
use crate::types::{LyceumError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspaceInput {
    pub title: String,
    pub kind: Kind,
    pub source_url: String,
}

pub async fn create_workspace(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: CreateWorkspaceInput,
) -> Result<workspace::Model> {
    if input.title.trim().is_empty() || input.source_url.trim().is_empty() {
        return Err(LyceumError::Validation(
            "Workspace title and source url are required".into(),
        ));
    }
    let now = Utc::now();
    Ok(workspace::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(input.title.trim().to_string()),
        kind: Set(input.kind),
        source_url: Set(input.source_url),
        position: Set(0),
        last_opened_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

/// A workspace, scoped to its owner
pub async fn get_workspace(
    db: &DatabaseConnection,
    user_id: Uuid,
    workspace_id: Uuid,
) -> Result<workspace::Model> {
    workspace::Entity::find_by_id(workspace_id)
        .filter(workspace::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Workspace {} not found", workspace_id)))
}

/// Most recently opened workspaces for the sidebar
pub async fn recent_workspaces(
    db: &DatabaseConnection,
    user_id: Uuid,
    limit: u64,
) -> Result<Vec<workspace::Model>> {
    Ok(workspace::Entity::find()
        .filter(workspace::Column::UserId.eq(user_id))
        .order_by_desc(workspace::Column::LastOpenedAt)
        .limit(limit)
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkspaceInput {
    pub title: Option<String>,
    /// Last page (pdf) or playback second (youtube)
    pub position: Option<i32>,
}

/// Update a workspace and stamp it as just opened
pub async fn update_workspace(
    db: &DatabaseConnection,
    user_id: Uuid,
    workspace_id: Uuid,
    input: UpdateWorkspaceInput,
) -> Result<workspace::Model> {
    let existing = get_workspace(db, user_id, workspace_id).await?;
    let now = Utc::now();

    let mut active: workspace::ActiveModel = existing.into();
    if let Some(title) = input.title {
        if title.trim().is_empty() {
            return Err(LyceumError::Validation("Workspace title cannot be empty".into()));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(position) = input.position {
        active.position = Set(position.max(0));
    }
    active.last_opened_at = Set(now);
    active.updated_at = Set(now);

    Ok(active.update(db).await?)
}

pub async fn delete_workspace(
    db: &DatabaseConnection,
    user_id: Uuid,
    workspace_id: Uuid,
) -> Result<()> {
    let result = workspace::Entity::delete_many()
        .filter(workspace::Column::Id.eq(workspace_id))
        .filter(workspace::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(LyceumError::NotFound(format!("Workspace {} not found", workspace_id)));
    }
    Ok(())
}
