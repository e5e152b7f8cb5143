//! Workspace CRUD and recency ordering

mod common;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use lyceum::db::entities::workspace::Kind;
use lyceum::services::users;
use lyceum::services::workspaces::{
    self, CreateWorkspaceInput, UpdateWorkspaceInput,
};
use lyceum::types::LyceumError;

async fn make_user(db: &DatabaseConnection, email: &str) -> Uuid {
    users::register(
        db,
        users::RegisterInput {
            email: email.into(),
            password: "hunter2hunter2".into(),
            name: "Learner".into(),
        },
    )
    .await
    .unwrap()
    .id
}

fn pdf(title: &str) -> CreateWorkspaceInput {
    CreateWorkspaceInput {
        title: title.into(),
        kind: Kind::Pdf,
        source_url: "https://example.com/doc.pdf".into(),
    }
}

#[tokio::test]
async fn update_bumps_recency_order() {
    let db = common::setup_db().await;
    let user = make_user(&db, "w@example.com").await;

    let first = workspaces::create_workspace(&db, user, pdf("First")).await.unwrap();
    let second = workspaces::create_workspace(&db, user, pdf("Second")).await.unwrap();

    // Touch the older one; it becomes the most recent
    workspaces::update_workspace(
        &db,
        user,
        first.id,
        UpdateWorkspaceInput {
            title: None,
            position: Some(42),
        },
    )
    .await
    .unwrap();

    let recent = workspaces::recent_workspaces(&db, user, 10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, first.id);
    assert_eq!(recent[0].position, 42);
    assert_eq!(recent[1].id, second.id);
}

#[tokio::test]
async fn workspaces_are_scoped_to_their_owner() {
    let db = common::setup_db().await;
    let owner = make_user(&db, "owner@example.com").await;
    let other = make_user(&db, "other@example.com").await;

    let ws = workspaces::create_workspace(&db, owner, pdf("Private")).await.unwrap();

    let err = workspaces::get_workspace(&db, other, ws.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));

    let err = workspaces::delete_workspace(&db, other, ws.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));

    // Owner still sees it
    workspaces::get_workspace(&db, owner, ws.id).await.unwrap();
    assert_eq!(workspaces::recent_workspaces(&db, other, 10).await.unwrap().len(), 0);
}

#[tokio::test]
async fn delete_removes_the_workspace() {
    let db = common::setup_db().await;
    let user = make_user(&db, "d@example.com").await;

    let ws = workspaces::create_workspace(&db, user, pdf("Temp")).await.unwrap();
    workspaces::delete_workspace(&db, user, ws.id).await.unwrap();

    let err = workspaces::get_workspace(&db, user, ws.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));
}
