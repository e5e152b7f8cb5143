//! User accounts and profiles

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::db::entities::user::{self, Role};
use crate::types::{LyceumError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Create a local account with a hashed password
pub async fn register(db: &DatabaseConnection, input: RegisterInput) -> Result<user::Model> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(LyceumError::Validation("A valid email is required".into()));
    }
    if input.password.len() < 8 {
        return Err(LyceumError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    let name = input.name.trim();
    if name.is_empty() {
        return Err(LyceumError::Validation("Name is required".into()));
    }

    let password_hash = hash_password(&input.password)?;
    let now = Utc::now();

    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name.to_string()),
        role: Set(Role::User),
        is_active: Set(true),
        is_verified: Set(false),
        is_pro: Set(false),
        token_version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            LyceumError::Conflict("An account with this email already exists".into())
        }
        _ => e.into(),
    })
}

/// Check credentials and return the account
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::Unauthorized("Invalid email or password".into()))?;

    if !user.is_active {
        return Err(LyceumError::Forbidden("Account is disabled".into()));
    }
    if !verify_password(password, &user.password_hash)? {
        return Err(LyceumError::Unauthorized("Invalid email or password".into()));
    }
    Ok(user)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<user::Model> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("User {} not found", id)))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

/// Find or create the account behind an OAuth login. OAuth accounts come
/// in verified and carry an unguessable placeholder password.
pub async fn oauth_login(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
) -> Result<user::Model> {
    if let Some(existing) = find_by_email(db, email).await? {
        if !existing.is_active {
            return Err(LyceumError::Forbidden("Account is disabled".into()));
        }
        if !existing.is_verified {
            let mut active: user::ActiveModel = existing.into();
            active.is_verified = Set(true);
            active.updated_at = Set(Utc::now());
            return Ok(active.update(db).await?);
        }
        return Ok(existing);
    }

    let now = Utc::now();
    let placeholder = hash_password(&Uuid::new_v4().to_string())?;
    Ok(user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_lowercase()),
        password_hash: Set(placeholder),
        name: Set(name.to_string()),
        role: Set(Role::User),
        is_active: Set(true),
        is_verified: Set(true),
        is_pro: Set(false),
        token_version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?)
}

/// Mark the account's email as verified
pub async fn mark_verified(db: &DatabaseConnection, user_id: Uuid) -> Result<()> {
    let user = find_by_id(db, user_id).await?;
    let mut active: user::ActiveModel = user.into();
    active.is_verified = Set(true);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: UpdateProfileInput,
) -> Result<user::Model> {
    let user = find_by_id(db, user_id).await?;
    let mut active: user::ActiveModel = user.into();

    if let Some(name) = input.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LyceumError::Validation("Name cannot be empty".into()));
        }
        active.name = Set(name);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Bump the token version, invalidating all outstanding JWTs
pub async fn bump_token_version(db: &DatabaseConnection, user_id: Uuid) -> Result<()> {
    let user = find_by_id(db, user_id).await?;
    let version = user.token_version + 1;
    let mut active: user::ActiveModel = user.into();
    active.token_version = Set(version);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}
