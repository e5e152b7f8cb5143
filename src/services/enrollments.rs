//! Enrollment operations for courses, roadmaps and career paths
//!
//! The already-enrolled invariant is backed by a unique (user, content)
//! index, so two concurrent enrolls cannot both commit: the loser surfaces
//! as a conflict instead of racing past the existence check. Cancelling is
//! a soft timestamp; re-enrolling reactivates the same row. Progress
//! counters are recomputed from progress rows inside the owning
//! transaction, never read-modify-written.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::entities::{
    career_enrollment, career_path, course, course_mapper, course_progress, enrollment, lesson,
    lesson_mapper, roadmap, roadmap_enrollment,
};
use crate::types::{LyceumError, Result};

/// Enroll a user in a course
pub async fn enroll_course(
    db: &DatabaseConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<enrollment::Model> {
    course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Course {} not found", course_id)))?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let existing = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .one(&txn)
        .await?;

    let row = match existing {
        Some(row) if row.cancelled_at.is_none() => {
            return Err(LyceumError::Conflict(
                "User is already enrolled in this course".into(),
            ));
        }
        Some(row) => {
            // Cancelled before: reactivate the same row
            let mut active: enrollment::ActiveModel = row.into();
            active.cancelled_at = Set(None);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            course_id: Set(course_id),
            progress: Set(0),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // A concurrent enroll won the insert
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                LyceumError::Conflict("User is already enrolled in this course".into())
            }
            _ => e.into(),
        })?,
    };

    txn.commit().await?;
    Ok(row)
}

/// Soft-cancel an active enrollment
pub async fn cancel_enrollment(
    db: &DatabaseConnection,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<()> {
    let updated = enrollment::Entity::update_many()
        .col_expr(
            enrollment::Column::CancelledAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::CancelledAt.is_null())
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(LyceumError::NotFound("No active enrollment".into()));
    }
    Ok(())
}

/// A non-cancelled enrollment row is the enrollment predicate
pub async fn is_enrolled<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<bool> {
    let count = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::CancelledAt.is_null())
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Active enrollments of a user, for the dashboard
pub async fn user_enrollments(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<enrollment::Model>> {
    Ok(enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CancelledAt.is_null())
        .all(db)
        .await?)
}

/// Mark a lesson complete and recompute progress for every enrolled
/// course containing it, all in one transaction.
pub async fn complete_lesson(
    db: &DatabaseConnection,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<()> {
    lesson::Entity::find_by_id(lesson_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Lesson {} not found", lesson_id)))?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let already = course_progress::Entity::find()
        .filter(course_progress::Column::UserId.eq(user_id))
        .filter(course_progress::Column::LessonId.eq(lesson_id))
        .count(&txn)
        .await?;

    if already == 0 {
        course_progress::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            lesson_id: Set(lesson_id),
            completed_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    // Courses reachable from this lesson through the mapper chain
    let module_ids: Vec<Uuid> = lesson_mapper::Entity::find()
        .filter(lesson_mapper::Column::LessonId.eq(lesson_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|m| m.module_id)
        .collect();

    if !module_ids.is_empty() {
        let course_ids: Vec<Uuid> = course_mapper::Entity::find()
            .filter(course_mapper::Column::ModuleId.is_in(module_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.course_id)
            .collect();

        for course_id in course_ids {
            recompute_course_progress(&txn, user_id, course_id).await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Recompute one enrollment's progress counter from progress rows
async fn recompute_course_progress<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<()> {
    let Some(row) = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::CancelledAt.is_null())
        .one(db)
        .await?
    else {
        return Ok(());
    };

    let module_ids: Vec<Uuid> = course_mapper::Entity::find()
        .filter(course_mapper::Column::CourseId.eq(course_id))
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.module_id)
        .collect();

    let lesson_ids: Vec<Uuid> = if module_ids.is_empty() {
        Vec::new()
    } else {
        lesson_mapper::Entity::find()
            .filter(lesson_mapper::Column::ModuleId.is_in(module_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.lesson_id)
            .collect()
    };

    let completed = if lesson_ids.is_empty() {
        0
    } else {
        course_progress::Entity::find()
            .filter(course_progress::Column::UserId.eq(user_id))
            .filter(course_progress::Column::LessonId.is_in(lesson_ids))
            .count(db)
            .await?
    };

    let mut active: enrollment::ActiveModel = row.into();
    active.progress = Set(completed as i32);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

// Roadmap enrollment mirrors the course operations

pub async fn enroll_roadmap(
    db: &DatabaseConnection,
    user_id: Uuid,
    roadmap_id: Uuid,
) -> Result<roadmap_enrollment::Model> {
    roadmap::Entity::find_by_id(roadmap_id)
        .one(db)
        .await?
        .ok_or_else(|| LyceumError::NotFound(format!("Roadmap {} not found", roadmap_id)))?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let existing = roadmap_enrollment::Entity::find()
        .filter(roadmap_enrollment::Column::UserId.eq(user_id))
        .filter(roadmap_enrollment::Column::RoadmapId.eq(roadmap_id))
        .one(&txn)
        .await?;

    let row = match existing {
        Some(row) if row.cancelled_at.is_none() => {
            return Err(LyceumError::Conflict(
                "User is already enrolled in this roadmap".into(),
            ));
        }
        Some(row) => {
            let mut active: roadmap_enrollment::ActiveModel = row.into();
            active.cancelled_at = Set(None);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => roadmap_enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            roadmap_id: Set(roadmap_id),
            progress: Set(0),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                LyceumError::Conflict("User is already enrolled in this roadmap".into())
            }
            _ => e.into(),
        })?,
    };

    txn.commit().await?;
    Ok(row)
}

pub async fn cancel_roadmap_enrollment(
    db: &DatabaseConnection,
    user_id: Uuid,
    roadmap_id: Uuid,
) -> Result<()> {
    let updated = roadmap_enrollment::Entity::update_many()
        .col_expr(
            roadmap_enrollment::Column::CancelledAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(roadmap_enrollment::Column::UserId.eq(user_id))
        .filter(roadmap_enrollment::Column::RoadmapId.eq(roadmap_id))
        .filter(roadmap_enrollment::Column::CancelledAt.is_null())
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(LyceumError::NotFound("No active roadmap enrollment".into()));
    }
    Ok(())
}

pub async fn is_enrolled_roadmap<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    roadmap_id: Uuid,
) -> Result<bool> {
    let count = roadmap_enrollment::Entity::find()
        .filter(roadmap_enrollment::Column::UserId.eq(user_id))
        .filter(roadmap_enrollment::Column::RoadmapId.eq(roadmap_id))
        .filter(roadmap_enrollment::Column::CancelledAt.is_null())
        .count(db)
        .await?;
    Ok(count > 0)
}

// Career path enrollment

pub async fn enroll_career_path(
    db: &DatabaseConnection,
    user_id: Uuid,
    career_path_id: Uuid,
) -> Result<career_enrollment::Model> {
    career_path::Entity::find_by_id(career_path_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            LyceumError::NotFound(format!("Career path {} not found", career_path_id))
        })?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let existing = career_enrollment::Entity::find()
        .filter(career_enrollment::Column::UserId.eq(user_id))
        .filter(career_enrollment::Column::CareerPathId.eq(career_path_id))
        .one(&txn)
        .await?;

    let row = match existing {
        Some(row) if row.cancelled_at.is_none() => {
            return Err(LyceumError::Conflict(
                "User is already enrolled in this career path".into(),
            ));
        }
        Some(row) => {
            let mut active: career_enrollment::ActiveModel = row.into();
            active.cancelled_at = Set(None);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => career_enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            career_path_id: Set(career_path_id),
            progress: Set(0),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                LyceumError::Conflict("User is already enrolled in this career path".into())
            }
            _ => e.into(),
        })?,
    };

    txn.commit().await?;
    Ok(row)
}

pub async fn cancel_career_enrollment(
    db: &DatabaseConnection,
    user_id: Uuid,
    career_path_id: Uuid,
) -> Result<()> {
    let updated = career_enrollment::Entity::update_many()
        .col_expr(
            career_enrollment::Column::CancelledAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(career_enrollment::Column::UserId.eq(user_id))
        .filter(career_enrollment::Column::CareerPathId.eq(career_path_id))
        .filter(career_enrollment::Column::CancelledAt.is_null())
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(LyceumError::NotFound("No active career path enrollment".into()));
    }
    Ok(())
}

pub async fn is_enrolled_career_path<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    career_path_id: Uuid,
) -> Result<bool> {
    let count = career_enrollment::Entity::find()
        .filter(career_enrollment::Column::UserId.eq(user_id))
        .filter(career_enrollment::Column::CareerPathId.eq(career_path_id))
        .filter(career_enrollment::Column::CancelledAt.is_null())
        .count(db)
        .await?;
    Ok(count > 0)
}
