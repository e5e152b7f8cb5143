//! Enrollment invariants

mod common;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use lyceum::db::entities::course;
use lyceum::services::catalog::{self, CreateCourseInput, LessonInput, ModuleInput};
use lyceum::services::{enrollments, users};
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

async fn make_course(db: &DatabaseConnection) -> Uuid {
    catalog::create_course(
        db,
        CreateCourseInput {
            title: "Course".into(),
            description: String::new(),
            level: course::Level::Beginner,
            duration_hours: 1,
            is_published: true,
            modules: vec![ModuleInput {
                is_existing: false,
                id: None,
                title: Some("M1".into()),
                lessons: vec![
                    LessonInput {
                        is_existing: false,
                        id: None,
                        name: Some("L1".into()),
                        description: String::new(),
                        videos: Vec::new(),
                        resources: Vec::new(),
                        quizzes: Vec::new(),
                    },
                    LessonInput {
                        is_existing: false,
                        id: None,
                        name: Some("L2".into()),
                        description: String::new(),
                        videos: Vec::new(),
                        resources: Vec::new(),
                        quizzes: Vec::new(),
                    },
                ],
            }],
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn second_enroll_fails_with_conflict() {
    let db = common::setup_db().await;
    let user = make_user(&db, "a@example.com").await;
    let course_id = make_course(&db).await;

    enrollments::enroll_course(&db, user, course_id).await.unwrap();
    let err = enrollments::enroll_course(&db, user, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Conflict(_)));

    assert!(enrollments::is_enrolled(&db, user, course_id).await.unwrap());
}

#[tokio::test]
async fn cancel_then_reenroll_reactivates() {
    let db = common::setup_db().await;
    let user = make_user(&db, "b@example.com").await;
    let course_id = make_course(&db).await;

    enrollments::enroll_course(&db, user, course_id).await.unwrap();
    enrollments::cancel_enrollment(&db, user, course_id)
        .await
        .unwrap();
    assert!(!enrollments::is_enrolled(&db, user, course_id).await.unwrap());

    // Cancelling twice is an error: nothing active to cancel
    let err = enrollments::cancel_enrollment(&db, user, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));

    let row = enrollments::enroll_course(&db, user, course_id).await.unwrap();
    assert!(row.cancelled_at.is_none());
    assert!(enrollments::is_enrolled(&db, user, course_id).await.unwrap());

    // Reactivated, not duplicated
    assert_eq!(
        enrollments::user_enrollments(&db, user).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn enrolling_in_missing_course_is_not_found() {
    let db = common::setup_db().await;
    let user = make_user(&db, "c@example.com").await;
    let err = enrollments::enroll_course(&db, user, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));
}

#[tokio::test]
async fn completing_lessons_recomputes_progress() {
    let db = common::setup_db().await;
    let user = make_user(&db, "d@example.com").await;
    let course_id = make_course(&db).await;

    enrollments::enroll_course(&db, user, course_id).await.unwrap();

    let details = lyceum::services::composition::course_details(&db, course_id, None)
        .await
        .unwrap();
    let lessons: Vec<Uuid> = details.modules[0].lessons.iter().map(|l| l.id).collect();
    assert_eq!(lessons.len(), 2);

    enrollments::complete_lesson(&db, user, lessons[0]).await.unwrap();
    let row = &enrollments::user_enrollments(&db, user).await.unwrap()[0];
    assert_eq!(row.progress, 1);

    // Completing the same lesson again is idempotent
    enrollments::complete_lesson(&db, user, lessons[0]).await.unwrap();
    let row = &enrollments::user_enrollments(&db, user).await.unwrap()[0];
    assert_eq!(row.progress, 1);

    enrollments::complete_lesson(&db, user, lessons[1]).await.unwrap();
    let row = &enrollments::user_enrollments(&db, user).await.unwrap()[0];
    assert_eq!(row.progress, 2);
}

#[tokio::test]
async fn detail_annotation_reflects_enrollment() {
    let db = common::setup_db().await;
    let user = make_user(&db, "e@example.com").await;
    let course_id = make_course(&db).await;

    let details = lyceum::services::composition::course_details(&db, course_id, Some(user))
        .await
        .unwrap();
    assert_eq!(details.is_enrolled, Some(false));

    enrollments::enroll_course(&db, user, course_id).await.unwrap();
    let details = lyceum::services::composition::course_details(&db, course_id, Some(user))
        .await
        .unwrap();
    assert_eq!(details.is_enrolled, Some(true));

    // Anonymous readers get no annotation
    let details = lyceum::services::composition::course_details(&db, course_id, None)
        .await
        .unwrap();
    assert_eq!(details.is_enrolled, None);
}
