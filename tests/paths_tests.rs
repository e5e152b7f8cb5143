//! Roadmap and career path composition

mod common;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use lyceum::db::entities::{course, roadmap, roadmap_mapper};
use lyceum::services::catalog::{self, CreateCourseInput};
use lyceum::services::paths::{self, CreateCareerPathInput, CreateRoadmapInput};
use lyceum::services::{composition, enrollments, users};
use lyceum::types::LyceumError;

async fn make_course(db: &DatabaseConnection, title: &str) -> Uuid {
    catalog::create_course(
        db,
        CreateCourseInput {
            title: title.into(),
            description: String::new(),
            level: course::Level::Beginner,
            duration_hours: 1,
            is_published: true,
            modules: Vec::new(),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn roadmap_keeps_course_order() {
    let db = common::setup_db().await;
    let first = make_course(&db, "First").await;
    let second = make_course(&db, "Second").await;

    let roadmap_id = paths::create_roadmap(
        &db,
        CreateRoadmapInput {
            title: "Backend path".into(),
            description: String::new(),
            is_published: true,
            course_ids: vec![first, second],
        },
    )
    .await
    .unwrap();

    let details = composition::roadmap_details(&db, roadmap_id, None).await.unwrap();
    assert_eq!(details.courses.len(), 2);
    assert_eq!(details.courses[0].order, 1);
    assert_eq!(details.courses[1].order, 2);
    assert_eq!(details.courses[0].course.id, first);
    assert_eq!(details.courses[1].course.id, second);
}

#[tokio::test]
async fn roadmap_with_missing_course_rolls_back() {
    let db = common::setup_db().await;
    let real = make_course(&db, "Real").await;

    let err = paths::create_roadmap(
        &db,
        CreateRoadmapInput {
            title: "Broken".into(),
            description: String::new(),
            is_published: false,
            course_ids: vec![real, Uuid::new_v4()],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));

    assert_eq!(roadmap::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(roadmap_mapper::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn career_path_nests_roadmaps_and_courses() {
    let db = common::setup_db().await;
    let course_id = make_course(&db, "Rust 101").await;

    let roadmap_id = paths::create_roadmap(
        &db,
        CreateRoadmapInput {
            title: "Systems".into(),
            description: String::new(),
            is_published: true,
            course_ids: vec![course_id],
        },
    )
    .await
    .unwrap();

    let career_path_id = paths::create_career_path(
        &db,
        CreateCareerPathInput {
            title: "Systems engineer".into(),
            description: String::new(),
            is_published: true,
            roadmap_ids: vec![roadmap_id],
        },
    )
    .await
    .unwrap();

    let details = composition::career_path_details(&db, career_path_id, None)
        .await
        .unwrap();
    assert_eq!(details.roadmaps.len(), 1);
    assert_eq!(details.roadmaps[0].order, 1);
    assert_eq!(details.roadmaps[0].courses.len(), 1);
    assert_eq!(details.roadmaps[0].courses[0].course.id, course_id);
}

#[tokio::test]
async fn roadmap_enrollment_mirrors_course_rules() {
    let db = common::setup_db().await;
    let user = users::register(
        &db,
        users::RegisterInput {
            email: "r@example.com".into(),
            password: "hunter2hunter2".into(),
            name: "Learner".into(),
        },
    )
    .await
    .unwrap()
    .id;

    let roadmap_id = paths::create_roadmap(
        &db,
        CreateRoadmapInput {
            title: "Path".into(),
            description: String::new(),
            is_published: true,
            course_ids: Vec::new(),
        },
    )
    .await
    .unwrap();

    enrollments::enroll_roadmap(&db, user, roadmap_id).await.unwrap();
    let err = enrollments::enroll_roadmap(&db, user, roadmap_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Conflict(_)));

    let details = composition::roadmap_details(&db, roadmap_id, Some(user))
        .await
        .unwrap();
    assert_eq!(details.is_enrolled, Some(true));

    enrollments::cancel_roadmap_enrollment(&db, user, roadmap_id)
        .await
        .unwrap();
    assert!(!enrollments::is_enrolled_roadmap(&db, user, roadmap_id)
        .await
        .unwrap());
}
