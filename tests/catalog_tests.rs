//! Course creation and composition behavior

mod common;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use lyceum::db::entities::{course, course_mapper, lesson_mapper, material_mapper, quiz, video};
use lyceum::services::catalog::{
    self, CreateCourseInput, LessonInput, ModuleInput, QuizInput, ResourceInput, VideoInput,
};
use lyceum::services::{composition, materials};
use lyceum::types::LyceumError;

fn course_input(modules: Vec<ModuleInput>) -> CreateCourseInput {
    CreateCourseInput {
        title: "Practical Rust".into(),
        description: "Ownership and beyond".into(),
        level: course::Level::Intermediate,
        duration_hours: 12,
        is_published: true,
        modules,
    }
}

fn new_module(title: &str, lessons: Vec<LessonInput>) -> ModuleInput {
    ModuleInput {
        is_existing: false,
        id: None,
        title: Some(title.into()),
        lessons,
    }
}

fn new_lesson(name: &str) -> LessonInput {
    LessonInput {
        is_existing: false,
        id: None,
        name: Some(name.into()),
        description: String::new(),
        videos: Vec::new(),
        resources: Vec::new(),
        quizzes: Vec::new(),
    }
}

#[tokio::test]
async fn creating_course_yields_contiguous_mapper_positions() {
    let db = common::setup_db().await;

    // 2 modules, 3 and 2 lessons
    let input = course_input(vec![
        new_module(
            "Basics",
            vec![new_lesson("Intro"), new_lesson("Types"), new_lesson("Traits")],
        ),
        new_module("Advanced", vec![new_lesson("Async"), new_lesson("Unsafe")]),
    ]);
    let course_id = catalog::create_course(&db, input).await.unwrap();

    let mappers = course_mapper::Entity::find()
        .filter(course_mapper::Column::CourseId.eq(course_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(mappers.len(), 2);
    let mut positions: Vec<i32> = mappers.iter().map(|m| m.position).collect();
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2]);

    let total_lesson_mappers = lesson_mapper::Entity::find().count(&db).await.unwrap();
    assert_eq!(total_lesson_mappers, 5);

    // Per-module lesson positions start at 1 and are contiguous
    for mapper in &mappers {
        let mut lesson_positions: Vec<i32> = lesson_mapper::Entity::find()
            .filter(lesson_mapper::Column::ModuleId.eq(mapper.module_id))
            .all(&db)
            .await
            .unwrap()
            .iter()
            .map(|m| m.position)
            .collect();
        lesson_positions.sort_unstable();
        let expected: Vec<i32> = (1..=lesson_positions.len() as i32).collect();
        assert_eq!(lesson_positions, expected);
    }
}

#[tokio::test]
async fn material_order_spans_types_in_insertion_sequence() {
    let db = common::setup_db().await;

    let mut lesson = new_lesson("Mixed materials");
    lesson.videos = vec![VideoInput {
        title: "Watch".into(),
        url: "https://example.com/v".into(),
        duration_minutes: 10,
    }];
    lesson.resources = vec![ResourceInput {
        title: "Read".into(),
        url: "https://example.com/r".into(),
        description: None,
    }];
    lesson.quizzes = vec![
        QuizInput {
            question: "1+1?".into(),
            options: vec!["1".into(), "2".into()],
            answer_index: 1,
            explanation: None,
        },
        QuizInput {
            question: "2+2?".into(),
            options: vec!["4".into(), "5".into()],
            answer_index: 0,
            explanation: None,
        },
    ];

    let input = course_input(vec![new_module("Only", vec![lesson])]);
    let course_id = catalog::create_course(&db, input).await.unwrap();

    let details = composition::course_details(&db, course_id, None).await.unwrap();
    let materials = &details.modules[0].lessons[0].materials;

    // video first, then resource, then the two quizzes, positions 1..=4
    assert_eq!(materials.len(), 4);
    let orders: Vec<i32> = materials.iter().map(|m| m.order()).collect();
    assert_eq!(orders, vec![1, 2, 3, 4]);
    assert!(matches!(materials[0], composition::MaterialView::Video { .. }));
    assert!(matches!(materials[1], composition::MaterialView::Link { .. }));
    assert!(matches!(materials[2], composition::MaterialView::Quiz { .. }));
    assert!(matches!(materials[3], composition::MaterialView::Quiz { .. }));
}

#[tokio::test]
async fn missing_existing_module_aborts_the_whole_create() {
    let db = common::setup_db().await;

    let input = course_input(vec![
        new_module("Real", vec![new_lesson("A")]),
        ModuleInput {
            is_existing: true,
            id: Some(Uuid::new_v4()),
            title: None,
            lessons: Vec::new(),
        },
    ]);

    let err = catalog::create_course(&db, input).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));

    // Nothing survived the rollback
    assert_eq!(course::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(course_mapper::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn course_details_for_missing_id_is_not_found() {
    let db = common::setup_db().await;
    let err = composition::course_details(&db, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_quiz_also_deletes_its_mapper_row() {
    let db = common::setup_db().await;

    let mut lesson = new_lesson("With quiz");
    lesson.quizzes = vec![QuizInput {
        question: "Bool size?".into(),
        options: vec!["1 byte".into(), "4 bytes".into()],
        answer_index: 0,
        explanation: None,
    }];
    let input = course_input(vec![new_module("M", vec![lesson])]);
    catalog::create_course(&db, input).await.unwrap();

    let quiz_row = quiz::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(
        material_mapper::Entity::find()
            .filter(material_mapper::Column::QuizId.eq(quiz_row.id))
            .count(&db)
            .await
            .unwrap(),
        1
    );

    materials::delete_quiz(&db, quiz_row.id).await.unwrap();

    // No dangling mapper pointing at the deleted quiz
    assert_eq!(quiz::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(
        material_mapper::Entity::find()
            .filter(material_mapper::Column::QuizId.eq(quiz_row.id))
            .count(&db)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn materials_stay_sorted_with_no_holes_after_out_of_band_delete() {
    let db = common::setup_db().await;

    let mut lesson = new_lesson("Shrinking");
    lesson.videos = vec![
        VideoInput {
            title: "One".into(),
            url: "https://example.com/1".into(),
            duration_minutes: 5,
        },
        VideoInput {
            title: "Two".into(),
            url: "https://example.com/2".into(),
            duration_minutes: 6,
        },
        VideoInput {
            title: "Three".into(),
            url: "https://example.com/3".into(),
            duration_minutes: 7,
        },
    ];
    let input = course_input(vec![new_module("M", vec![lesson])]);
    let course_id = catalog::create_course(&db, input).await.unwrap();

    // Delete the middle video directly, as an out-of-band mutation would
    let second = video::Entity::find()
        .filter(video::Column::Title.eq("Two"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    video::Entity::delete_by_id(second.id).exec(&db).await.unwrap();

    let details = composition::course_details(&db, course_id, None).await.unwrap();
    let materials = &details.modules[0].lessons[0].materials;

    // The remaining list has no placeholder entries and stays ascending
    assert_eq!(materials.len(), 2);
    let orders: Vec<i32> = materials.iter().map(|m| m.order()).collect();
    assert!(orders.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn existing_module_is_reused_not_duplicated() {
    let db = common::setup_db().await;

    let module = catalog::create_module(
        &db,
        catalog::CreateModuleInput {
            title: "Shared module".into(),
        },
    )
    .await
    .unwrap();

    let input = course_input(vec![ModuleInput {
        is_existing: true,
        id: Some(module.id),
        title: None,
        lessons: Vec::new(),
    }]);
    let course_id = catalog::create_course(&db, input).await.unwrap();

    let mappers = course_mapper::Entity::find()
        .filter(course_mapper::Column::CourseId.eq(course_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(mappers.len(), 1);
    assert_eq!(mappers[0].module_id, module.id);

    // Still exactly one module row
    use lyceum::db::entities::module as module_entity;
    assert_eq!(module_entity::Entity::find().count(&db).await.unwrap(), 1);
}
