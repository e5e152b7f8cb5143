//! Admin catalog routes: courses, modules, lessons, roadmaps, career paths

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::{empty_body, json_response, parse_json_body, require_admin, BoxBody};
use crate::logging::{EventType, UsageEvent};
use crate::server::AppState;
use crate::services::{catalog, composition, paths};
use crate::types::Result;

async fn log_admin(state: &Arc<AppState>, user: Uuid, operation: &str) {
    state
        .usage
        .log(
            UsageEvent::new(EventType::AdminMutation, state.args.node_id)
                .with_user(user)
                .with_operation(operation),
        )
        .await;
}

/// POST /admin/courses
pub async fn handle_create_course(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: catalog::CreateCourseInput = parse_json_body(req).await?;
    let course_id = catalog::create_course(&state.db, input).await?;
    log_admin(&state, claims.sub, "courses.create").await;

    let details = composition::course_details(&state.db, course_id, None).await?;
    Ok(json_response(StatusCode::CREATED, &details))
}

/// GET /admin/courses
pub async fn handle_admin_course_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let courses = catalog::list_courses(&state.db, false).await?;
    Ok(json_response(StatusCode::OK, &courses))
}

/// PATCH /admin/courses/{id}
pub async fn handle_update_course(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: catalog::UpdateCourseInput = parse_json_body(req).await?;
    let course = catalog::update_course(&state.db, course_id, input).await?;
    log_admin(&state, claims.sub, "courses.update").await;
    Ok(json_response(StatusCode::OK, &course))
}

/// DELETE /admin/courses/{id}
pub async fn handle_delete_course(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    catalog::delete_course(&state.db, course_id).await?;
    log_admin(&state, claims.sub, "courses.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// POST /admin/courses/{id}/modules/{module_id} - link an existing module
pub async fn handle_link_module(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
    module_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let mapper = catalog::link_module(&state.db, course_id, module_id).await?;
    log_admin(&state, claims.sub, "courses.link_module").await;
    Ok(json_response(StatusCode::CREATED, &mapper))
}

/// POST /admin/modules
pub async fn handle_create_module(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: catalog::CreateModuleInput = parse_json_body(req).await?;
    let module = catalog::create_module(&state.db, input).await?;
    log_admin(&state, claims.sub, "modules.create").await;
    Ok(json_response(StatusCode::CREATED, &module))
}

/// GET /admin/modules
pub async fn handle_module_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let modules = catalog::list_modules(&state.db).await?;
    Ok(json_response(StatusCode::OK, &modules))
}

/// GET /admin/modules/{id} - module with composed lessons
pub async fn handle_module_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
    module_id: Uuid,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let lessons = composition::module_lessons(&state.db, module_id).await?;
    Ok(json_response(StatusCode::OK, &lessons))
}

/// DELETE /admin/modules/{id}
pub async fn handle_delete_module(
    req: Request<Incoming>,
    state: Arc<AppState>,
    module_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    catalog::delete_module(&state.db, module_id).await?;
    log_admin(&state, claims.sub, "modules.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// POST /admin/lessons
pub async fn handle_create_lesson(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: catalog::CreateLessonInput = parse_json_body(req).await?;
    let lesson = catalog::create_lesson(&state.db, input).await?;
    log_admin(&state, claims.sub, "lessons.create").await;
    Ok(json_response(StatusCode::CREATED, &lesson))
}

/// GET /admin/lessons
pub async fn handle_lesson_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let lessons = catalog::list_lessons(&state.db).await?;
    Ok(json_response(StatusCode::OK, &lessons))
}

/// GET /admin/lessons/{id}/materials - composed material list
pub async fn handle_lesson_materials(
    req: Request<Incoming>,
    state: Arc<AppState>,
    lesson_id: Uuid,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let materials = composition::lesson_materials(&state.db, lesson_id).await?;
    Ok(json_response(StatusCode::OK, &materials))
}

/// DELETE /admin/lessons/{id}
pub async fn handle_delete_lesson(
    req: Request<Incoming>,
    state: Arc<AppState>,
    lesson_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    catalog::delete_lesson(&state.db, lesson_id).await?;
    log_admin(&state, claims.sub, "lessons.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// POST /admin/roadmaps
pub async fn handle_create_roadmap(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: paths::CreateRoadmapInput = parse_json_body(req).await?;
    let roadmap_id = paths::create_roadmap(&state.db, input).await?;
    log_admin(&state, claims.sub, "roadmaps.create").await;

    let details = composition::roadmap_details(&state.db, roadmap_id, None).await?;
    Ok(json_response(StatusCode::CREATED, &details))
}

/// GET /admin/roadmaps - includes unpublished
pub async fn handle_admin_roadmap_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let roadmaps = paths::list_roadmaps(&state.db, false).await?;
    Ok(json_response(StatusCode::OK, &roadmaps))
}

/// DELETE /admin/roadmaps/{id}
pub async fn handle_delete_roadmap(
    req: Request<Incoming>,
    state: Arc<AppState>,
    roadmap_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    paths::delete_roadmap(&state.db, roadmap_id).await?;
    log_admin(&state, claims.sub, "roadmaps.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// POST /admin/career-paths
pub async fn handle_create_career_path(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: paths::CreateCareerPathInput = parse_json_body(req).await?;
    let career_path_id = paths::create_career_path(&state.db, input).await?;
    log_admin(&state, claims.sub, "career_paths.create").await;

    let details = composition::career_path_details(&state.db, career_path_id, None).await?;
    Ok(json_response(StatusCode::CREATED, &details))
}

/// GET /admin/career-paths - includes unpublished
pub async fn handle_admin_career_path_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let rows = paths::list_career_paths(&state.db, false).await?;
    Ok(json_response(StatusCode::OK, &rows))
}

/// DELETE /admin/career-paths/{id}
pub async fn handle_delete_career_path(
    req: Request<Incoming>,
    state: Arc<AppState>,
    career_path_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    paths::delete_career_path(&state.db, career_path_id).await?;
    log_admin(&state, claims.sub, "career_paths.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}
