//! Public catalog and enrollment routes
//!
//! Listing and detail composition for courses, roadmaps and career paths,
//! plus the enroll/cancel/progress mutations. Detail responses carry the
//! `is_enrolled` annotation when the caller is authenticated; unpublished
//! content is only visible to admins.

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::{empty_body, json_response, require_auth, BoxBody};
use crate::auth::jwt::Claims;
use crate::logging::{EventType, UsageEvent};
use crate::server::AppState;
use crate::services::{composition, enrollments, catalog as catalog_service, paths};
use crate::types::Result;

/// Best-effort authentication: detail pages work anonymously too
async fn optional_auth(state: &Arc<AppState>, req: &Request<Incoming>) -> Option<Claims> {
    require_auth(state, req).await.ok()
}

/// GET /courses/list
pub async fn handle_course_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let published_only = !claims.map(|c| c.is_admin()).unwrap_or(false);
    let courses = catalog_service::list_courses(&state.db, published_only).await?;
    Ok(json_response(StatusCode::OK, &courses))
}

/// GET /courses/{id}
pub async fn handle_course_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let details =
        composition::course_details(&state.db, course_id, claims.map(|c| c.sub)).await?;
    Ok(json_response(StatusCode::OK, &details))
}

/// POST /courses/{id}/enroll
pub async fn handle_enroll_course(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let row = enrollments::enroll_course(&state.db, claims.sub, course_id).await?;

    state
        .usage
        .log(
            UsageEvent::new(EventType::Enrolled, state.args.node_id)
                .with_user(claims.sub)
                .with_operation("courses.enroll"),
        )
        .await;

    Ok(json_response(StatusCode::CREATED, &row))
}

/// DELETE /courses/{id}/enroll
pub async fn handle_cancel_enrollment(
    req: Request<Incoming>,
    state: Arc<AppState>,
    course_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    enrollments::cancel_enrollment(&state.db, claims.sub, course_id).await?;

    state
        .usage
        .log(
            UsageEvent::new(EventType::EnrollmentCancelled, state.args.node_id)
                .with_user(claims.sub)
                .with_operation("courses.cancel"),
        )
        .await;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// POST /lessons/{id}/complete
pub async fn handle_complete_lesson(
    req: Request<Incoming>,
    state: Arc<AppState>,
    lesson_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    enrollments::complete_lesson(&state.db, claims.sub, lesson_id).await?;
    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "completed" }),
    ))
}

/// GET /roadmaps/list
pub async fn handle_roadmap_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let published_only = !claims.map(|c| c.is_admin()).unwrap_or(false);
    let roadmaps = paths::list_roadmaps(&state.db, published_only).await?;
    Ok(json_response(StatusCode::OK, &roadmaps))
}

/// GET /roadmaps/{id}
pub async fn handle_roadmap_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
    roadmap_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let details =
        composition::roadmap_details(&state.db, roadmap_id, claims.map(|c| c.sub)).await?;
    Ok(json_response(StatusCode::OK, &details))
}

/// POST /roadmaps/{id}/enroll
pub async fn handle_enroll_roadmap(
    req: Request<Incoming>,
    state: Arc<AppState>,
    roadmap_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let row = enrollments::enroll_roadmap(&state.db, claims.sub, roadmap_id).await?;

    state
        .usage
        .log(
            UsageEvent::new(EventType::Enrolled, state.args.node_id)
                .with_user(claims.sub)
                .with_operation("roadmaps.enroll"),
        )
        .await;

    Ok(json_response(StatusCode::CREATED, &row))
}

/// DELETE /roadmaps/{id}/enroll
pub async fn handle_cancel_roadmap_enrollment(
    req: Request<Incoming>,
    state: Arc<AppState>,
    roadmap_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    enrollments::cancel_roadmap_enrollment(&state.db, claims.sub, roadmap_id).await?;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// GET /career-paths/list
pub async fn handle_career_path_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let published_only = !claims.map(|c| c.is_admin()).unwrap_or(false);
    let rows = paths::list_career_paths(&state.db, published_only).await?;
    Ok(json_response(StatusCode::OK, &rows))
}

/// GET /career-paths/{id}
pub async fn handle_career_path_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
    career_path_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = optional_auth(&state, &req).await;
    let details =
        composition::career_path_details(&state.db, career_path_id, claims.map(|c| c.sub))
            .await?;
    Ok(json_response(StatusCode::OK, &details))
}

/// POST /career-paths/{id}/enroll
pub async fn handle_enroll_career_path(
    req: Request<Incoming>,
    state: Arc<AppState>,
    career_path_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let row = enrollments::enroll_career_path(&state.db, claims.sub, career_path_id).await?;

    state
        .usage
        .log(
            UsageEvent::new(EventType::Enrolled, state.args.node_id)
                .with_user(claims.sub)
                .with_operation("career_paths.enroll"),
        )
        .await;

    Ok(json_response(StatusCode::CREATED, &row))
}

/// DELETE /career-paths/{id}/enroll
pub async fn handle_cancel_career_enrollment(
    req: Request<Incoming>,
    state: Arc<AppState>,
    career_path_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    enrollments::cancel_career_enrollment(&state.db, claims.sub, career_path_id).await?;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}
