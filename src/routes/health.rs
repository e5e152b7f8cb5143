//! Liveness, readiness and version endpoints

use hyper::{Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::{json_response, BoxBody};
use crate::server::AppState;

/// Liveness probe: returns 200 while the process is up
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "ok",
            "node_id": state.args.node_id,
        }),
    )
}

/// Readiness probe: returns 200 only when the database answers
pub async fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    match state.db.ping().await {
        Ok(()) => json_response(StatusCode::OK, &json!({ "status": "ready" })),
        Err(e) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({ "status": "unavailable", "error": e.to_string() }),
        ),
    }
}

/// Version info for deployment verification
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Dev-only API index: a JSON sketch of the surface, mounted at /api
pub fn api_index(state: Arc<AppState>) -> Response<BoxBody> {
    if !state.args.dev_mode {
        return json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": "No route for /api", "code": "NOT_FOUND" }),
        );
    }

    json_response(
        StatusCode::OK,
        &json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "routes": {
                "auth": [
                    "POST /auth/register",
                    "POST /auth/login",
                    "POST /auth/refresh",
                    "POST /auth/logout",
                    "POST /auth/otp/request",
                    "POST /auth/otp/verify",
                    "GET /auth/github",
                    "GET /auth/google",
                ],
                "catalog": [
                    "GET /courses/list",
                    "GET /courses/{id}",
                    "POST /courses/{id}/enroll",
                    "DELETE /courses/{id}/enroll",
                    "POST /lessons/{id}/complete",
                    "GET /roadmaps/list",
                    "GET /roadmaps/{id}",
                    "POST /roadmaps/{id}/enroll",
                    "GET /career-paths/list",
                    "GET /career-paths/{id}",
                    "POST /career-paths/{id}/enroll",
                ],
                "users": ["GET /users/profile", "PATCH /users/profile", "GET /users/enrollments"],
                "workspaces": [
                    "GET /workspaces",
                    "POST /workspaces",
                    "GET /workspaces/{id}",
                    "PATCH /workspaces/{id}",
                    "DELETE /workspaces/{id}",
                    "GET /workspaces/{id}/chat",
                    "POST /workspaces/{id}/chat",
                ],
                "admin": [
                    "GET|POST /admin/courses",
                    "PATCH|DELETE /admin/courses/{id}",
                    "POST /admin/courses/{id}/modules/{module_id}",
                    "GET|POST /admin/modules",
                    "GET|DELETE /admin/modules/{id}",
                    "GET|POST /admin/lessons",
                    "GET /admin/lessons/{id}/materials",
                    "GET|POST /admin/quizzes",
                    "GET|POST /admin/quiz-groups",
                    "GET|POST /admin/videos",
                    "GET|POST /admin/resources",
                    "GET|POST /admin/articles",
                    "POST|DELETE /admin/mapper/material",
                    "GET|POST /admin/roadmaps",
                    "GET|POST /admin/career-paths",
                ],
            },
        }),
    )
}
