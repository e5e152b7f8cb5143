//! User profile routes

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;

use super::{json_response, parse_json_body, require_auth, BoxBody};
use crate::server::AppState;
use crate::services::{enrollments, users as user_service};
use crate::types::Result;

/// GET /users/profile
pub async fn handle_get_profile(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let account = user_service::find_by_id(&state.db, claims.sub).await?;
    Ok(json_response(StatusCode::OK, &account))
}

/// PATCH /users/profile
pub async fn handle_update_profile(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let input: user_service::UpdateProfileInput = parse_json_body(req).await?;
    let account = user_service::update_profile(&state.db, claims.sub, input).await?;
    Ok(json_response(StatusCode::OK, &account))
}

/// GET /users/enrollments
pub async fn handle_my_enrollments(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let rows = enrollments::user_enrollments(&state.db, claims.sub).await?;
    Ok(json_response(StatusCode::OK, &rows))
}
