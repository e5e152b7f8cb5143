//! HTTP routes for Lyceum
//!
//! Handlers are thin: parse, call the service, shape the response. Every
//! failure goes through the shared error envelope so nothing surfaces as a
//! bare 500 or a silent success.

pub mod admin_catalog;
pub mod admin_materials;
pub mod auth_routes;
pub mod catalog;
pub mod health;
pub mod users;
pub mod workspaces;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::extract_token_from_header;
use crate::auth::jwt::Claims;
use crate::server::AppState;
use crate::services::users as user_service;
use crate::types::LyceumError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// JSON error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Serialize a value into a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full_body(json))
        .unwrap()
}

/// Shape a LyceumError into the JSON error envelope
pub fn error_response(err: LyceumError) -> Response<BoxBody> {
    let status = err.status_code();
    let code = err.code().to_string();
    json_response(
        status,
        &ErrorResponse {
            error: err.to_string(),
            code: Some(code),
        },
    )
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("No route for {}", path),
            code: Some("NOT_FOUND".into()),
        },
    )
}

/// Read and deserialize a JSON request body (bounded)
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, LyceumError> {
    let body = req
        .collect()
        .await
        .map_err(|e| LyceumError::BadRequest(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 1_048_576 {
        return Err(LyceumError::BadRequest("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| LyceumError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Validate the bearer token and check it against the account's current
/// state (active, token version).
pub async fn require_auth(
    state: &Arc<AppState>,
    req: &Request<Incoming>,
) -> Result<Claims, LyceumError> {
    let header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| LyceumError::Unauthorized("Missing Authorization header".into()))?;

    let token = extract_token_from_header(header)
        .ok_or_else(|| LyceumError::Unauthorized("Malformed Authorization header".into()))?;

    let claims = state.jwt.validate_token(token)?;

    let user = user_service::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|_| LyceumError::Unauthorized("Unknown account".into()))?;
    if !user.is_active {
        return Err(LyceumError::Forbidden("Account is disabled".into()));
    }
    if user.token_version != claims.version {
        return Err(LyceumError::Unauthorized("Token has been revoked".into()));
    }

    Ok(claims)
}

/// require_auth plus the admin role
pub async fn require_admin(
    state: &Arc<AppState>,
    req: &Request<Incoming>,
) -> Result<Claims, LyceumError> {
    let claims = require_auth(state, req).await?;
    if !claims.is_admin() {
        return Err(LyceumError::Forbidden("Admin role required".into()));
    }
    Ok(claims)
}

/// Parse a UUID path segment
pub fn parse_id(segment: &str) -> Result<uuid::Uuid, LyceumError> {
    segment
        .parse()
        .map_err(|_| LyceumError::BadRequest(format!("Invalid id: {}", segment)))
}
