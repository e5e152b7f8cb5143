//! Workspace routes and the streaming chat endpoint
//!
//! The chat reply streams back as a chunked plain-text body. The response
//! body is driven by a `TokenStream`; when the client disconnects the body
//! is dropped, which cancels the stream and tears down the upstream
//! request. Starting a new reply for the same workspace cancels whatever
//! stream was still running.

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::{empty_body, json_response, parse_json_body, require_auth, BoxBody};
use crate::chat::{Action, TokenStream};
use crate::logging::{EventType, UsageEvent};
use crate::server::AppState;
use crate::services::workspaces as workspace_service;
use crate::types::{LyceumError, Result};

/// POST /workspaces
pub async fn handle_create_workspace(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let input: workspace_service::CreateWorkspaceInput = parse_json_body(req).await?;
    let workspace = workspace_service::create_workspace(&state.db, claims.sub, input).await?;
    Ok(json_response(StatusCode::CREATED, &workspace))
}

/// GET /workspaces?limit=N - recent workspaces for the sidebar
pub async fn handle_recent_workspaces(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;

    #[derive(Deserialize)]
    struct Query {
        limit: Option<u64>,
    }
    let query: Query =
        serde_urlencoded::from_str(req.uri().query().unwrap_or("")).unwrap_or(Query { limit: None });

    let rows = workspace_service::recent_workspaces(
        &state.db,
        claims.sub,
        query.limit.unwrap_or(20).min(100),
    )
    .await?;
    Ok(json_response(StatusCode::OK, &rows))
}

/// GET /workspaces/{id}
pub async fn handle_get_workspace(
    req: Request<Incoming>,
    state: Arc<AppState>,
    workspace_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let workspace = workspace_service::get_workspace(&state.db, claims.sub, workspace_id).await?;
    Ok(json_response(StatusCode::OK, &workspace))
}

/// PATCH /workspaces/{id}
pub async fn handle_update_workspace(
    req: Request<Incoming>,
    state: Arc<AppState>,
    workspace_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    let input: workspace_service::UpdateWorkspaceInput = parse_json_body(req).await?;
    let workspace =
        workspace_service::update_workspace(&state.db, claims.sub, workspace_id, input).await?;
    Ok(json_response(StatusCode::OK, &workspace))
}

/// DELETE /workspaces/{id}
pub async fn handle_delete_workspace(
    req: Request<Incoming>,
    state: Arc<AppState>,
    workspace_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    workspace_service::delete_workspace(&state.db, claims.sub, workspace_id).await?;
    state.chat_sessions.remove(workspace_id);
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

/// GET /workspaces/{id}/chat - transcript snapshot
pub async fn handle_chat_transcript(
    req: Request<Incoming>,
    state: Arc<AppState>,
    workspace_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    workspace_service::get_workspace(&state.db, claims.sub, workspace_id).await?;
    let session = state.chat_sessions.snapshot(workspace_id);
    Ok(json_response(StatusCode::OK, &session))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// POST /workspaces/{id}/chat - send a message, stream the reply
pub async fn handle_chat_stream(
    req: Request<Incoming>,
    state: Arc<AppState>,
    workspace_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;
    workspace_service::get_workspace(&state.db, claims.sub, workspace_id).await?;

    let upstream = state
        .chat_upstream
        .clone()
        .ok_or_else(|| LyceumError::Config("Chat upstream is not configured".into()))?;

    let input: ChatRequest = parse_json_body(req).await?;
    if input.message.trim().is_empty() {
        return Err(LyceumError::Validation("Message cannot be empty".into()));
    }

    let sessions = Arc::clone(&state.chat_sessions);

    // A reply that is still streaming for this workspace is abandoned
    if sessions.snapshot(workspace_id).is_streaming() {
        sessions.apply(workspace_id, Action::StreamFailed);
    }
    sessions.apply(workspace_id, Action::UserMessage(input.message.clone()));
    let history = sessions.snapshot(workspace_id).messages;

    let (sender, stream) = TokenStream::channel(64);
    sessions.begin_stream(workspace_id, stream.cancel_handle());

    state
        .usage
        .log(
            UsageEvent::new(EventType::ChatStream, state.args.node_id)
                .with_user(claims.sub)
                .with_operation("workspaces.chat"),
        )
        .await;

    // Producer: forward the upstream reply into the stream
    tokio::spawn({
        let sessions = Arc::clone(&sessions);
        async move {
            match upstream
                .stream_reply(workspace_id, &input.message, &history, sender)
                .await
            {
                Ok(_) => {}
                Err(e) => {
                    warn!(%workspace_id, "Chat upstream failed: {}", e);
                    sessions.apply(workspace_id, Action::StreamFailed);
                    sessions.end_stream(workspace_id);
                }
            }
        }
    });

    // Consumer: bridge the stream into the chunked response body, applying
    // transcript actions as chunks pass through
    let body_stream = stream.map(move |chunk| {
        if chunk.is_final {
            sessions.apply(workspace_id, Action::StreamComplete);
            sessions.end_stream(workspace_id);
        } else {
            sessions.apply(workspace_id, Action::StreamChunk(chunk.content.clone()));
        }
        Ok::<_, hyper::Error>(Frame::data(Bytes::from(chunk.content)))
    });

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Cache-Control", "no-cache")
        .body(BodyExt::boxed(StreamBody::new(body_stream)))
        .unwrap())
}
