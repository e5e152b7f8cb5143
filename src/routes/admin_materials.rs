//! Admin material routes: quizzes, quiz groups, videos, resources,
//! articles, and the lesson material mapper

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::{empty_body, json_response, parse_json_body, require_admin, BoxBody};
use crate::logging::{EventType, UsageEvent};
use crate::server::AppState;
use crate::services::catalog::{QuizInput, ResourceInput, VideoInput};
use crate::services::materials;
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

// Quizzes

pub async fn handle_create_quiz(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: QuizInput = parse_json_body(req).await?;
    let quiz = materials::create_quiz(&state.db, input).await?;
    log_admin(&state, claims.sub, "quizzes.create").await;
    Ok(json_response(StatusCode::CREATED, &quiz))
}

pub async fn handle_quiz_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let quizzes = materials::list_quizzes(&state.db).await?;
    Ok(json_response(StatusCode::OK, &quizzes))
}

pub async fn handle_get_quiz(
    req: Request<Incoming>,
    state: Arc<AppState>,
    quiz_id: Uuid,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let quiz = materials::get_quiz(&state.db, quiz_id).await?;
    Ok(json_response(StatusCode::OK, &quiz))
}

pub async fn handle_update_quiz(
    req: Request<Incoming>,
    state: Arc<AppState>,
    quiz_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::UpdateQuizInput = parse_json_body(req).await?;
    let quiz = materials::update_quiz(&state.db, quiz_id, input).await?;
    log_admin(&state, claims.sub, "quizzes.update").await;
    Ok(json_response(StatusCode::OK, &quiz))
}

pub async fn handle_delete_quiz(
    req: Request<Incoming>,
    state: Arc<AppState>,
    quiz_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    materials::delete_quiz(&state.db, quiz_id).await?;
    log_admin(&state, claims.sub, "quizzes.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

// Quiz groups

pub async fn handle_create_quiz_group(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::QuizGroupInput = parse_json_body(req).await?;
    let group = materials::create_quiz_group(&state.db, input).await?;
    log_admin(&state, claims.sub, "quiz_groups.create").await;
    Ok(json_response(StatusCode::CREATED, &group))
}

pub async fn handle_quiz_group_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let groups = materials::list_quiz_groups(&state.db).await?;
    Ok(json_response(StatusCode::OK, &groups))
}

pub async fn handle_update_quiz_group(
    req: Request<Incoming>,
    state: Arc<AppState>,
    group_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::UpdateQuizGroupInput = parse_json_body(req).await?;
    let group = materials::update_quiz_group(&state.db, group_id, input).await?;
    log_admin(&state, claims.sub, "quiz_groups.update").await;
    Ok(json_response(StatusCode::OK, &group))
}

pub async fn handle_delete_quiz_group(
    req: Request<Incoming>,
    state: Arc<AppState>,
    group_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    materials::delete_quiz_group(&state.db, group_id).await?;
    log_admin(&state, claims.sub, "quiz_groups.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

// Videos

pub async fn handle_create_video(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: VideoInput = parse_json_body(req).await?;
    let video = materials::create_video(&state.db, input).await?;
    log_admin(&state, claims.sub, "videos.create").await;
    Ok(json_response(StatusCode::CREATED, &video))
}

pub async fn handle_video_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let videos = materials::list_videos(&state.db).await?;
    Ok(json_response(StatusCode::OK, &videos))
}

pub async fn handle_update_video(
    req: Request<Incoming>,
    state: Arc<AppState>,
    video_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::UpdateVideoInput = parse_json_body(req).await?;
    let video = materials::update_video(&state.db, video_id, input).await?;
    log_admin(&state, claims.sub, "videos.update").await;
    Ok(json_response(StatusCode::OK, &video))
}

pub async fn handle_delete_video(
    req: Request<Incoming>,
    state: Arc<AppState>,
    video_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    materials::delete_video(&state.db, video_id).await?;
    log_admin(&state, claims.sub, "videos.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

// Resources

pub async fn handle_create_resource(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: ResourceInput = parse_json_body(req).await?;
    let resource = materials::create_resource(&state.db, input).await?;
    log_admin(&state, claims.sub, "resources.create").await;
    Ok(json_response(StatusCode::CREATED, &resource))
}

pub async fn handle_resource_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let resources = materials::list_resources(&state.db).await?;
    Ok(json_response(StatusCode::OK, &resources))
}

pub async fn handle_update_resource(
    req: Request<Incoming>,
    state: Arc<AppState>,
    resource_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::UpdateResourceInput = parse_json_body(req).await?;
    let resource = materials::update_resource(&state.db, resource_id, input).await?;
    log_admin(&state, claims.sub, "resources.update").await;
    Ok(json_response(StatusCode::OK, &resource))
}

pub async fn handle_delete_resource(
    req: Request<Incoming>,
    state: Arc<AppState>,
    resource_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    materials::delete_resource(&state.db, resource_id).await?;
    log_admin(&state, claims.sub, "resources.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

// Articles

pub async fn handle_create_article(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::ArticleInput = parse_json_body(req).await?;
    let article = materials::create_article(&state.db, input).await?;
    log_admin(&state, claims.sub, "articles.create").await;
    Ok(json_response(StatusCode::CREATED, &article))
}

pub async fn handle_article_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    require_admin(&state, &req).await?;
    let articles = materials::list_articles(&state.db).await?;
    Ok(json_response(StatusCode::OK, &articles))
}

pub async fn handle_update_article(
    req: Request<Incoming>,
    state: Arc<AppState>,
    article_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::UpdateArticleInput = parse_json_body(req).await?;
    let article = materials::update_article(&state.db, article_id, input).await?;
    log_admin(&state, claims.sub, "articles.update").await;
    Ok(json_response(StatusCode::OK, &article))
}

pub async fn handle_delete_article(
    req: Request<Incoming>,
    state: Arc<AppState>,
    article_id: Uuid,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    materials::delete_article(&state.db, article_id).await?;
    log_admin(&state, claims.sub, "articles.delete").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

// Material mapper

/// POST /admin/mapper/material - link a material to a lesson
pub async fn handle_link_material(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::LinkMaterialInput = parse_json_body(req).await?;
    let mapper = materials::link_material(&state.db, input).await?;
    log_admin(&state, claims.sub, "mapper.link").await;
    Ok(json_response(StatusCode::CREATED, &mapper))
}

/// DELETE /admin/mapper/material - unlink a material from a lesson
pub async fn handle_unlink_material(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = require_admin(&state, &req).await?;
    let input: materials::LinkMaterialInput = parse_json_body(req).await?;
    materials::unlink_material(&state.db, input).await?;
    log_admin(&state, claims.sub, "mapper.unlink").await;
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}
