//! Authentication routes
//!
//! Local register/login with JWT access tokens and stored refresh tokens,
//! one-time email verification codes, and GitHub/Google OAuth redirects.

use chrono::{Duration, Utc};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::{
    empty_body, error_response, json_response, parse_json_body, require_auth, BoxBody,
};
use crate::auth::jwt::TokenInput;
use crate::auth::oauth::Provider;
use crate::auth::otp;
use crate::db::entities::otp_code::Purpose;
use crate::db::entities::{refresh_token, user};
use crate::logging::{EventType, UsageEvent};
use crate::server::AppState;
use crate::services::users as user_service;
use crate::types::{LyceumError, Result};
use crate::worker::EmailJob;

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    refresh_token: String,
    user: user::Model,
}

/// Entry point for everything under /auth
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = match (method, path.as_str()) {
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        (Method::POST, "/auth/refresh") => handle_refresh(req, state).await,
        (Method::POST, "/auth/logout") => handle_logout(req, state).await,
        (Method::POST, "/auth/otp/request") => handle_otp_request(req, state).await,
        (Method::POST, "/auth/otp/verify") => handle_otp_verify(req, state).await,
        (Method::GET, "/auth/github") => handle_oauth_redirect(state, Provider::GitHub),
        (Method::GET, "/auth/google") => handle_oauth_redirect(state, Provider::Google),
        (Method::GET, "/auth/github/callback") => {
            handle_oauth_callback(req, state, Provider::GitHub).await
        }
        (Method::GET, "/auth/google/callback") => {
            handle_oauth_callback(req, state, Provider::Google).await
        }
        _ => Err(LyceumError::NotFound(format!("No route for {}", path))),
    };

    result.unwrap_or_else(error_response)
}

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue access + refresh tokens for an account
async fn issue_tokens(state: &Arc<AppState>, account: user::Model) -> Result<AuthResponse> {
    let token = state.jwt.generate_token(TokenInput {
        user_id: account.id,
        email: account.email.clone(),
        role: account.role,
        version: account.token_version,
    })?;

    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let now = Utc::now();
    refresh_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        token_hash: Set(hash_refresh_token(&plaintext)),
        expires_at: Set(now + Duration::days(state.args.refresh_token_days)),
        revoked_at: Set(None),
        created_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok(AuthResponse {
        token,
        refresh_token: plaintext,
        user: account,
    })
}

async fn handle_register(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let input: user_service::RegisterInput = parse_json_body(req).await?;
    let account = user_service::register(&state.db, input).await?;

    state
        .usage
        .log(
            UsageEvent::new(EventType::Registered, state.args.node_id).with_user(account.id),
        )
        .await;

    // Queue the verification mail; registration succeeds even if the
    // queue is saturated, the client can re-request a code
    match otp::issue_code(
        &state.db,
        account.id,
        Purpose::VerifyEmail,
        state.args.otp_ttl_seconds,
    )
    .await
    {
        Ok(code) => {
            if let Err(e) = state.mail.enqueue(EmailJob {
                to: account.email.clone(),
                subject: "Verify your Lyceum account".into(),
                body: format!("Your verification code is {}", code),
            }) {
                warn!("Failed to queue verification mail: {}", e);
            }
        }
        Err(e) => warn!("Failed to issue verification code: {}", e),
    }

    let response = issue_tokens(&state, account).await?;
    Ok(json_response(StatusCode::CREATED, &response))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let input: LoginRequest = parse_json_body(req).await?;

    let account = match user_service::authenticate(&state.db, &input.email, &input.password).await
    {
        Ok(account) => account,
        Err(e) => {
            state
                .usage
                .log(UsageEvent::new(EventType::AuthAttempt, state.args.node_id).failed())
                .await;
            return Err(e);
        }
    };

    state
        .usage
        .log(UsageEvent::new(EventType::AuthAttempt, state.args.node_id).with_user(account.id))
        .await;

    let response = issue_tokens(&state, account).await?;
    Ok(json_response(StatusCode::OK, &response))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

async fn handle_refresh(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let input: RefreshRequest = parse_json_body(req).await?;
    let hash = hash_refresh_token(&input.refresh_token);

    let row = refresh_token::Entity::find()
        .filter(refresh_token::Column::TokenHash.eq(hash))
        .one(&state.db)
        .await?
        .ok_or_else(|| LyceumError::Unauthorized("Unknown refresh token".into()))?;

    if row.revoked_at.is_some() {
        return Err(LyceumError::Unauthorized("Refresh token revoked".into()));
    }
    if row.expires_at <= Utc::now() {
        return Err(LyceumError::Unauthorized("Refresh token expired".into()));
    }

    let account = user_service::find_by_id(&state.db, row.user_id)
        .await
        .map_err(|_| LyceumError::Unauthorized("Unknown account".into()))?;
    if !account.is_active {
        return Err(LyceumError::Forbidden("Account is disabled".into()));
    }

    let token = state.jwt.generate_token(TokenInput {
        user_id: account.id,
        email: account.email.clone(),
        role: account.role,
        version: account.token_version,
    })?;

    state
        .usage
        .log(UsageEvent::new(EventType::AuthAttempt, state.args.node_id).with_user(account.id))
        .await;

    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "token": token }),
    ))
}

async fn handle_logout(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let claims = require_auth(&state, &req).await?;

    // Revoke every outstanding refresh token for the account
    refresh_token::Entity::update_many()
        .col_expr(
            refresh_token::Column::RevokedAt,
            sea_orm::sea_query::Expr::value(Some(Utc::now())),
        )
        .filter(refresh_token::Column::UserId.eq(claims.sub))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .exec(&state.db)
        .await?;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty_body())
        .unwrap())
}

#[derive(Debug, Deserialize)]
struct OtpRequestBody {
    email: String,
}

async fn handle_otp_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let input: OtpRequestBody = parse_json_body(req).await?;

    // The response never reveals whether the address exists
    if let Some(account) = user_service::find_by_email(&state.db, &input.email).await? {
        let code = otp::issue_code(
            &state.db,
            account.id,
            Purpose::VerifyEmail,
            state.args.otp_ttl_seconds,
        )
        .await?;
        if let Err(e) = state.mail.enqueue(EmailJob {
            to: account.email,
            subject: "Your Lyceum verification code".into(),
            body: format!("Your verification code is {}", code),
        }) {
            warn!("Failed to queue verification mail: {}", e);
        }
    }

    Ok(json_response(
        StatusCode::ACCEPTED,
        &serde_json::json!({ "status": "sent" }),
    ))
}

#[derive(Debug, Deserialize)]
struct OtpVerifyBody {
    email: String,
    code: String,
}

async fn handle_otp_verify(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let input: OtpVerifyBody = parse_json_body(req).await?;

    let account = user_service::find_by_email(&state.db, &input.email)
        .await?
        .ok_or_else(|| LyceumError::Unauthorized("Invalid or expired verification code".into()))?;

    otp::verify_code(&state.db, account.id, Purpose::VerifyEmail, &input.code).await?;
    user_service::mark_verified(&state.db, account.id).await?;

    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "verified" }),
    ))
}

fn handle_oauth_redirect(state: Arc<AppState>, provider: Provider) -> Result<Response<BoxBody>> {
    if !state.oauth.provider_enabled(provider) {
        return Err(LyceumError::Config(format!(
            "{} OAuth is not configured",
            provider.as_str()
        )));
    }
    let url = state.oauth.authorize_url(provider)?;
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", url)
        .body(empty_body())
        .unwrap())
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: String,
    state: String,
}

async fn handle_oauth_callback(
    req: Request<Incoming>,
    state: Arc<AppState>,
    provider: Provider,
) -> Result<Response<BoxBody>> {
    let query = req.uri().query().unwrap_or("");
    let params: CallbackQuery = serde_urlencoded::from_str(query)
        .map_err(|_| LyceumError::BadRequest("Missing code or state".into()))?;

    let profile = state
        .oauth
        .complete(provider, &params.code, &params.state)
        .await?;

    let account = user_service::oauth_login(&state.db, &profile.email, &profile.name).await?;
    state
        .usage
        .log(UsageEvent::new(EventType::AuthAttempt, state.args.node_id).with_user(account.id))
        .await;

    let tokens = issue_tokens(&state, account).await?;

    // Hand the tokens to the frontend via the URL fragment so they never
    // hit server logs on the frontend side
    let location = format!(
        "{}/oauth/callback#token={}&refresh_token={}",
        state.args.frontend_url.trim_end_matches('/'),
        urlencoding::encode(&tokens.token),
        urlencoding::encode(&tokens.refresh_token),
    );
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", location)
        .body(empty_body())
        .unwrap())
}
