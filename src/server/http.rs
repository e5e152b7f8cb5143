//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling; routing is a single
//! match over (method, path segments).

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::jwt::JwtValidator;
use crate::auth::oauth::OAuthClient;
use crate::chat::{ChatUpstream, SessionRegistry};
use crate::config::Args;
use crate::logging::UsageLogger;
use crate::routes::{self, error_response, not_found_response, parse_id, BoxBody};
use crate::types::{LyceumError, Result};
use crate::worker::MailQueue;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub db: DatabaseConnection,
    pub jwt: JwtValidator,
    pub oauth: OAuthClient,
    pub mail: MailQueue,
    pub usage: UsageLogger,
    /// Live chat transcripts per workspace
    pub chat_sessions: Arc<SessionRegistry>,
    /// Upstream chat service; chat routes 500 when unconfigured
    pub chat_upstream: Option<ChatUpstream>,
}

impl AppState {
    pub fn new(args: Args, db: DatabaseConnection, mail: MailQueue) -> Result<Self> {
        let jwt = match &args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), args.jwt_expiry_seconds)?,
            None if args.dev_mode => {
                warn!("DEV_MODE: using the fixed development JWT secret");
                JwtValidator::new_dev()
            }
            None => {
                return Err(LyceumError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };

        let oauth = OAuthClient::from_args(&args);
        let usage = UsageLogger::new(args.usage_log_path.as_deref());
        let chat_upstream = args
            .chat_upstream_url
            .as_ref()
            .map(|url| ChatUpstream::new(url.clone(), args.chat_timeout_ms));

        Ok(Self {
            args,
            db,
            jwt,
            oauth,
            mail,
            usage,
            chat_sessions: Arc::new(SessionRegistry::new()),
            chat_upstream,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Lyceum listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    debug!("[{}] {} {}", addr, method, path);

    let mut response = route(state.clone(), req, &method, &path).await;
    apply_cors(&state, origin.as_deref(), &mut response);
    Ok(response)
}

async fn route(
    state: Arc<AppState>,
    req: Request<Incoming>,
    method: &Method,
    path: &str,
) -> Response<BoxBody> {
    // CORS preflight
    if method == Method::OPTIONS {
        return preflight_response();
    }

    // Auth routes consume the request wholesale
    if path.starts_with("/auth") {
        return routes::auth_routes::handle_auth_request(req, state).await;
    }

    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();

    let result: Result<Response<BoxBody>> = match (method, segments.as_slice()) {
        // Probes
        (&Method::GET, ["health"]) | (&Method::GET, ["healthz"]) => {
            Ok(routes::health::health_check(state))
        }
        (&Method::GET, ["ready"]) | (&Method::GET, ["readyz"]) => {
            Ok(routes::health::readiness_check(state).await)
        }
        (&Method::GET, ["version"]) => Ok(routes::health::version_info()),
        (&Method::GET, ["api"]) => Ok(routes::health::api_index(state)),

        // Public catalog
        (&Method::GET, ["courses", "list"]) => {
            routes::catalog::handle_course_list(req, state).await
        }
        (&Method::GET, ["courses", id]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_course_details(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["courses", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_enroll_course(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["courses", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_cancel_enrollment(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["lessons", id, "complete"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_complete_lesson(req, state, id).await,
            Err(e) => Err(e),
        },

        (&Method::GET, ["roadmaps", "list"]) => {
            routes::catalog::handle_roadmap_list(req, state).await
        }
        (&Method::GET, ["roadmaps", id]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_roadmap_details(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["roadmaps", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_enroll_roadmap(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["roadmaps", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_cancel_roadmap_enrollment(req, state, id).await,
            Err(e) => Err(e),
        },

        (&Method::GET, ["career-paths", "list"]) => {
            routes::catalog::handle_career_path_list(req, state).await
        }
        (&Method::GET, ["career-paths", id]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_career_path_details(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["career-paths", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_enroll_career_path(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["career-paths", id, "enroll"]) => match parse_id(id) {
            Ok(id) => routes::catalog::handle_cancel_career_enrollment(req, state, id).await,
            Err(e) => Err(e),
        },

        // Profile
        (&Method::GET, ["users", "profile"]) => {
            routes::users::handle_get_profile(req, state).await
        }
        (&Method::PATCH, ["users", "profile"]) => {
            routes::users::handle_update_profile(req, state).await
        }
        (&Method::GET, ["users", "enrollments"]) => {
            routes::users::handle_my_enrollments(req, state).await
        }

        // Workspaces and chat
        (&Method::POST, ["workspaces"]) => {
            routes::workspaces::handle_create_workspace(req, state).await
        }
        (&Method::GET, ["workspaces"]) => {
            routes::workspaces::handle_recent_workspaces(req, state).await
        }
        (&Method::GET, ["workspaces", id]) => match parse_id(id) {
            Ok(id) => routes::workspaces::handle_get_workspace(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::PATCH, ["workspaces", id]) => match parse_id(id) {
            Ok(id) => routes::workspaces::handle_update_workspace(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["workspaces", id]) => match parse_id(id) {
            Ok(id) => routes::workspaces::handle_delete_workspace(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::GET, ["workspaces", id, "chat"]) => match parse_id(id) {
            Ok(id) => routes::workspaces::handle_chat_transcript(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["workspaces", id, "chat"]) => match parse_id(id) {
            Ok(id) => routes::workspaces::handle_chat_stream(req, state, id).await,
            Err(e) => Err(e),
        },

        // Admin: courses
        (&Method::POST, ["admin", "courses"]) => {
            routes::admin_catalog::handle_create_course(req, state).await
        }
        (&Method::GET, ["admin", "courses"]) => {
            routes::admin_catalog::handle_admin_course_list(req, state).await
        }
        (&Method::PATCH, ["admin", "courses", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_update_course(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "courses", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_delete_course(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "courses", course_id, "modules", module_id]) => {
            match (parse_id(course_id), parse_id(module_id)) {
                (Ok(c), Ok(m)) => {
                    routes::admin_catalog::handle_link_module(req, state, c, m).await
                }
                (Err(e), _) | (_, Err(e)) => Err(e),
            }
        }

        // Admin: modules and lessons
        (&Method::POST, ["admin", "modules"]) => {
            routes::admin_catalog::handle_create_module(req, state).await
        }
        (&Method::GET, ["admin", "modules"]) => {
            routes::admin_catalog::handle_module_list(req, state).await
        }
        (&Method::GET, ["admin", "modules", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_module_details(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "modules", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_delete_module(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "lessons"]) => {
            routes::admin_catalog::handle_create_lesson(req, state).await
        }
        (&Method::GET, ["admin", "lessons"]) => {
            routes::admin_catalog::handle_lesson_list(req, state).await
        }
        (&Method::GET, ["admin", "lessons", id, "materials"]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_lesson_materials(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "lessons", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_delete_lesson(req, state, id).await,
            Err(e) => Err(e),
        },

        // Admin: materials
        (&Method::POST, ["admin", "quizzes"]) => {
            routes::admin_materials::handle_create_quiz(req, state).await
        }
        (&Method::GET, ["admin", "quizzes"]) => {
            routes::admin_materials::handle_quiz_list(req, state).await
        }
        (&Method::GET, ["admin", "quizzes", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_get_quiz(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::PATCH, ["admin", "quizzes", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_update_quiz(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "quizzes", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_delete_quiz(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "quiz-groups"]) => {
            routes::admin_materials::handle_create_quiz_group(req, state).await
        }
        (&Method::GET, ["admin", "quiz-groups"]) => {
            routes::admin_materials::handle_quiz_group_list(req, state).await
        }
        (&Method::PATCH, ["admin", "quiz-groups", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_update_quiz_group(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "quiz-groups", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_delete_quiz_group(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "videos"]) => {
            routes::admin_materials::handle_create_video(req, state).await
        }
        (&Method::GET, ["admin", "videos"]) => {
            routes::admin_materials::handle_video_list(req, state).await
        }
        (&Method::PATCH, ["admin", "videos", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_update_video(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "videos", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_delete_video(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "resources"]) => {
            routes::admin_materials::handle_create_resource(req, state).await
        }
        (&Method::GET, ["admin", "resources"]) => {
            routes::admin_materials::handle_resource_list(req, state).await
        }
        (&Method::PATCH, ["admin", "resources", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_update_resource(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "resources", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_delete_resource(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "articles"]) => {
            routes::admin_materials::handle_create_article(req, state).await
        }
        (&Method::GET, ["admin", "articles"]) => {
            routes::admin_materials::handle_article_list(req, state).await
        }
        (&Method::PATCH, ["admin", "articles", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_update_article(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::DELETE, ["admin", "articles", id]) => match parse_id(id) {
            Ok(id) => routes::admin_materials::handle_delete_article(req, state, id).await,
            Err(e) => Err(e),
        },

        // Admin: material mapper
        (&Method::POST, ["admin", "mapper", "material"]) => {
            routes::admin_materials::handle_link_material(req, state).await
        }
        (&Method::DELETE, ["admin", "mapper", "material"]) => {
            routes::admin_materials::handle_unlink_material(req, state).await
        }

        // Admin: roadmaps and career paths
        (&Method::POST, ["admin", "roadmaps"]) => {
            routes::admin_catalog::handle_create_roadmap(req, state).await
        }
        (&Method::GET, ["admin", "roadmaps"]) => {
            routes::admin_catalog::handle_admin_roadmap_list(req, state).await
        }
        (&Method::DELETE, ["admin", "roadmaps", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_delete_roadmap(req, state, id).await,
            Err(e) => Err(e),
        },
        (&Method::POST, ["admin", "career-paths"]) => {
            routes::admin_catalog::handle_create_career_path(req, state).await
        }
        (&Method::GET, ["admin", "career-paths"]) => {
            routes::admin_catalog::handle_admin_career_path_list(req, state).await
        }
        (&Method::DELETE, ["admin", "career-paths", id]) => match parse_id(id) {
            Ok(id) => routes::admin_catalog::handle_delete_career_path(req, state, id).await,
            Err(e) => Err(e),
        },

        _ => return not_found_response(path),
    };

    result.unwrap_or_else(error_response)
}

fn preflight_response() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(routes::empty_body())
        .unwrap()
}

/// Echo the Origin header back when it is on the allow list
fn apply_cors(state: &Arc<AppState>, origin: Option<&str>, response: &mut Response<BoxBody>) {
    let Some(origin) = origin else { return };
    if !state.args.allowed_origins().iter().any(|o| o == origin) {
        return;
    }
    if let Ok(value) = origin.parse() {
        response
            .headers_mut()
            .insert("Access-Control-Allow-Origin", value);
        response
            .headers_mut()
            .insert("Vary", hyper::header::HeaderValue::from_static("Origin"));
    }
}
