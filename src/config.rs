//! Configuration for Lyceum
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Lyceum - e-learning platform backend
#[derive(Parser, Debug, Clone)]
#[command(name = "lyceum")]
#[command(about = "E-learning platform backend: catalog, enrollments, auth and study workspaces")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Database connection URL (PostgreSQL)
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost:5432/lyceum")]
    pub database_url: String,

    /// Enable development mode (relaxed auth secrets, mail to log)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT access token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Refresh token lifetime in days
    #[arg(long, env = "REFRESH_TOKEN_DAYS", default_value = "30")]
    pub refresh_token_days: i64,

    /// Frontend base URL, used for CORS and OAuth redirects
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// Public base URL of this backend, used to build OAuth callback URLs
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:8080")]
    pub public_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// One-time verification code lifetime in seconds
    #[arg(long, env = "OTP_TTL_SECONDS", default_value = "600")]
    pub otp_ttl_seconds: i64,

    /// Number of mail queue worker tasks
    #[arg(long, env = "MAIL_WORKER_COUNT", default_value = "2")]
    pub mail_worker_count: usize,

    /// HTTP mail relay endpoint; when unset, mail is written to the log
    #[arg(long, env = "MAIL_API_URL")]
    pub mail_api_url: Option<String>,

    /// API key for the mail relay
    #[arg(long, env = "MAIL_API_KEY")]
    pub mail_api_key: Option<String>,

    /// Sender address for outgoing mail
    #[arg(long, env = "MAIL_FROM", default_value = "no-reply@lyceum.local")]
    pub mail_from: String,

    /// GitHub OAuth application client id
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    pub github_client_id: Option<String>,

    /// GitHub OAuth application client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET")]
    pub github_client_secret: Option<String>,

    /// Google OAuth application client id
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Google OAuth application client secret
    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    pub google_client_secret: Option<String>,

    /// Upstream chat service URL (opaque streaming text endpoint)
    #[arg(long, env = "CHAT_UPSTREAM_URL")]
    pub chat_upstream_url: Option<String>,

    /// Chat upstream request timeout in milliseconds
    #[arg(long, env = "CHAT_TIMEOUT_MS", default_value = "60000")]
    pub chat_timeout_ms: u64,

    /// Path for the JSONL usage event log; disabled when unset
    #[arg(long, env = "USAGE_LOG_PATH")]
    pub usage_log_path: Option<String>,
}

impl Args {
    /// Validate configuration, called once at startup
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match &self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".into()),
                Some(s) if s.len() < 32 => {
                    return Err("JWT_SECRET must be at least 32 characters".into())
                }
                Some(_) => {}
            }
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be positive".into());
        }

        if self.otp_ttl_seconds <= 0 {
            return Err("OTP_TTL_SECONDS must be positive".into());
        }

        if self.mail_worker_count == 0 {
            return Err("MAIL_WORKER_COUNT must be at least 1".into());
        }

        // OAuth providers need both halves of the credential pair
        if self.github_client_id.is_some() != self.github_client_secret.is_some() {
            return Err("GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET must be set together".into());
        }
        if self.google_client_id.is_some() != self.google_client_secret.is_some() {
            return Err("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".into());
        }

        Ok(())
    }

    /// Origins allowed by CORS: fixed local dev origins plus the frontend URL
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ];
        if !origins.contains(&self.frontend_url) {
            origins.push(self.frontend_url.clone());
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        let mut args = Args::parse_from(["lyceum"]);
        args.dev_mode = true;
        args
    }

    #[test]
    fn test_dev_mode_allows_missing_secret() {
        let args = base_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let mut args = base_args();
        args.dev_mode = false;
        args.jwt_secret = None;
        assert!(args.validate().is_err());

        args.jwt_secret = Some("short".into());
        assert!(args.validate().is_err());

        args.jwt_secret = Some("a-sufficiently-long-secret-value-1234567".into());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_oauth_pair_validation() {
        let mut args = base_args();
        args.github_client_id = Some("id".into());
        assert!(args.validate().is_err());
        args.github_client_secret = Some("secret".into());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_allowed_origins_includes_frontend() {
        let mut args = base_args();
        args.frontend_url = "https://app.lyceum.example".into();
        let origins = args.allowed_origins();
        assert!(origins.contains(&"https://app.lyceum.example".to_string()));
        // No duplicate when frontend is one of the dev origins
        args.frontend_url = "http://localhost:5173".into();
        let origins = args.allowed_origins();
        assert_eq!(
            origins.iter().filter(|o| *o == "http://localhost:5173").count(),
            1
        );
    }
}
