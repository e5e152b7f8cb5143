//! OAuth login flows for GitHub and Google
//!
//! The redirect carries a one-time `state` nonce held in memory; callbacks
//! must present it back within a short window. The code exchange and profile
//! fetch go through reqwest against provider endpoints that are overridable
//! for tests.

use dashmap::DashMap;
use serde::Deserialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Args;
use crate::types::{LyceumError, Result};

/// How long a pending authorize state stays valid
const STATE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }
}

/// Profile returned by a successful callback
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
struct ProviderConfig {
    client_id: String,
    client_secret: String,
}

struct PendingState {
    provider: Provider,
    created: Instant,
}

/// OAuth client holding provider credentials and pending states
pub struct OAuthClient {
    http: reqwest::Client,
    github: Option<ProviderConfig>,
    google: Option<ProviderConfig>,
    public_url: String,
    states: DashMap<String, PendingState>,
    github_auth_base: String,
    github_api_base: String,
    google_auth_base: String,
    google_api_base: String,
}

impl OAuthClient {
    pub fn from_args(args: &Args) -> Self {
        let github = match (&args.github_client_id, &args.github_client_secret) {
            (Some(id), Some(secret)) => Some(ProviderConfig {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };
        let google = match (&args.google_client_id, &args.google_client_secret) {
            (Some(id), Some(secret)) => Some(ProviderConfig {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };

        Self {
            http: reqwest::Client::new(),
            github,
            google,
            public_url: args.public_url.trim_end_matches('/').to_string(),
            states: DashMap::new(),
            github_auth_base: "https://github.com".into(),
            github_api_base: "https://api.github.com".into(),
            google_auth_base: "https://accounts.google.com".into(),
            google_api_base: "https://www.googleapis.com".into(),
        }
    }

    /// Point provider endpoints at a test server
    #[cfg(test)]
    pub fn with_bases(mut self, auth_base: &str, api_base: &str) -> Self {
        self.github_auth_base = auth_base.to_string();
        self.github_api_base = api_base.to_string();
        self.google_auth_base = auth_base.to_string();
        self.google_api_base = api_base.to_string();
        self
    }

    pub fn provider_enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::GitHub => self.github.is_some(),
            Provider::Google => self.google.is_some(),
        }
    }

    fn config_for(&self, provider: Provider) -> Result<&ProviderConfig> {
        let cfg = match provider {
            Provider::GitHub => self.github.as_ref(),
            Provider::Google => self.google.as_ref(),
        };
        cfg.ok_or_else(|| {
            LyceumError::Config(format!("{} OAuth is not configured", provider.as_str()))
        })
    }

    fn callback_url(&self, provider: Provider) -> String {
        format!("{}/auth/{}/callback", self.public_url, provider.as_str())
    }

    /// Build the provider authorize redirect URL and remember its state nonce
    pub fn authorize_url(&self, provider: Provider) -> Result<String> {
        let cfg = self.config_for(provider)?;
        let state = Uuid::new_v4().to_string();
        self.states.insert(
            state.clone(),
            PendingState {
                provider,
                created: Instant::now(),
            },
        );

        let redirect = self.callback_url(provider);
        let url = match provider {
            Provider::GitHub => format!(
                "{}/login/oauth/authorize?client_id={}&redirect_uri={}&scope={}&state={}",
                self.github_auth_base,
                urlencoding::encode(&cfg.client_id),
                urlencoding::encode(&redirect),
                urlencoding::encode("read:user user:email"),
                state,
            ),
            Provider::Google => format!(
                "{}/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
                self.google_auth_base,
                urlencoding::encode(&cfg.client_id),
                urlencoding::encode(&redirect),
                urlencoding::encode("openid email profile"),
                state,
            ),
        };
        Ok(url)
    }

    /// Take and validate a state nonce returned by the provider
    fn consume_state(&self, provider: Provider, state: &str) -> Result<()> {
        let (_, pending) = self
            .states
            .remove(state)
            .ok_or_else(|| LyceumError::Unauthorized("Unknown OAuth state".into()))?;

        if pending.provider != provider {
            return Err(LyceumError::Unauthorized("OAuth state mismatch".into()));
        }
        if pending.created.elapsed() > STATE_TTL {
            return Err(LyceumError::Unauthorized("OAuth state expired".into()));
        }
        Ok(())
    }

    /// Complete the flow: validate state, exchange the code, fetch the profile
    pub async fn complete(
        &self,
        provider: Provider,
        code: &str,
        state: &str,
    ) -> Result<OAuthProfile> {
        self.consume_state(provider, state)?;
        match provider {
            Provider::GitHub => self.complete_github(code).await,
            Provider::Google => self.complete_google(code).await,
        }
    }

    async fn complete_github(&self, code: &str) -> Result<OAuthProfile> {
        let cfg = self.config_for(Provider::GitHub)?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: Option<String>,
        }

        let token: TokenResponse = self
            .http
            .post(format!("{}/login/oauth/access_token", self.github_auth_base))
            .header("Accept", "application/json")
            .form(&[
                ("client_id", cfg.client_id.as_str()),
                ("client_secret", cfg.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?
            .json()
            .await?;

        let access_token = token
            .access_token
            .ok_or_else(|| LyceumError::Unauthorized("GitHub rejected the OAuth code".into()))?;

        #[derive(Deserialize)]
        struct GithubUser {
            login: String,
            name: Option<String>,
            email: Option<String>,
        }

        let user: GithubUser = self
            .http
            .get(format!("{}/user", self.github_api_base))
            .header("Authorization", format!("Bearer {}", access_token))
            .header("User-Agent", "lyceum")
            .send()
            .await?
            .json()
            .await?;

        // The profile email can be private; fall back to the emails endpoint
        let email = match user.email {
            Some(e) if !e.is_empty() => e,
            _ => {
                #[derive(Deserialize)]
                struct GithubEmail {
                    email: String,
                    primary: bool,
                    verified: bool,
                }
                let emails: Vec<GithubEmail> = self
                    .http
                    .get(format!("{}/user/emails", self.github_api_base))
                    .header("Authorization", format!("Bearer {}", access_token))
                    .header("User-Agent", "lyceum")
                    .send()
                    .await?
                    .json()
                    .await?;
                emails
                    .into_iter()
                    .find(|e| e.primary && e.verified)
                    .map(|e| e.email)
                    .ok_or_else(|| {
                        LyceumError::Unauthorized("GitHub account has no verified email".into())
                    })?
            }
        };

        Ok(OAuthProfile {
            name: user.name.unwrap_or(user.login),
            email,
        })
    }

    async fn complete_google(&self, code: &str) -> Result<OAuthProfile> {
        let cfg = self.config_for(Provider::Google)?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: Option<String>,
        }

        let redirect = self.callback_url(Provider::Google);
        let token: TokenResponse = self
            .http
            .post(format!("{}/o/oauth2/token", self.google_auth_base))
            .form(&[
                ("client_id", cfg.client_id.as_str()),
                ("client_secret", cfg.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let access_token = token
            .access_token
            .ok_or_else(|| LyceumError::Unauthorized("Google rejected the OAuth code".into()))?;

        #[derive(Deserialize)]
        struct GoogleUser {
            email: Option<String>,
            name: Option<String>,
        }

        let user: GoogleUser = self
            .http
            .get(format!("{}/oauth2/v2/userinfo", self.google_api_base))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?
            .json()
            .await?;

        let email = user
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| LyceumError::Unauthorized("Google account has no email".into()))?;

        Ok(OAuthProfile {
            name: user.name.unwrap_or_else(|| email.clone()),
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args_with_github() -> Args {
        Args::parse_from([
            "lyceum",
            "--github-client-id",
            "cid",
            "--github-client-secret",
            "csecret",
        ])
    }

    #[test]
    fn test_authorize_url_contains_state() {
        let client = OAuthClient::from_args(&args_with_github());
        let url = client.authorize_url(Provider::GitHub).unwrap();
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("state="));
        assert!(url.starts_with("https://github.com/login/oauth/authorize"));
    }

    #[test]
    fn test_unknown_state_rejected() {
        let client = OAuthClient::from_args(&args_with_github());
        assert!(client
            .consume_state(Provider::GitHub, "never-issued")
            .is_err());
    }

    #[test]
    fn test_state_single_use() {
        let client = OAuthClient::from_args(&args_with_github());
        let url = client.authorize_url(Provider::GitHub).unwrap();
        let state = url.rsplit("state=").next().unwrap().to_string();
        assert!(client.consume_state(Provider::GitHub, &state).is_ok());
        assert!(client.consume_state(Provider::GitHub, &state).is_err());
    }

    #[tokio::test]
    async fn test_github_exchange_against_mock() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "access_token": "gho_test",
                    "token_type": "bearer"
                })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "login": "octocat",
                "name": "The Octocat",
                "email": "octocat@example.com"
            })))
            .mount(&server)
            .await;

        let client =
            OAuthClient::from_args(&args_with_github()).with_bases(&server.uri(), &server.uri());
        let url = client.authorize_url(Provider::GitHub).unwrap();
        let state = url.rsplit("state=").next().unwrap().to_string();

        let profile = client
            .complete(Provider::GitHub, "the-code", &state)
            .await
            .unwrap();
        assert_eq!(profile.email, "octocat@example.com");
        assert_eq!(profile.name, "The Octocat");
    }
}
