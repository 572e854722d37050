use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::Config;
use crate::errors::{AppError, Result};

pub const STATE_COOKIE: &str = "oauth_state";

const AUTH_FAILED: &str = "Authentication failed";

/// Provider details stay in the log; the client only sees `AUTH_FAILED`.
fn provider_failure(step: &str, detail: impl std::fmt::Display) -> AppError {
    tracing::warn!(step, error = %detail, "OAuth provider call failed");
    AppError::Auth(AUTH_FAILED.to_string())
}

/// Profile returned by the identity provider after a code exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityClaims {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start sign-in; `state` is echoed back
    /// on the callback.
    fn authorization_url(&self, state: &str) -> Result<String>;

    async fn exchange_code(&self, code: &str) -> Result<IdentityClaims>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

struct GoogleCredentials {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

/// Authorization-code flow against Google (or any endpoint set with the same
/// token/userinfo shape).
pub struct GoogleOAuth {
    client: Client,
    credentials: Option<GoogleCredentials>,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn from_config(config: &Config) -> Self {
        let credentials = match (
            &config.google_client_id,
            &config.google_client_secret,
            &config.google_redirect_uri,
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(GoogleCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                redirect_uri: redirect_uri.clone(),
            }),
            _ => {
                tracing::warn!("Google OAuth credentials are not configured; sign-in is disabled");
                None
            }
        };

        Self {
            client: Client::new(),
            credentials,
            authorize_url: config.oauth_authorize_url.clone(),
            token_url: config.oauth_token_url.clone(),
            userinfo_url: config.oauth_userinfo_url.clone(),
        }
    }

    fn credentials(&self) -> Result<&GoogleCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| AppError::Config("Google OAuth is not configured".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorization_url(&self, state: &str) -> Result<String> {
        let credentials = self.credentials()?;

        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Config(format!("Invalid OAuth authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<IdentityClaims> {
        let credentials = self.credentials()?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| provider_failure("token request", e))?;

        if !response.status().is_success() {
            return Err(provider_failure("token status", response.status()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| provider_failure("token body", e))?;

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| provider_failure("userinfo request", e))?;

        if !response.status().is_success() {
            return Err(provider_failure("userinfo status", response.status()));
        }

        response
            .json::<IdentityClaims>()
            .await
            .map_err(|e| provider_failure("userinfo body", e))
    }
}

/// Random value for the OAuth `state` round trip.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> Config {
        Config {
            database_url: "postgresql://localhost/unused".into(),
            host: "127.0.0.1".into(),
            port: 0,
            max_file_size: 1024,
            storage_root: "./storage".into(),
            inference_url: "http://localhost:8000".into(),
            session_secret: "secret".into(),
            session_ttl_hours: 1,
            secure_cookies: false,
            google_client_id: Some("client-123".into()),
            google_client_secret: Some("shh".into()),
            google_redirect_uri: Some("http://localhost:3000/api/auth/callback/google".into()),
            oauth_authorize_url: format!("{}/authorize", base),
            oauth_token_url: format!("{}/token", base),
            oauth_userinfo_url: format!("{}/userinfo", base),
            post_login_redirect: "/dashboard".into(),
            static_dir: None,
            cors_allowed_origins: None,
        }
    }

    #[test]
    fn test_authorization_url() {
        let provider = GoogleOAuth::from_config(&config("https://accounts.example"));
        let url = Url::parse(&provider.authorization_url("abc123").unwrap()).unwrap();

        assert_eq!(url.path(), "/authorize");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "abc123");
        assert_eq!(params["response_type"], "code");
        assert!(params["scope"].contains("email"));
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = config("https://accounts.example");
        config.google_client_secret = None;
        let provider = GoogleOAuth::from_config(&config);

        assert!(matches!(provider.authorization_url("s"), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "1093",
                "email": "Ada@Example.com",
                "name": "Ada Lovelace",
                "picture": "https://example.com/ada.png"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GoogleOAuth::from_config(&config(&mock_server.uri()));
        let claims = provider.exchange_code("auth-code").await.unwrap();

        assert_eq!(claims.email.as_deref(), Some("Ada@Example.com"));
        assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(claims.picture.as_deref(), Some("https://example.com/ada.png"));
    }

    #[tokio::test]
    async fn test_rejected_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&mock_server)
            .await;

        let provider = GoogleOAuth::from_config(&config(&mock_server.uri()));
        let result = provider.exchange_code("stale").await;

        assert!(matches!(result, Err(AppError::Auth(ref msg)) if msg == AUTH_FAILED));
    }

    #[tokio::test]
    async fn test_unreachable_provider_hides_transport_detail() {
        let provider = GoogleOAuth::from_config(&config("http://127.0.0.1:9"));

        match provider.exchange_code("auth-code").await {
            Err(AppError::Auth(msg)) => assert_eq!(msg, AUTH_FAILED),
            other => panic!("expected auth error, got {:?}", other.map(|c| c.email)),
        }
    }

    #[tokio::test]
    async fn test_malformed_userinfo_hides_decode_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let provider = GoogleOAuth::from_config(&config(&mock_server.uri()));
        let result = provider.exchange_code("auth-code").await;

        assert!(matches!(result, Err(AppError::Auth(ref msg)) if msg == AUTH_FAILED));
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, generate_state());
    }
}
