use serde::Deserialize;

use crate::errors::{AppError, Result};

pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub storage_root: String,
    pub inference_url: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub oauth_userinfo_url: String,
    pub post_login_redirect: String,
    pub static_dir: Option<String>,
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_url", "postgresql://localhost/osteoscan")
            .and_then(|b| b.set_default("host", "0.0.0.0"))
            .and_then(|b| b.set_default("port", 3000))
            .and_then(|b| b.set_default("max_file_size", 20 * 1024 * 1024)) // 20MB
            .and_then(|b| b.set_default("storage_root", "./storage"))
            .and_then(|b| b.set_default("inference_url", "http://localhost:8000"))
            .and_then(|b| b.set_default("session_secret", DEFAULT_SESSION_SECRET))
            .and_then(|b| b.set_default("session_ttl_hours", 24 * 30))
            .and_then(|b| b.set_default("secure_cookies", false))
            .and_then(|b| {
                b.set_default("oauth_authorize_url", "https://accounts.google.com/o/oauth2/v2/auth")
            })
            .and_then(|b| b.set_default("oauth_token_url", "https://oauth2.googleapis.com/token"))
            .and_then(|b| {
                b.set_default("oauth_userinfo_url", "https://openidconnect.googleapis.com/v1/userinfo")
            })
            .and_then(|b| b.set_default("post_login_redirect", "/dashboard"))
            .map_err(|e| AppError::Config(e.to_string()))?
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if config.session_secret == DEFAULT_SESSION_SECRET {
            tracing::warn!("SESSION_SECRET is not set; using the insecure default");
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "MAX_FILE_SIZE",
        "INFERENCE_URL",
        "SESSION_SECRET",
        "SECURE_COOKIES",
        "CORS_ALLOWED_ORIGINS",
        "STATIC_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.max_file_size, 20 * 1024 * 1024);
        assert_eq!(config.inference_url, "http://localhost:8000");
        assert_eq!(config.post_login_redirect, "/dashboard");
        assert!(!config.secure_cookies);
        assert!(config.static_dir.is_none());
        assert!(config.cors_origins().is_empty());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        env::set_var("PORT", "8080");
        env::set_var("INFERENCE_URL", "http://inference:9000");
        env::set_var("SECURE_COOKIES", "true");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.inference_url, "http://inference:9000");
        assert!(config.secure_cookies);
        assert_eq!(
            config.cors_origins(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        clear_env();
        env::set_var("PORT", "not-a-port");
        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
