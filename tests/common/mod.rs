#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::Utc;
use sqlx::types::Json;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

use osteoscan_server::{
    auth::{IdentityClaims, IdentityProvider, SessionService},
    config::Config,
    create_app,
    database::{Database, ReportRepository, ScanRepository, UserRepository},
    errors::{AppError, Result},
    handlers::AppState,
    models::{NewReport, NewScan, NewUser, Report, Scan, User},
    services::{InferenceClient, MetricsService},
    storage::LocalStorage,
};

pub const MAX_FILE_SIZE: usize = 4 * 1024;

#[derive(Default)]
pub struct InMemoryUsers {
    pub rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|u| u.email == user.email) {
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn touch(&self, id: Uuid) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound("User not found"))?;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryScans {
    pub rows: Mutex<Vec<Scan>>,
}

#[async_trait]
impl ScanRepository for InMemoryScans {
    async fn create(&self, scan: &NewScan) -> Result<Scan> {
        let created = Scan {
            id: scan.id,
            user_id: scan.user_id,
            file_name: scan.file_name.clone(),
            file_path: scan.file_path.clone(),
            original_name: scan.original_name.clone(),
            mime_type: scan.mime_type.clone(),
            size: scan.size,
            uploaded_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Scan>> {
        Ok(self.rows.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scan>> {
        let mut scans: Vec<Scan> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scans.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(scans)
    }
}

#[derive(Default)]
pub struct InMemoryReports {
    pub rows: Mutex<Vec<Report>>,
}

#[async_trait]
impl ReportRepository for InMemoryReports {
    async fn create(&self, report: &NewReport) -> Result<Report> {
        let created = Report {
            id: report.id,
            scan_id: report.scan_id,
            user_id: report.user_id,
            predicted_class: report.predicted_class.clone(),
            confidence: report.confidence,
            class_probabilities: report.class_probabilities.clone().map(Json),
            external_report_id: report.external_report_id.clone(),
            report_path: report.report_path(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}

/// Identity provider that accepts the code `good-code` and answers with
/// a fixed profile.
pub struct FakeIdentity {
    pub email: String,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self, state: &str) -> Result<String> {
        Ok(format!("https://accounts.test/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<IdentityClaims> {
        if code != "good-code" {
            return Err(AppError::Auth("invalid_grant".to_string()));
        }
        Ok(IdentityClaims {
            email: Some(self.email.clone()),
            name: Some("Test Patient".to_string()),
            picture: None,
        })
    }
}

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUsers>,
    pub scans: Arc<InMemoryScans>,
    pub reports: Arc<InMemoryReports>,
    pub inference: MockServer,
    pub storage_dir: TempDir,
}

pub fn test_config(storage_root: &str, inference_url: &str) -> Config {
    Config {
        database_url: "postgresql://osteoscan@127.0.0.1:1/osteoscan_test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        max_file_size: MAX_FILE_SIZE,
        storage_root: storage_root.into(),
        inference_url: inference_url.into(),
        session_secret: "integration-secret".into(),
        session_ttl_hours: 1,
        secure_cookies: false,
        google_client_id: None,
        google_client_secret: None,
        google_redirect_uri: None,
        oauth_authorize_url: "https://accounts.test/authorize".into(),
        oauth_token_url: "https://accounts.test/token".into(),
        oauth_userinfo_url: "https://accounts.test/userinfo".into(),
        post_login_redirect: "/dashboard".into(),
        static_dir: None,
        cors_allowed_origins: None,
    }
}

pub async fn test_context() -> TestContext {
    let storage_dir = tempfile::tempdir().unwrap();
    let inference = MockServer::start().await;
    let config = test_config(storage_dir.path().to_str().unwrap(), &inference.uri());

    let users = Arc::new(InMemoryUsers::default());
    let scans = Arc::new(InMemoryScans::default());
    let reports = Arc::new(InMemoryReports::default());

    let state = AppState {
        database: Database::connect_lazy(&config.database_url).unwrap(),
        users: users.clone(),
        scans: scans.clone(),
        reports: reports.clone(),
        storage: Arc::new(LocalStorage::new(storage_dir.path()).unwrap()),
        inference: Arc::new(InferenceClient::new(config.inference_url.clone())),
        identity: Arc::new(FakeIdentity {
            email: "patient@example.com".into(),
        }),
        sessions: Arc::new(SessionService::new(
            &config.session_secret,
            config.session_ttl_hours,
        )),
        metrics: Arc::new(MetricsService::new().unwrap()),
        config: Arc::new(config),
    };

    TestContext {
        app: create_app(state.clone()),
        state,
        users,
        scans,
        reports,
        inference,
        storage_dir,
    }
}

impl TestContext {
    /// Rebuilds the router around a different identity provider.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.state.identity = identity;
        self.app = create_app(self.state.clone());
        self
    }

    /// Creates a user and returns it with a bearer token for it.
    pub async fn signed_in_user(&self, email: &str) -> (User, String) {
        let user = self
            .users
            .create(&NewUser {
                email: email.to_string(),
                name: None,
                image: None,
            })
            .await
            .unwrap();
        let token = self.state.sessions.issue(user.id, &user.email).unwrap();
        (user, token)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Stores a scan file and row for `user` directly.
    pub async fn seed_scan(&self, user: &User, file_name: &str, data: &[u8]) -> Scan {
        let file_path = format!("/uploads/{}/{}", user.id, file_name);
        self.state.storage.put(&file_path, data).await.unwrap();
        self.scans
            .create(&NewScan {
                id: Uuid::new_v4(),
                user_id: user.id,
                file_name: file_name.to_string(),
                file_path,
                original_name: "hip.png".to_string(),
                mime_type: "image/png".to_string(),
                size: data.len() as i64,
            })
            .await
            .unwrap()
    }

    pub async fn seed_report(&self, scan: &Scan, label: &str, confidence: f64) -> Report {
        self.reports
            .create(&NewReport {
                id: Uuid::new_v4(),
                scan_id: scan.id,
                user_id: scan.user_id,
                predicted_class: label.to_string(),
                confidence,
                class_probabilities: None,
                external_report_id: None,
            })
            .await
            .unwrap()
    }
}

pub const BOUNDARY: &str = "osteoscan-test-boundary";

/// A multipart body with one `file` part.
pub fn multipart_file(file_name: Option<&str>, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut disposition = "Content-Disposition: form-data; name=\"file\"".to_string();
    if let Some(name) = file_name {
        disposition.push_str(&format!("; filename=\"{}\"", name));
    }

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, disposition).as_bytes());
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_text(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"\r\n\r\n{v}\r\n--{b}--\r\n",
        b = BOUNDARY,
        n = name,
        v = value
    )
    .into_bytes()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Value of the named cookie in the response's `Set-Cookie` headers.
pub fn set_cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| v[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}
