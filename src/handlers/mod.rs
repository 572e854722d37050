use std::sync::Arc;

use crate::{
    auth::{GoogleOAuth, IdentityProvider, SessionService},
    config::Config,
    database::{
        Database, PgReportRepository, PgScanRepository, PgUserRepository, ReportRepository,
        ScanRepository, UserRepository,
    },
    errors::Result,
    services::{InferenceClient, MetricsService},
    storage::{LocalStorage, Storage},
};

pub mod auth;
pub mod docs;
pub mod health;
pub mod images;
pub mod metrics;
pub mod reports;
pub mod scans;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub users: Arc<dyn UserRepository>,
    pub scans: Arc<dyn ScanRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub storage: Arc<dyn Storage>,
    pub inference: Arc<InferenceClient>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    /// Production wiring: Postgres repositories, disk storage under
    /// `STORAGE_ROOT`, Google sign-in.
    pub fn new(config: Config, database: Database) -> Result<Self> {
        let pool = database.pool().clone();
        let storage = LocalStorage::new(&config.storage_root)?;
        let inference = InferenceClient::new(config.inference_url.clone());
        tracing::info!(
            storage_root = %config.storage_root,
            inference_url = %inference.base_url(),
            "Application state initialised"
        );

        Ok(Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            scans: Arc::new(PgScanRepository::new(pool.clone())),
            reports: Arc::new(PgReportRepository::new(pool)),
            storage: Arc::new(storage),
            inference: Arc::new(inference),
            identity: Arc::new(GoogleOAuth::from_config(&config)),
            sessions: Arc::new(SessionService::new(
                &config.session_secret,
                config.session_ttl_hours,
            )),
            metrics: Arc::new(MetricsService::new()?),
            config: Arc::new(config),
            database,
        })
    }
}
