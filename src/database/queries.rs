use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::*;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Inserts a user. A concurrent insert for the same email degrades to a
    /// timestamp touch of the existing row instead of a second row.
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn touch(&self, id: Uuid) -> Result<User>;
}

#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn create(&self, scan: &NewScan) -> Result<Scan>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Scan>>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scan>>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &NewReport) -> Result<Report>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Report>>;
}

const USER_COLUMNS: &str = "id, email, name, image, created_at, updated_at";

const SCAN_COLUMNS: &str =
    "id, user_id, file_name, file_path, original_name, mime_type, size, uploaded_at";

const REPORT_COLUMNS: &str = "id, scan_id, user_id, predicted_class, confidence, \
     class_probabilities, external_report_id, report_path, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn touch(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgScanRepository {
    pool: PgPool,
}

impl PgScanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanRepository for PgScanRepository {
    async fn create(&self, scan: &NewScan) -> Result<Scan> {
        let scan = sqlx::query_as::<_, Scan>(&format!(
            r#"
            INSERT INTO scans (id, user_id, file_name, file_path, original_name, mime_type, size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SCAN_COLUMNS
        ))
        .bind(scan.id)
        .bind(scan.user_id)
        .bind(&scan.file_name)
        .bind(&scan.file_path)
        .bind(&scan.original_name)
        .bind(&scan.mime_type)
        .bind(scan.size)
        .fetch_one(&self.pool)
        .await?;

        Ok(scan)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Scan>> {
        let scan = sqlx::query_as::<_, Scan>(&format!(
            "SELECT {} FROM scans WHERE id = $1",
            SCAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(scan)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scan>> {
        let scans = sqlx::query_as::<_, Scan>(&format!(
            "SELECT {} FROM scans WHERE user_id = $1 ORDER BY uploaded_at DESC",
            SCAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(scans)
    }
}

#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, report: &NewReport) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (id, scan_id, user_id, predicted_class, confidence,
                                 class_probabilities, external_report_id, report_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(report.id)
        .bind(report.scan_id)
        .bind(report.user_id)
        .bind(&report.predicted_class)
        .bind(report.confidence)
        .bind(report.class_probabilities.clone().map(Json))
        .bind(&report.external_report_id)
        .bind(report.report_path())
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports WHERE user_id = $1 ORDER BY created_at DESC",
            REPORT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}
