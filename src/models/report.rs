use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

pub type ClassProbabilities = HashMap<String, f64>;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub user_id: Uuid,
    pub predicted_class: String,
    /// Percentage in the range 0..=100.
    pub confidence: f64,
    #[schema(value_type = Option<Object>)]
    pub class_probabilities: Option<Json<ClassProbabilities>>,
    pub external_report_id: Option<String>,
    pub report_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn probability(&self, label: &str) -> Option<f64> {
        self.class_probabilities
            .as_ref()
            .and_then(|probs| probs.0.get(label).copied())
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub user_id: Uuid,
    pub predicted_class: String,
    pub confidence: f64,
    pub class_probabilities: Option<ClassProbabilities>,
    pub external_report_id: Option<String>,
}

impl NewReport {
    pub fn report_path(&self) -> Option<String> {
        self.external_report_id
            .as_ref()
            .map(|id| format!("/reports/{}.json", id))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub predicted_class: String,
    pub confidence: f64,
    #[schema(value_type = Option<Object>)]
    pub class_probabilities: Option<ClassProbabilities>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for AnalysisResponse {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            scan_id: report.scan_id,
            predicted_class: report.predicted_class,
            confidence: report.confidence,
            class_probabilities: report.class_probabilities.map(|probs| probs.0),
            created_at: report.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<Report>,
}
