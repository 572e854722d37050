use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::errors::{AppError, Result};

pub struct MetricsService {
    registry: Registry,
    http_responses: IntCounterVec,
    scans_uploaded: IntCounter,
    analyses: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("osteoscan".to_string()), None)
            .map_err(metrics_error)?;

        let http_responses = IntCounterVec::new(
            Opts::new("http_responses_total", "HTTP responses by status class"),
            &["class"],
        )
        .map_err(metrics_error)?;
        let scans_uploaded = IntCounter::new("scans_uploaded_total", "Scans stored")
            .map_err(metrics_error)?;
        let analyses = IntCounterVec::new(
            Opts::new("analyses_total", "Inference round trips by outcome"),
            &["outcome"],
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(http_responses.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(scans_uploaded.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(analyses.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            http_responses,
            scans_uploaded,
            analyses,
        })
    }

    pub fn record_response(&self, status: u16) {
        let class = match status {
            100..=199 => "1xx",
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };
        self.http_responses.with_label_values(&[class]).inc();
    }

    pub fn record_upload(&self) {
        self.scans_uploaded.inc();
    }

    pub fn record_analysis(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.analyses.with_label_values(&[outcome]).inc();
    }

    /// Prometheus text exposition of everything registered here.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;

        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.into()))
    }
}

fn metrics_error(e: prometheus::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("metrics: {}", e))
}
