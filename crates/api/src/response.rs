use crate::corrections::CorrectionCounts;
use chrono::Utc;
use detector::{Prediction, prediction::round_to};
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current UTC time as ISO-8601 without an offset suffix.
pub fn utc_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub timestamp: String,
    pub predictions: Vec<Prediction>,
    pub count: usize,
}

impl PredictionResponse {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            success: true,
            timestamp: utc_timestamp(),
            count: predictions.len(),
            predictions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// One file's outcome inside a batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Success {
        filename: Option<String>,
        success: bool,
        predictions: Vec<Prediction>,
        count: usize,
    },
    Failure {
        filename: Option<String>,
        success: bool,
        error: String,
    },
}

impl BatchItem {
    pub fn success(filename: Option<String>, predictions: Vec<Prediction>) -> Self {
        BatchItem::Success {
            filename,
            success: true,
            count: predictions.len(),
            predictions,
        }
    }

    pub fn failure(filename: Option<String>, error: String) -> Self {
        BatchItem::Failure {
            filename,
            success: false,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchItem::Success { .. })
    }

    /// Detections in this item; zero for a failed file.
    pub fn count(&self) -> usize {
        match self {
            BatchItem::Success { count, .. } => *count,
            BatchItem::Failure { .. } => 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub timestamp: String,
    pub total_images: usize,
    pub results: Vec<BatchItem>,
}

impl BatchResponse {
    pub fn new(results: Vec<BatchItem>) -> Self {
        Self {
            success: true,
            timestamp: utc_timestamp(),
            total_images: results.len(),
            results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CorrectionResponse {
    pub success: bool,
    pub message: String,
    pub correction_count: usize,
    pub threshold: usize,
    pub retraining_triggered: bool,
    pub corrections_by_class: CorrectionCounts,
}

impl CorrectionResponse {
    pub fn new(counts: CorrectionCounts, threshold: usize) -> Self {
        let correction_count = counts.total();
        let retraining_triggered = correction_count >= threshold;

        let mut message = "Correction saved successfully".to_string();
        if retraining_triggered {
            message.push_str(" - Retraining will be triggered");
        }

        Self {
            success: true,
            message,
            correction_count,
            threshold,
            retraining_triggered,
            corrections_by_class: counts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub correction_count: usize,
    pub threshold: usize,
    pub progress_percentage: f64,
    pub corrections_by_class: CorrectionCounts,
    pub model_loaded: bool,
    pub model_path: String,
}

impl StatsResponse {
    pub fn new(
        counts: CorrectionCounts,
        threshold: usize,
        model_loaded: bool,
        model_path: String,
    ) -> Self {
        let correction_count = counts.total();
        Self {
            success: true,
            correction_count,
            threshold,
            progress_percentage: round_to(correction_count as f64 / threshold as f64 * 100.0, 2),
            corrections_by_class: counts,
            model_loaded,
            model_path,
        }
    }
}
