//! Process-lifetime request counters exposed in Prometheus text format.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::core::errors::ApiError;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const PREDICTION_REQUESTS_COUNT: &str = "prediction_requests_count";

/// Counters live in a registry owned by the application state rather than
/// the crate-global default registry, so each state renders only its own.
#[derive(Clone)]
pub struct AppMetrics {
    registry: Registry,
    http_requests: IntCounter,
    predictions: IntCounter,
}

impl AppMetrics {
    pub fn new() -> Result<Self, ApiError> {
        let registry = Registry::new();

        let http_requests = IntCounter::new(
            HTTP_REQUESTS_TOTAL,
            "Total number of requests received by the API",
        )
        .map_err(ApiError::internal)?;
        let predictions = IntCounter::new(
            PREDICTION_REQUESTS_COUNT,
            "Total number of requests for model made and predictions",
        )
        .map_err(ApiError::internal)?;

        registry
            .register(Box::new(http_requests.clone()))
            .map_err(ApiError::internal)?;
        registry
            .register(Box::new(predictions.clone()))
            .map_err(ApiError::internal)?;

        Ok(Self {
            registry,
            http_requests,
            predictions,
        })
    }

    pub fn record_request(&self) {
        self.http_requests.inc();
    }

    pub fn record_prediction(&self) {
        self.predictions.inc();
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests.get()
    }

    pub fn predictions(&self) -> u64 {
        self.predictions.get()
    }

    /// Content type of [`render`](Self::render) output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    pub fn render(&self) -> Result<String, ApiError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(ApiError::internal)?;
        String::from_utf8(buffer).map_err(ApiError::internal)
    }
}
