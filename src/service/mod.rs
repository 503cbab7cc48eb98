//! Client side of the remote prediction service.
//!
//! The workflow only talks to [`PredictionService`]; the HTTP implementation
//! lives in [`http`] and tests substitute scripted fakes.

use serde::{Deserialize, Serialize};

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, Pipeline};

#[cfg(test)]
pub(crate) mod fake;
pub mod http;

pub use http::HttpService;

/// A failed service call, reduced to what the view needs to show.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// The request never produced a usable response (connect, I/O, timeout).
    #[error("{0}")]
    Transport(String),
    /// The service answered with a non-2xx status.
    #[error("API error: {0}")]
    Status(u16),
    /// A 2xx response whose body could not be used.
    #[error("{0}")]
    Malformed(String),
    /// A 2xx response carrying the service's own `{"error": ...}` report.
    #[error("{0}")]
    Reported(String),
}

/// Body of the advice call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub default_probability: f64,
    pub lime_explanations: FeatureAttribution,
}

/// Operations offered by the prediction service.
pub trait PredictionService {
    /// Probability of default for an application.
    fn predict(&self, pipeline: Pipeline, input: &ApplicationInput) -> Result<f64, ServiceError>;

    /// Per-feature attribution for an application.
    fn explain(
        &self,
        pipeline: Pipeline,
        input: &ApplicationInput,
    ) -> Result<FeatureAttribution, ServiceError>;

    /// Free-text interpretation and advice for a scored, explained application.
    fn advise(&self, request: &AdviceRequest) -> Result<AdvisoryResult, ServiceError>;

    /// Greeting returned by the service root; used as a reachability check.
    fn health(&self) -> Result<String, ServiceError>;

    /// Attribution for a row of the service's held-out test set.
    fn explain_sample(&self, pipeline: Pipeline, index: usize) -> Result<FeatureAttribution, ServiceError>;
}

impl<S: PredictionService + ?Sized> PredictionService for &S {
    fn predict(&self, pipeline: Pipeline, input: &ApplicationInput) -> Result<f64, ServiceError> {
        (**self).predict(pipeline, input)
    }

    fn explain(
        &self,
        pipeline: Pipeline,
        input: &ApplicationInput,
    ) -> Result<FeatureAttribution, ServiceError> {
        (**self).explain(pipeline, input)
    }

    fn advise(&self, request: &AdviceRequest) -> Result<AdvisoryResult, ServiceError> {
        (**self).advise(request)
    }

    fn health(&self) -> Result<String, ServiceError> {
        (**self).health()
    }

    fn explain_sample(&self, pipeline: Pipeline, index: usize) -> Result<FeatureAttribution, ServiceError> {
        (**self).explain_sample(pipeline, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_the_code() {
        assert_eq!(ServiceError::Status(500).to_string(), "API error: 500");
        assert_eq!(ServiceError::Status(404).to_string(), "API error: 404");
    }

    #[test]
    fn other_errors_show_their_text() {
        assert_eq!(
            ServiceError::Transport("connection refused".to_string()).to_string(),
            "connection refused"
        );
        assert_eq!(
            ServiceError::Reported("Pipeline svm not found.".to_string()).to_string(),
            "Pipeline svm not found."
        );
    }

    #[test]
    fn advice_request_wire_shape() {
        let req = AdviceRequest {
            default_probability: 0.42,
            lime_explanations: FeatureAttribution::new(vec![("DEBTINC > 40".to_string(), 0.31)]),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "default_probability": 0.42,
                "lime_explanations": [["DEBTINC > 40", 0.31]]
            })
        );
    }
}
