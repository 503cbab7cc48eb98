//! Scripted in-memory service for tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, Pipeline};
use crate::service::{AdviceRequest, PredictionService, ServiceError};

/// Returns queued responses in order and records every call it receives.
///
/// An empty queue answers with a transport error so a missing script shows up
/// as a failed call rather than a panic inside the workflow.
#[derive(Default)]
pub struct FakeService {
    predictions: RefCell<VecDeque<Result<f64, ServiceError>>>,
    explanations: RefCell<VecDeque<Result<FeatureAttribution, ServiceError>>>,
    advice: RefCell<VecDeque<Result<AdvisoryResult, ServiceError>>>,
    calls: RefCell<Vec<String>>,
    last_input: RefCell<Option<ApplicationInput>>,
    last_advice: RefCell<Option<AdviceRequest>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_prediction(&self, result: Result<f64, ServiceError>) -> &Self {
        self.predictions.borrow_mut().push_back(result);
        self
    }

    pub fn push_explanation(&self, result: Result<FeatureAttribution, ServiceError>) -> &Self {
        self.explanations.borrow_mut().push_back(result);
        self
    }

    pub fn push_advice(&self, result: Result<AdvisoryResult, ServiceError>) -> &Self {
        self.advice.borrow_mut().push_back(result);
        self
    }

    /// Calls received so far, e.g. `["predict/rf", "explain/rf"]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn last_input(&self) -> Option<ApplicationInput> {
        self.last_input.borrow().clone()
    }

    pub fn last_advice(&self) -> Option<AdviceRequest> {
        self.last_advice.borrow().clone()
    }

    fn unscripted<T>(what: &str) -> Result<T, ServiceError> {
        Err(ServiceError::Transport(format!("no scripted {what} response")))
    }
}

pub fn attribution(pairs: &[(&str, f64)]) -> FeatureAttribution {
    FeatureAttribution::new(pairs.iter().map(|(n, w)| (n.to_string(), *w)).collect())
}

pub fn advisory(interpretation: &str, recommendation: &str) -> AdvisoryResult {
    AdvisoryResult {
        interpretation: interpretation.to_string(),
        recommendation: recommendation.to_string(),
    }
}

impl PredictionService for FakeService {
    fn predict(&self, pipeline: Pipeline, input: &ApplicationInput) -> Result<f64, ServiceError> {
        self.calls.borrow_mut().push(format!("predict/{}", pipeline.token()));
        *self.last_input.borrow_mut() = Some(input.clone());
        self.predictions
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Self::unscripted("prediction"))
    }

    fn explain(
        &self,
        pipeline: Pipeline,
        input: &ApplicationInput,
    ) -> Result<FeatureAttribution, ServiceError> {
        self.calls.borrow_mut().push(format!("explain/{}", pipeline.token()));
        *self.last_input.borrow_mut() = Some(input.clone());
        self.explanations
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Self::unscripted("explanation"))
    }

    fn advise(&self, request: &AdviceRequest) -> Result<AdvisoryResult, ServiceError> {
        self.calls.borrow_mut().push("advice".to_string());
        *self.last_advice.borrow_mut() = Some(request.clone());
        self.advice
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Self::unscripted("advice"))
    }

    fn health(&self) -> Result<String, ServiceError> {
        self.calls.borrow_mut().push("health".to_string());
        Ok("Hello World".to_string())
    }

    fn explain_sample(&self, pipeline: Pipeline, index: usize) -> Result<FeatureAttribution, ServiceError> {
        self.calls
            .borrow_mut()
            .push(format!("explain_sample/{}/{index}", pipeline.token()));
        self.explanations
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Self::unscripted("explanation"))
    }
}
