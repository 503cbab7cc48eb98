//! Workflow state and its transitions.
//!
//! `WorkflowState` is a plain value; every change goes through `submit`,
//! `begin`, or `complete`. No I/O happens here, which keeps the transition
//! rules testable without a service.

use log::debug;

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, Pipeline};
use crate::service::{AdviceRequest, PredictionService, ServiceError};

/// Progress through the reveal sequence, derived from the data held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// No application submitted yet.
    Idle,
    /// Application captured, no results.
    InputReady,
    /// Probability known.
    Predicted,
    /// Attribution known.
    Explained,
    /// Advisory known.
    Advised,
}

impl Stage {
    pub fn display_name(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::InputReady => "input ready",
            Stage::Predicted => "predicted",
            Stage::Explained => "explained",
            Stage::Advised => "advised",
        }
    }
}

/// The three service calls the workflow can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Prediction,
    Explanation,
    Advice,
}

impl CallKind {
    pub fn display_name(self) -> &'static str {
        match self {
            CallKind::Prediction => "prediction",
            CallKind::Explanation => "explanation",
            CallKind::Advice => "advice",
        }
    }
}

/// A call whose payload has been snapshotted by [`WorkflowState::begin`].
#[derive(Debug, Clone, PartialEq)]
pub enum PendingCall {
    Predict {
        pipeline: Pipeline,
        input: ApplicationInput,
    },
    Explain {
        pipeline: Pipeline,
        input: ApplicationInput,
    },
    Advise(AdviceRequest),
}

impl PendingCall {
    pub fn kind(&self) -> CallKind {
        match self {
            PendingCall::Predict { .. } => CallKind::Prediction,
            PendingCall::Explain { .. } => CallKind::Explanation,
            PendingCall::Advise(_) => CallKind::Advice,
        }
    }

    /// Perform the call against a service.
    pub fn execute<S: PredictionService + ?Sized>(&self, service: &S) -> Result<CallOutcome, ServiceError> {
        match self {
            PendingCall::Predict { pipeline, input } => {
                service.predict(*pipeline, input).map(CallOutcome::Probability)
            }
            PendingCall::Explain { pipeline, input } => {
                service.explain(*pipeline, input).map(CallOutcome::Attribution)
            }
            PendingCall::Advise(request) => service.advise(request).map(CallOutcome::Advisory),
        }
    }
}

/// Successful result of a [`PendingCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Probability(f64),
    Attribution(FeatureAttribution),
    Advisory(AdvisoryResult),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    input: Option<ApplicationInput>,
    pipeline: Pipeline,
    probability: Option<f64>,
    attribution: Option<FeatureAttribution>,
    advisory: Option<AdvisoryResult>,
    error: Option<String>,
    busy: bool,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        if self.input.is_none() {
            Stage::Idle
        } else if self.advisory.is_some() {
            Stage::Advised
        } else if self.attribution.is_some() {
            Stage::Explained
        } else if self.probability.is_some() {
            Stage::Predicted
        } else {
            Stage::InputReady
        }
    }

    pub fn input(&self) -> Option<&ApplicationInput> {
        self.input.as_ref()
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    pub fn attribution(&self) -> Option<&FeatureAttribution> {
        self.attribution.as_ref()
    }

    pub fn advisory(&self) -> Option<&AdvisoryResult> {
        self.advisory.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Capture a new application, discarding every derived result.
    pub fn submit(&mut self, input: ApplicationInput, pipeline: Pipeline) {
        debug!("submit: pipeline={}", pipeline.token());
        self.input = Some(input);
        self.pipeline = pipeline;
        self.probability = None;
        self.attribution = None;
        self.advisory = None;
        self.error = None;
        self.busy = false;
    }

    /// Whether the prerequisites for `kind` are held.
    pub fn can_begin(&self, kind: CallKind) -> bool {
        match kind {
            CallKind::Prediction => self.input.is_some(),
            CallKind::Explanation => self.input.is_some() && self.probability.is_some(),
            CallKind::Advice => self.probability.is_some() && self.attribution.is_some(),
        }
    }

    /// Start a call: mark busy, clear the error, and snapshot the payload.
    ///
    /// Returns `None` (and changes nothing) when the prerequisites are missing.
    pub fn begin(&mut self, kind: CallKind) -> Option<PendingCall> {
        if !self.can_begin(kind) {
            debug!("{} skipped: prerequisites missing", kind.display_name());
            return None;
        }

        let call = match kind {
            CallKind::Prediction => PendingCall::Predict {
                pipeline: self.pipeline,
                input: self.input.clone()?,
            },
            CallKind::Explanation => PendingCall::Explain {
                pipeline: self.pipeline,
                input: self.input.clone()?,
            },
            CallKind::Advice => PendingCall::Advise(AdviceRequest {
                default_probability: self.probability?,
                lime_explanations: self.attribution.clone()?,
            }),
        };

        self.busy = true;
        self.error = None;
        Some(call)
    }

    /// Apply the result of a call started with [`begin`](Self::begin).
    ///
    /// Success stores the payload for its own stage only; results of other
    /// stages are left as they are. Failure stores the message and keeps all
    /// data. Either way the busy flag is cleared.
    pub fn complete(&mut self, result: Result<CallOutcome, ServiceError>) {
        self.busy = false;
        match result {
            Ok(CallOutcome::Probability(p)) => self.probability = Some(p),
            Ok(CallOutcome::Attribution(a)) => self.attribution = Some(a),
            Ok(CallOutcome::Advisory(a)) => self.advisory = Some(a),
            Err(err) => self.error = Some(err.to_string()),
        }
        debug!("complete: stage={}", self.stage().display_name());
    }
}
