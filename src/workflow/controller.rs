//! Workflow controller: owns the state and the service it calls.

use log::{info, warn};

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, Pipeline};
use crate::service::PredictionService;
use crate::workflow::state::{CallKind, PendingCall, Stage, WorkflowState};

/// Drives an application through prediction, explanation, and advice.
///
/// Each `request_*` call is gated on the previous stage's data and is a
/// silent no-op when that data is missing. Calls may be repeated: a new
/// prediction overwrites the probability but leaves any attribution or
/// advisory already held in place. Only [`submit`](Self::submit) clears
/// downstream results.
pub struct ApplicationWorkflow<S> {
    service: S,
    state: WorkflowState,
}

impl<S: PredictionService> ApplicationWorkflow<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: WorkflowState::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn input(&self) -> Option<&ApplicationInput> {
        self.state.input()
    }

    pub fn pipeline(&self) -> Pipeline {
        self.state.pipeline()
    }

    pub fn probability(&self) -> Option<f64> {
        self.state.probability()
    }

    pub fn attribution(&self) -> Option<&FeatureAttribution> {
        self.state.attribution()
    }

    pub fn advisory(&self) -> Option<&AdvisoryResult> {
        self.state.advisory()
    }

    pub fn submit(&mut self, input: ApplicationInput, pipeline: Pipeline) {
        self.state.submit(input, pipeline);
    }

    /// First half of a two-phase call. See [`WorkflowState::begin`].
    pub fn begin(&mut self, kind: CallKind) -> Option<PendingCall> {
        self.state.begin(kind)
    }

    /// Run a call obtained from [`begin`](Self::begin) and apply its result.
    pub fn finish(&mut self, call: PendingCall) {
        let kind = call.kind();
        let result = call.execute(&self.service);
        match &result {
            Ok(_) => info!("{} succeeded", kind.display_name()),
            Err(err) => warn!("{} failed: {err}", kind.display_name()),
        }
        self.state.complete(result);
    }

    /// Issue a call if its prerequisites hold. Returns whether a call was made.
    pub fn request(&mut self, kind: CallKind) -> bool {
        match self.begin(kind) {
            Some(call) => {
                self.finish(call);
                true
            }
            None => false,
        }
    }

    pub fn request_prediction(&mut self) -> bool {
        self.request(CallKind::Prediction)
    }

    pub fn request_explanation(&mut self) -> bool {
        self.request(CallKind::Explanation)
    }

    pub fn request_advice(&mut self) -> bool {
        self.request(CallKind::Advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use crate::service::fake::{FakeService, advisory, attribution};

    fn submitted() -> ApplicationWorkflow<FakeService> {
        let mut wf = ApplicationWorkflow::new(FakeService::new());
        wf.submit(
            ApplicationInput {
                loan: 18000.0,
                clage: 94.4,
                ..ApplicationInput::default()
            },
            Pipeline::Rf,
        );
        wf
    }

    fn advised() -> ApplicationWorkflow<FakeService> {
        let mut wf = submitted();
        wf.service()
            .push_prediction(Ok(0.42))
            .push_explanation(Ok(attribution(&[("DEBTINC", 0.31), ("CLAGE", -0.52)])))
            .push_advice(Ok(advisory("High debt ratio.", "Pay down balances.")));
        assert!(wf.request_prediction());
        assert!(wf.request_explanation());
        assert!(wf.request_advice());
        assert_eq!(wf.stage(), Stage::Advised);
        wf
    }

    #[test]
    fn prediction_success_stores_exact_probability() {
        let mut wf = submitted();
        wf.service().push_prediction(Ok(0.42));

        assert!(wf.request_prediction());
        assert_eq!(wf.stage(), Stage::Predicted);
        assert_eq!(wf.probability(), Some(0.42));
        assert!(!wf.is_busy());
        assert_eq!(wf.error(), None);
        assert_eq!(wf.service().calls(), ["predict/rf"]);
    }

    #[test]
    fn prediction_failure_keeps_state_and_reports_status() {
        let mut wf = submitted();
        wf.service().push_prediction(Err(ServiceError::Status(500)));

        assert!(wf.request_prediction());
        assert_eq!(wf.stage(), Stage::InputReady);
        assert_eq!(wf.probability(), None);
        assert!(wf.error().unwrap().contains("500"));
        assert!(!wf.is_busy());
    }

    #[test]
    fn failed_reprediction_keeps_previous_probability() {
        let mut wf = submitted();
        wf.service()
            .push_prediction(Ok(0.25))
            .push_prediction(Err(ServiceError::Transport("timed out".to_string())));

        wf.request_prediction();
        wf.request_prediction();
        assert_eq!(wf.probability(), Some(0.25));
        assert_eq!(wf.error(), Some("timed out"));
    }

    #[test]
    fn prediction_without_input_is_a_noop() {
        let mut wf = ApplicationWorkflow::new(FakeService::new());
        assert!(!wf.request_prediction());
        assert_eq!(wf.stage(), Stage::Idle);
        assert!(wf.service().calls().is_empty());
    }

    #[test]
    fn explanation_before_prediction_is_a_noop() {
        let mut wf = submitted();
        let before = wf.state().clone();

        assert!(!wf.request_explanation());
        assert_eq!(wf.state(), &before);
        assert!(wf.service().calls().is_empty());

        // Still a no-op after a failed prediction.
        wf.service().push_prediction(Err(ServiceError::Status(502)));
        wf.request_prediction();
        assert!(!wf.request_explanation());
        assert_eq!(wf.service().calls(), ["predict/rf"]);
    }

    #[test]
    fn explanation_sends_full_input_not_probability() {
        let mut wf = submitted();
        wf.service()
            .push_prediction(Ok(0.7))
            .push_explanation(Ok(attribution(&[("LOAN", 0.05)])));
        wf.request_prediction();

        assert!(wf.request_explanation());
        assert_eq!(wf.stage(), Stage::Explained);
        assert_eq!(wf.service().last_input().as_ref(), wf.input());
        assert_eq!(wf.service().calls(), ["predict/rf", "explain/rf"]);
    }

    #[test]
    fn advice_requires_probability_and_attribution() {
        let mut wf = submitted();
        assert!(!wf.request_advice());

        wf.service().push_prediction(Ok(0.1));
        wf.request_prediction();
        assert!(!wf.request_advice());

        wf.service().push_explanation(Err(ServiceError::Status(500)));
        wf.request_explanation();
        assert!(!wf.request_advice());
        assert_eq!(wf.service().calls(), ["predict/rf", "explain/rf"]);
    }

    #[test]
    fn advice_success_reaches_advised() {
        let wf = advised();
        let req = wf.service().last_advice().unwrap();
        assert_eq!(req.default_probability, 0.42);
        assert_eq!(req.lime_explanations.len(), 2);
        assert_eq!(
            wf.advisory(),
            Some(&advisory("High debt ratio.", "Pay down balances."))
        );
    }

    #[test]
    fn reprediction_after_advice_keeps_downstream_results() {
        let mut wf = advised();
        let attribution_before = wf.attribution().cloned();
        let advisory_before = wf.advisory().cloned();

        wf.service().push_prediction(Ok(0.8));
        assert!(wf.request_prediction());

        assert_eq!(wf.probability(), Some(0.8));
        assert_eq!(wf.attribution().cloned(), attribution_before);
        assert_eq!(wf.advisory().cloned(), advisory_before);
        assert_eq!(wf.stage(), Stage::Advised);
    }

    #[test]
    fn submit_clears_results_from_any_stage() {
        let mut wf = advised();
        wf.service().push_advice(Err(ServiceError::Status(429)));
        wf.request_advice();
        assert!(wf.error().is_some());

        wf.submit(ApplicationInput::default(), Pipeline::Dt);
        assert_eq!(wf.stage(), Stage::InputReady);
        assert_eq!(wf.probability(), None);
        assert!(wf.attribution().is_none());
        assert!(wf.advisory().is_none());
        assert_eq!(wf.error(), None);
        assert!(!wf.is_busy());
    }

    #[test]
    fn errors_are_replaced_and_cleared_per_call() {
        let mut wf = submitted();
        wf.service()
            .push_prediction(Err(ServiceError::Status(500)))
            .push_prediction(Err(ServiceError::Status(404)))
            .push_prediction(Ok(0.5));

        wf.request_prediction();
        assert_eq!(wf.error(), Some("API error: 500"));
        wf.request_prediction();
        assert_eq!(wf.error(), Some("API error: 404"));
        wf.request_prediction();
        assert_eq!(wf.error(), None);
    }

    #[test]
    fn two_phase_call_reports_busy_in_between() {
        let mut wf = submitted();
        wf.service().push_prediction(Ok(0.05));

        let call = wf.begin(CallKind::Prediction).unwrap();
        assert!(wf.is_busy());
        assert_eq!(wf.stage(), Stage::InputReady);

        wf.finish(call);
        assert!(!wf.is_busy());
        assert_eq!(wf.probability(), Some(0.05));
    }
}
