//! Shared "scoring chain" logic used by the one-shot CLI.
//!
//! The chain is the workflow driven without a user in the loop:
//! submit -> predict -> explain -> advise, each step awaited before the next
//! and the whole run stopping at the first failure.

use log::info;

use crate::domain::{ApplicationInput, Pipeline};
use crate::service::PredictionService;
use crate::workflow::{ApplicationWorkflow, CallKind, Stage};

/// How far a chain got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub reached: Stage,
    /// The call that failed, if the chain stopped early.
    pub failed: Option<CallKind>,
}

/// Submit `input` and advance the workflow until it reaches `through`.
pub fn score_application<S: PredictionService>(
    service: S,
    input: ApplicationInput,
    pipeline: Pipeline,
    through: Stage,
) -> (ApplicationWorkflow<S>, ChainOutcome) {
    let mut workflow = ApplicationWorkflow::new(service);
    workflow.submit(input, pipeline);
    let outcome = run_chain(&mut workflow, through);
    (workflow, outcome)
}

/// Advance an already-submitted workflow until it reaches `through`.
pub fn run_chain<S: PredictionService>(workflow: &mut ApplicationWorkflow<S>, through: Stage) -> ChainOutcome {
    for kind in [CallKind::Prediction, CallKind::Explanation, CallKind::Advice] {
        if workflow.stage() >= through {
            break;
        }
        if !workflow.request(kind) {
            break;
        }
        if workflow.error().is_some() {
            return ChainOutcome {
                reached: workflow.stage(),
                failed: Some(kind),
            };
        }
        info!("chain reached {}", workflow.stage().display_name());
    }

    ChainOutcome {
        reached: workflow.stage(),
        failed: None,
    }
}
