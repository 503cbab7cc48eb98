//! Staged application workflow: submit → predict → explain → advise.

pub mod controller;
pub mod state;

pub use controller::ApplicationWorkflow;
pub use state::{CallKind, CallOutcome, PendingCall, Stage, WorkflowState};
