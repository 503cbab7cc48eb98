//! Domain types shared by the service client, workflow, and front-ends.
//!
//! This module defines:
//!
//! - the loan application record (`ApplicationInput`) and its form fields
//! - routing and categorical enums (`Pipeline`, `LoanReason`, `JobCategory`)
//! - result payloads (`FeatureAttribution`, `AdvisoryResult`, `RiskLevel`)

pub mod types;

pub use types::*;
