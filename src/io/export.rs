//! Export a workflow session to JSON or Markdown.
//!
//! The JSON form is meant for downstream scripts; the Markdown form is a
//! readable record of one application and its results.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, InputField, Pipeline, RiskLevel};
use crate::error::AppError;
use crate::report::{format_percent, format_weight};
use crate::workflow::WorkflowState;

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub pipeline: Pipeline,
    pub input: Option<ApplicationInput>,
    pub probability_of_default: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    /// Attribution in service order.
    pub attribution: Option<FeatureAttribution>,
    pub advisory: Option<AdvisoryResult>,
    pub error: Option<String>,
}

impl SessionReport {
    pub fn from_state(state: &WorkflowState) -> Self {
        Self {
            tool: "hmeq".to_string(),
            generated_at: Local::now(),
            pipeline: state.pipeline(),
            input: state.input().cloned(),
            probability_of_default: state.probability(),
            risk_level: state.probability().map(RiskLevel::from_probability),
            attribution: state.attribution().cloned(),
            advisory: state.advisory().cloned(),
            error: state.error().map(str::to_string),
        }
    }
}

pub fn write_session_json(path: &Path, report: &SessionReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::usage(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

pub fn write_session_markdown(path: &Path, report: &SessionReport) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create report '{}': {e}", path.display())))?;
    file.write_all(render_markdown(report).as_bytes())
        .map_err(|e| AppError::usage(format!("Failed to write report: {e}")))?;
    Ok(())
}

/// Write a Markdown report into `dir` with a timestamped file name.
pub fn write_session_bundle(dir: &Path, report: &SessionReport) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::usage(format!("Failed to create report dir: {e}")))?;
    let ts = report.generated_at.format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("hmeq_{}_{ts}.md", report.pipeline.token()));
    write_session_markdown(&path, report)?;
    Ok(path)
}

pub fn render_markdown(report: &SessionReport) -> String {
    let mut out = String::new();
    out.push_str("# hmeq session report\n");
    out.push_str(&format!("- generated: {}\n", report.generated_at.to_rfc3339()));
    out.push_str(&format!(
        "- pipeline: {} ({})\n",
        report.pipeline.display_name(),
        report.pipeline.token()
    ));

    if let Some(input) = &report.input {
        out.push_str("\n## Application\n");
        out.push_str("| field | value |\n| - | - |\n");
        for field in InputField::ALL {
            out.push_str(&format!("| {} | {} |\n", field.wire_name(), input.display_value(field)));
        }
    }

    if let Some(p) = report.probability_of_default {
        out.push_str("\n## Prediction\n");
        out.push_str(&format!("- probability of default: {}\n", format_percent(p)));
        if let Some(risk) = report.risk_level {
            out.push_str(&format!("- risk level: {}\n", risk.display_name()));
        }
    }

    if let Some(attribution) = &report.attribution {
        out.push_str("\n## Explanation\n");
        out.push_str("| factor | weight |\n| - | - |\n");
        for (name, weight) in attribution.display_order() {
            out.push_str(&format!("| {name} | {} |\n", format_weight(weight)));
        }
    }

    if let Some(advisory) = &report.advisory {
        out.push_str("\n## Interpretation\n");
        out.push_str(advisory.interpretation.trim_end());
        out.push_str("\n\n## Financial advice\n");
        out.push_str(advisory.recommendation.trim_end());
        out.push('\n');
    }

    if let Some(err) = &report.error {
        out.push_str(&format!("\n## Last error\n{err}\n"));
    }

    out
}
