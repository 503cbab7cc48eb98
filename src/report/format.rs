//! Formatted terminal output for workflow results.
//!
//! Both the one-shot CLI and the TUI use these helpers, so the numbers look
//! the same everywhere.

use crate::domain::{AdvisoryResult, ApplicationInput, FeatureAttribution, InputField, Pipeline, RiskLevel};
use crate::workflow::WorkflowState;

/// Default width (columns) of attribution bars in text output.
pub const BAR_WIDTH: usize = 30;

/// `0.4236` → `"42.36%"`.
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// `0.31` → `"+0.3100"`, `-0.52` → `"-0.5200"`.
pub fn format_weight(weight: f64) -> String {
    if weight > 0.0 {
        format!("+{weight:.4}")
    } else {
        format!("{weight:.4}")
    }
}

/// Bar length for a weight: `min(|w|, 1)` of the full width.
pub fn bar_len(weight: f64, width: usize) -> usize {
    let frac = weight.abs().min(1.0);
    (frac * width as f64).round() as usize
}

pub fn format_application(input: &ApplicationInput, pipeline: Pipeline) -> String {
    let mut out = String::new();
    out.push_str("Application:\n");
    for field in InputField::ALL {
        out.push_str(&format!(
            "  {:<36} {}\n",
            field.label(),
            input.display_value(field)
        ));
    }
    out.push_str(&format!(
        "  {:<36} {} ({})\n",
        "Model Pipeline",
        pipeline.display_name(),
        pipeline.token()
    ));
    out
}

pub fn format_prediction(probability: f64) -> String {
    let risk = RiskLevel::from_probability(probability);
    let mut out = String::new();
    out.push_str("Default prediction:\n");
    out.push_str(&format!("  Probability of default: {}\n", format_percent(probability)));
    out.push_str(&format!("  Risk level: {}\n", risk.display_name()));
    out
}

/// Attribution table in display order (largest magnitude first).
pub fn format_attribution(attribution: &FeatureAttribution) -> String {
    let mut out = String::new();
    out.push_str("Explanation (positive values increase default risk, negative values decrease it):\n");
    if attribution.is_empty() {
        out.push_str("  (no factors returned)\n");
        return out;
    }

    let name_width = attribution
        .pairs()
        .iter()
        .map(|(n, _)| n.chars().count())
        .max()
        .unwrap_or(0);

    for (name, weight) in attribution.display_order() {
        let marker = if weight > 0.0 { '+' } else { '-' };
        let bar: String = std::iter::repeat_n(marker, bar_len(weight, BAR_WIDTH)).collect();
        out.push_str(&format!(
            "  {name:<name_width$}  {:>8}  {bar}\n",
            format_weight(weight)
        ));
    }
    out
}

pub fn format_advice(advisory: &AdvisoryResult) -> String {
    let mut out = String::new();
    out.push_str("Interpretation:\n");
    for line in advisory.interpretation.lines() {
        out.push_str(&format!("  {line}\n"));
    }
    out.push_str("\nFinancial advice:\n");
    for line in advisory.recommendation.lines() {
        out.push_str(&format!("  {line}\n"));
    }
    out
}

/// Everything the workflow currently holds, section by section.
pub fn format_session(state: &WorkflowState) -> String {
    let mut sections = Vec::new();

    if let Some(input) = state.input() {
        sections.push(format_application(input, state.pipeline()));
    }
    if let Some(p) = state.probability() {
        sections.push(format_prediction(p));
    }
    if let Some(attribution) = state.attribution() {
        sections.push(format_attribution(attribution));
    }
    if let Some(advisory) = state.advisory() {
        sections.push(format_advice(advisory));
    }
    if let Some(err) = state.error() {
        sections.push(format!("Error: {err}\n"));
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceError;
    use crate::service::fake::{advisory, attribution};
    use crate::workflow::{CallKind, CallOutcome};

    #[test]
    fn percent_and_weight_formatting() {
        assert_eq!(format_percent(0.42), "42.00%");
        assert_eq!(format_percent(0.12345), "12.35%");
        assert_eq!(format_weight(0.31), "+0.3100");
        assert_eq!(format_weight(-0.52), "-0.5200");
        assert_eq!(format_weight(0.0), "0.0000");
    }

    #[test]
    fn bar_len_is_capped() {
        assert_eq!(bar_len(0.5, 30), 15);
        assert_eq!(bar_len(-0.5, 30), 15);
        assert_eq!(bar_len(3.0, 30), 30);
        assert_eq!(bar_len(0.0, 30), 0);
    }

    #[test]
    fn prediction_block_names_risk() {
        let text = format_prediction(0.85);
        assert!(text.contains("85.00%"));
        assert!(text.contains("Risk level: High"));
    }

    #[test]
    fn attribution_rows_follow_display_order() {
        let text = format_attribution(&attribution(&[("DEBTINC", 0.31), ("CLAGE", -0.52), ("NINQ", 0.10)]));
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].trim_start().starts_with("CLAGE"));
        assert!(rows[0].contains("-0.5200"));
        assert!(rows[1].trim_start().starts_with("DEBTINC"));
        assert!(rows[2].trim_start().starts_with("NINQ"));
    }

    #[test]
    fn session_includes_only_held_sections() {
        let mut state = WorkflowState::new();
        assert_eq!(format_session(&state), "");

        state.submit(ApplicationInput::default(), Pipeline::Gb);
        state.begin(CallKind::Prediction);
        state.complete(Ok(CallOutcome::Probability(0.1)));
        state.begin(CallKind::Explanation);
        state.complete(Err(ServiceError::Status(500)));

        let text = format_session(&state);
        assert!(text.contains("Gradient Boosting (gb)"));
        assert!(text.contains("10.00%"));
        assert!(!text.contains("Explanation"));
        assert!(text.contains("Error: API error: 500"));

        state.begin(CallKind::Explanation);
        state.complete(Ok(CallOutcome::Attribution(attribution(&[("LOAN", 0.2)]))));
        state.begin(CallKind::Advice);
        state.complete(Ok(CallOutcome::Advisory(advisory("Moderate.", "Keep DTI low."))));
        let text = format_session(&state);
        assert!(text.contains("Keep DTI low."));
        assert!(!text.contains("Error:"));
    }
}
