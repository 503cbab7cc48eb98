//! Shared domain types.
//!
//! These types double as the wire format of the prediction service, so field
//! and variant names are pinned with serde attributes rather than left to the
//! Rust spelling.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Purpose of the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum LoanReason {
    #[default]
    #[value(name = "HomeImp")]
    HomeImp,
    #[value(name = "DebtCon")]
    DebtCon,
    #[value(name = "Other")]
    Other,
}

impl LoanReason {
    pub const ALL: [LoanReason; 3] = [LoanReason::HomeImp, LoanReason::DebtCon, LoanReason::Other];

    pub fn display_name(self) -> &'static str {
        match self {
            LoanReason::HomeImp => "Home Improvement",
            LoanReason::DebtCon => "Debt Consolidation",
            LoanReason::Other => "Other",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

/// Applicant job category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum JobCategory {
    #[default]
    #[value(name = "ProfExe")]
    ProfExe,
    #[value(name = "Mgr")]
    Mgr,
    #[value(name = "Office")]
    Office,
    #[value(name = "Sales")]
    Sales,
    #[serde(rename = "Self")]
    #[value(name = "Self")]
    SelfEmployed,
    #[value(name = "Other")]
    Other,
}

impl JobCategory {
    pub const ALL: [JobCategory; 6] = [
        JobCategory::ProfExe,
        JobCategory::Mgr,
        JobCategory::Office,
        JobCategory::Sales,
        JobCategory::SelfEmployed,
        JobCategory::Other,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            JobCategory::ProfExe => "Professional/Executive",
            JobCategory::Mgr => "Manager",
            JobCategory::Office => "Office",
            JobCategory::Sales => "Sales",
            JobCategory::SelfEmployed => "Self-Employed",
            JobCategory::Other => "Other",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

/// Which model variant the service should route the request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    #[value(name = "dt")]
    Dt,
    #[default]
    #[value(name = "rf")]
    Rf,
    #[value(name = "knn")]
    Knn,
    #[value(name = "gb")]
    Gb,
}

impl Pipeline {
    pub const ALL: [Pipeline; 4] = [Pipeline::Dt, Pipeline::Rf, Pipeline::Knn, Pipeline::Gb];

    /// Path token used in service URLs.
    pub fn token(self) -> &'static str {
        match self {
            Pipeline::Dt => "dt",
            Pipeline::Rf => "rf",
            Pipeline::Knn => "knn",
            Pipeline::Gb => "gb",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Pipeline::Dt => "Decision Tree",
            Pipeline::Rf => "Random Forest",
            Pipeline::Knn => "K-Nearest Neighbors",
            Pipeline::Gb => "Gradient Boosting",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], cur: T, delta: isize) -> T {
    let n = all.len() as isize;
    let idx = all.iter().position(|v| *v == cur).unwrap_or(0) as isize;
    all[(idx + delta).rem_euclid(n) as usize]
}

/// A loan application as sent to the service.
///
/// Numeric fields are always finite; anything typed by a user goes through
/// [`coerce_numeric`] first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ApplicationInput {
    pub loan: f64,
    pub mortdue: f64,
    pub value: f64,
    pub reason: LoanReason,
    pub job: JobCategory,
    pub yoj: f64,
    pub derog: f64,
    pub delinq: f64,
    pub clage: f64,
    pub ninq: f64,
    pub clno: f64,
    pub debtinc: f64,
}

/// Addressable form fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    Loan,
    Mortdue,
    Value,
    Reason,
    Job,
    Yoj,
    Derog,
    Delinq,
    Clage,
    Ninq,
    Clno,
    Debtinc,
}

impl InputField {
    pub const ALL: [InputField; 12] = [
        InputField::Loan,
        InputField::Mortdue,
        InputField::Value,
        InputField::Reason,
        InputField::Job,
        InputField::Yoj,
        InputField::Derog,
        InputField::Delinq,
        InputField::Clage,
        InputField::Ninq,
        InputField::Clno,
        InputField::Debtinc,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            InputField::Loan => "LOAN",
            InputField::Mortdue => "MORTDUE",
            InputField::Value => "VALUE",
            InputField::Reason => "REASON",
            InputField::Job => "JOB",
            InputField::Yoj => "YOJ",
            InputField::Derog => "DEROG",
            InputField::Delinq => "DELINQ",
            InputField::Clage => "CLAGE",
            InputField::Ninq => "NINQ",
            InputField::Clno => "CLNO",
            InputField::Debtinc => "DEBTINC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputField::Loan => "Loan Amount",
            InputField::Mortdue => "Mortgage Due",
            InputField::Value => "Property Value",
            InputField::Reason => "Reason",
            InputField::Job => "Job",
            InputField::Yoj => "Years on Job",
            InputField::Derog => "Derogatory Reports",
            InputField::Delinq => "Delinquent Accounts",
            InputField::Clage => "Age of Oldest Credit Line (months)",
            InputField::Ninq => "Recent Credit Inquiries",
            InputField::Clno => "Number of Credit Lines",
            InputField::Debtinc => "Debt-to-Income Ratio",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, InputField::Reason | InputField::Job)
    }
}

impl ApplicationInput {
    /// Numeric value of a field, or `None` for the two categorical fields.
    pub fn numeric(&self, field: InputField) -> Option<f64> {
        let v = match field {
            InputField::Loan => self.loan,
            InputField::Mortdue => self.mortdue,
            InputField::Value => self.value,
            InputField::Yoj => self.yoj,
            InputField::Derog => self.derog,
            InputField::Delinq => self.delinq,
            InputField::Clage => self.clage,
            InputField::Ninq => self.ninq,
            InputField::Clno => self.clno,
            InputField::Debtinc => self.debtinc,
            InputField::Reason | InputField::Job => return None,
        };
        Some(v)
    }

    /// Set a numeric field from raw user text. Categorical fields are ignored.
    pub fn set_numeric(&mut self, field: InputField, raw: &str) {
        let v = coerce_numeric(raw);
        let slot = match field {
            InputField::Loan => &mut self.loan,
            InputField::Mortdue => &mut self.mortdue,
            InputField::Value => &mut self.value,
            InputField::Yoj => &mut self.yoj,
            InputField::Derog => &mut self.derog,
            InputField::Delinq => &mut self.delinq,
            InputField::Clage => &mut self.clage,
            InputField::Ninq => &mut self.ninq,
            InputField::Clno => &mut self.clno,
            InputField::Debtinc => &mut self.debtinc,
            InputField::Reason | InputField::Job => return,
        };
        *slot = v;
    }

    /// Text shown for a field in forms and reports.
    pub fn display_value(&self, field: InputField) -> String {
        match field {
            InputField::Reason => self.reason.display_name().to_string(),
            InputField::Job => self.job.display_name().to_string(),
            _ => self.numeric(field).map(fmt_number).unwrap_or_default(),
        }
    }

    /// Replace any non-finite numeric field with zero.
    ///
    /// Applied to applications loaded from files, where the invariant was not
    /// enforced at edit time.
    pub fn sanitized(mut self) -> Self {
        for field in InputField::ALL {
            if self.numeric(field).is_some_and(|v| !v.is_finite()) {
                self.set_numeric(field, "0");
            }
        }
        self
    }
}

/// Coerce user text to a finite number.
///
/// Uses the longest leading numeric prefix of the trimmed text, so `"12abc"`
/// is 12. Text with no numeric prefix, or one that only parses to a
/// non-finite value (`"inf"`, `"nan"`), becomes 0.
pub fn coerce_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let mut ends: Vec<usize> = trimmed.char_indices().map(|(i, _)| i).skip(1).collect();
    ends.push(trimmed.len());

    for &end in ends.iter().rev() {
        if let Ok(v) = trimmed[..end].parse::<f64>() {
            return if v.is_finite() { v } else { 0.0 };
        }
    }
    0.0
}

fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

/// Coarse risk band used when displaying a default probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.7 {
            RiskLevel::High
        } else if p > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Per-feature contributions to a prediction, in service order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureAttribution(pub Vec<(String, f64)>);

impl FeatureAttribution {
    pub fn new(pairs: Vec<(String, f64)>) -> Self {
        Self(pairs)
    }

    pub fn pairs(&self) -> &[(String, f64)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries sorted by descending absolute weight.
    ///
    /// The sort is stable: equal magnitudes keep the service order.
    pub fn display_order(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self.0.iter().map(|(n, w)| (n.as_str(), *w)).collect();
        out.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        out
    }
}

/// Interpretation and recommendation returned by the advice call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryResult {
    pub interpretation: String,
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numeric_takes_leading_number() {
        assert_eq!(coerce_numeric("42"), 42.0);
        assert_eq!(coerce_numeric("  3.5 "), 3.5);
        assert_eq!(coerce_numeric("12abc"), 12.0);
        assert_eq!(coerce_numeric("-7.25x"), -7.25);
        assert_eq!(coerce_numeric("1e3"), 1000.0);
    }

    #[test]
    fn coerce_numeric_falls_back_to_zero() {
        assert_eq!(coerce_numeric(""), 0.0);
        assert_eq!(coerce_numeric("abc"), 0.0);
        assert_eq!(coerce_numeric("-"), 0.0);
        assert_eq!(coerce_numeric("inf"), 0.0);
        assert_eq!(coerce_numeric("NaN"), 0.0);
        assert_eq!(coerce_numeric("1e999"), 0.0);
    }

    #[test]
    fn application_defaults_to_zero_and_first_choices() {
        let input = ApplicationInput::default();
        for field in InputField::ALL {
            if let Some(v) = input.numeric(field) {
                assert_eq!(v, 0.0, "{} should default to zero", field.wire_name());
            }
        }
        assert_eq!(input.reason, LoanReason::HomeImp);
        assert_eq!(input.job, JobCategory::ProfExe);
    }

    #[test]
    fn application_serializes_with_wire_names() {
        let mut input = ApplicationInput {
            job: JobCategory::SelfEmployed,
            reason: LoanReason::DebtCon,
            ..ApplicationInput::default()
        };
        input.set_numeric(InputField::Loan, "15000");
        input.set_numeric(InputField::Debtinc, "33.7");

        let json = serde_json::to_value(&input).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 12);
        for field in InputField::ALL {
            assert!(obj.contains_key(field.wire_name()), "missing {}", field.wire_name());
        }
        assert_eq!(json["LOAN"], 15000.0);
        assert_eq!(json["DEBTINC"], 33.7);
        assert_eq!(json["JOB"], "Self");
        assert_eq!(json["REASON"], "DebtCon");
    }

    #[test]
    fn sanitized_replaces_non_finite_values() {
        let input = ApplicationInput {
            loan: f64::NAN,
            clage: f64::INFINITY,
            yoj: 4.0,
            ..ApplicationInput::default()
        }
        .sanitized();
        assert_eq!(input.loan, 0.0);
        assert_eq!(input.clage, 0.0);
        assert_eq!(input.yoj, 4.0);
    }

    #[test]
    fn pipeline_tokens_and_cycle() {
        let tokens: Vec<&str> = Pipeline::ALL.iter().map(|p| p.token()).collect();
        assert_eq!(tokens, ["dt", "rf", "knn", "gb"]);
        assert_eq!(Pipeline::default(), Pipeline::Rf);
        assert_eq!(Pipeline::Gb.next(), Pipeline::Dt);
        assert_eq!(Pipeline::Dt.prev(), Pipeline::Gb);
    }

    #[test]
    fn risk_level_bands() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.71), RiskLevel::High);
    }

    #[test]
    fn display_order_sorts_by_magnitude() {
        let attribution = FeatureAttribution::new(vec![
            ("DEBTINC".to_string(), 0.31),
            ("CLAGE".to_string(), -0.52),
            ("NINQ".to_string(), 0.10),
        ]);
        let names: Vec<&str> = attribution.display_order().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["CLAGE", "DEBTINC", "NINQ"]);
        assert_eq!(attribution.display_order()[0].1, -0.52);
        // The held sequence is untouched.
        assert_eq!(attribution.pairs()[0].0, "DEBTINC");
    }

    #[test]
    fn display_order_keeps_ties_in_service_order() {
        let attribution = FeatureAttribution::new(vec![
            ("A".to_string(), 0.2),
            ("B".to_string(), -0.2),
            ("C".to_string(), 0.5),
            ("D".to_string(), 0.2),
        ]);
        let names: Vec<&str> = attribution.display_order().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["C", "A", "B", "D"]);
    }

    #[test]
    fn attribution_decodes_from_pair_arrays() {
        let attribution: FeatureAttribution =
            serde_json::from_str(r#"[["DELINQ > 0", 0.12], ["CLAGE <= 100", -0.3]]"#).unwrap();
        assert_eq!(attribution.len(), 2);
        assert_eq!(attribution.pairs()[1], ("CLAGE <= 100".to_string(), -0.3));
    }
}
