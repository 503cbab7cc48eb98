//! Read an application record from a JSON file.
//!
//! The file uses the service's wire names (`LOAN`, `MORTDUE`, ...). Missing
//! numeric fields default to zero, mirroring an untouched form.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{ApplicationInput, JobCategory, LoanReason};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct ApplicationFile {
    #[serde(default)]
    loan: f64,
    #[serde(default)]
    mortdue: f64,
    #[serde(default)]
    value: f64,
    #[serde(default)]
    reason: LoanReason,
    #[serde(default)]
    job: JobCategory,
    #[serde(default)]
    yoj: f64,
    #[serde(default)]
    derog: f64,
    #[serde(default)]
    delinq: f64,
    #[serde(default)]
    clage: f64,
    #[serde(default)]
    ninq: f64,
    #[serde(default)]
    clno: f64,
    #[serde(default)]
    debtinc: f64,
}

impl From<ApplicationFile> for ApplicationInput {
    fn from(f: ApplicationFile) -> Self {
        ApplicationInput {
            loan: f.loan,
            mortdue: f.mortdue,
            value: f.value,
            reason: f.reason,
            job: f.job,
            yoj: f.yoj,
            derog: f.derog,
            delinq: f.delinq,
            clage: f.clage,
            ninq: f.ninq,
            clno: f.clno,
            debtinc: f.debtinc,
        }
        .sanitized()
    }
}

pub fn read_application_json(path: &Path) -> Result<ApplicationInput, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open application JSON '{}': {e}", path.display())))?;
    parse_application(file)
        .map_err(|e| AppError::usage(format!("Invalid application JSON '{}': {e}", path.display())))
}

fn parse_application<R: std::io::Read>(reader: R) -> Result<ApplicationInput, serde_json::Error> {
    let raw: ApplicationFile = serde_json::from_reader(reader)?;
    Ok(raw.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_and_defaults_missing_fields() {
        let json = r#"{"LOAN": 12000, "REASON": "DebtCon", "JOB": "Self", "DEBTINC": 29.5}"#;
        let input = parse_application(json.as_bytes()).unwrap();
        assert_eq!(input.loan, 12000.0);
        assert_eq!(input.reason, LoanReason::DebtCon);
        assert_eq!(input.job, JobCategory::SelfEmployed);
        assert_eq!(input.debtinc, 29.5);
        assert_eq!(input.mortdue, 0.0);
        assert_eq!(input.clno, 0.0);
    }

    #[test]
    fn rejects_unknown_categories() {
        let json = r#"{"JOB": "Astronaut"}"#;
        assert!(parse_application(json.as_bytes()).is_err());
    }

    #[test]
    fn missing_file_is_usage_error() {
        let err = read_application_json(Path::new("does/not/exist.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
