//! Command-line parsing for the HMEQ loan-default client.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! workflow and service code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::ConfigOverrides;
use crate::domain::{ApplicationInput, JobCategory, LoanReason, Pipeline, coerce_numeric};
use crate::workflow::Stage;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hmeq", version, about = "Loan default prediction client (HMEQ)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (default).
    Tui(TuiArgs),
    /// Score one application and print the results.
    ///
    /// Runs prediction, explanation, and advice in order, stopping at
    /// `--through` or at the first failure.
    Run(RunArgs),
    /// Check that the prediction service is reachable.
    Health(ServiceArgs),
    /// Explain a row of the service's held-out test set.
    ExplainSample(SampleArgs),
}

/// Service connection options (override `HMEQ_API_URL` / `HMEQ_TIMEOUT_SECS`).
#[derive(Debug, Args, Clone, Default)]
pub struct ServiceArgs {
    /// Base URL of the prediction service.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds (0 disables the timeout).
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl ServiceArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Initially selected model pipeline.
    #[arg(short = 'p', long, value_enum, default_value_t = Pipeline::Rf)]
    pub pipeline: Pipeline,
}

/// Last stage `hmeq run` should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Through {
    Prediction,
    Explanation,
    Advice,
}

impl Through {
    pub fn target_stage(self) -> Stage {
        match self {
            Through::Prediction => Stage::Predicted,
            Through::Explanation => Stage::Explained,
            Through::Advice => Stage::Advised,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    #[command(flatten)]
    pub application: ApplicationArgs,

    /// Model pipeline used for prediction and explanation.
    #[arg(short = 'p', long, value_enum, default_value_t = Pipeline::Rf)]
    pub pipeline: Pipeline,

    /// Stop after this stage.
    #[arg(long, value_enum, default_value_t = Through::Advice)]
    pub through: Through,

    /// Write the session report as JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Write the session report as Markdown.
    #[arg(long, value_name = "MD")]
    pub export_md: Option<PathBuf>,
}

/// Application fields. Flags override values read from `--input`.
///
/// Numeric flags accept any text; non-numeric input becomes 0.
#[derive(Debug, Args, Clone, Default)]
pub struct ApplicationArgs {
    /// Application JSON file using the service field names (LOAN, MORTDUE, ...).
    #[arg(short = 'i', long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Loan amount.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub loan: Option<f64>,
    /// Amount due on the existing mortgage.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub mortdue: Option<f64>,
    /// Current property value.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub value: Option<f64>,
    /// Reason for the loan.
    #[arg(long, value_enum)]
    pub reason: Option<LoanReason>,
    /// Job category.
    #[arg(long, value_enum)]
    pub job: Option<JobCategory>,
    /// Years at present job.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub yoj: Option<f64>,
    /// Number of major derogatory reports.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub derog: Option<f64>,
    /// Number of delinquent credit lines.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub delinq: Option<f64>,
    /// Age of oldest credit line in months.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub clage: Option<f64>,
    /// Number of recent credit inquiries.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub ninq: Option<f64>,
    /// Number of credit lines.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub clno: Option<f64>,
    /// Debt-to-income ratio.
    #[arg(long, value_parser = parse_numeric, allow_hyphen_values = true)]
    pub debtinc: Option<f64>,
}

impl ApplicationArgs {
    /// Apply explicitly given flags on top of `base`.
    pub fn apply_to(&self, base: ApplicationInput) -> ApplicationInput {
        ApplicationInput {
            loan: self.loan.unwrap_or(base.loan),
            mortdue: self.mortdue.unwrap_or(base.mortdue),
            value: self.value.unwrap_or(base.value),
            reason: self.reason.unwrap_or(base.reason),
            job: self.job.unwrap_or(base.job),
            yoj: self.yoj.unwrap_or(base.yoj),
            derog: self.derog.unwrap_or(base.derog),
            delinq: self.delinq.unwrap_or(base.delinq),
            clage: self.clage.unwrap_or(base.clage),
            ninq: self.ninq.unwrap_or(base.ninq),
            clno: self.clno.unwrap_or(base.clno),
            debtinc: self.debtinc.unwrap_or(base.debtinc),
        }
    }
}

fn parse_numeric(raw: &str) -> Result<f64, String> {
    Ok(coerce_numeric(raw))
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Model pipeline to explain with.
    #[arg(short = 'p', long, value_enum, default_value_t = Pipeline::Rf)]
    pub pipeline: Pipeline,

    /// Row index in the service's test set.
    #[arg(long)]
    pub index: usize,
}
