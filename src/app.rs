//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration and sets up logging
//! - dispatches to the TUI or a one-shot command
//! - prints reports and writes optional exports

use clap::Parser;

use crate::cli::{Command, RunArgs, SampleArgs, ServiceArgs, TuiArgs};
use crate::config::ServiceConfig;
use crate::domain::ApplicationInput;
use crate::error::AppError;
use crate::io::export::{SessionReport, write_session_json, write_session_markdown};
use crate::logging::{self, LogTarget};
use crate::service::{HttpService, PredictionService};

pub mod pipeline;

/// Entry point for the `hmeq` binary.
pub fn run() -> Result<(), AppError> {
    // `hmeq` and `hmeq -p gb` should behave like `hmeq tui ...`. Clap requires
    // a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Run(args) => handle_run(args),
        Command::Health(args) => handle_health(args),
        Command::ExplainSample(args) => handle_explain_sample(args),
    }
}

fn connect(args: &ServiceArgs, log_target: impl FnOnce(&ServiceConfig) -> LogTarget) -> Result<HttpService, AppError> {
    let config = ServiceConfig::from_env(&args.overrides())?;
    logging::init(log_target(&config))?;
    log::info!("service: {}", config.base_url);
    HttpService::new(&config)
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let service = connect(&args.service, |cfg| LogTarget::for_tui(cfg.log_file.clone()))?;
    crate::tui::run(service, args.pipeline)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let base = match &args.application.input {
        Some(path) => crate::io::read_application_json(path)?,
        None => ApplicationInput::default(),
    };
    let input = args.application.apply_to(base);

    let service = connect(&args.service, |_| LogTarget::Stderr)?;
    let (workflow, outcome) =
        pipeline::score_application(service, input, args.pipeline, args.through.target_stage());

    println!("{}", crate::report::format_session(workflow.state()));

    let report = SessionReport::from_state(workflow.state());
    if let Some(path) = &args.export_json {
        write_session_json(path, &report)?;
    }
    if let Some(path) = &args.export_md {
        write_session_markdown(path, &report)?;
    }

    match outcome.failed {
        Some(kind) => Err(AppError::runtime(format!(
            "{} request failed: {}",
            kind.display_name(),
            workflow.error().unwrap_or("unknown error")
        ))),
        None => Ok(()),
    }
}

fn handle_health(args: ServiceArgs) -> Result<(), AppError> {
    let service = connect(&args, |_| LogTarget::Stderr)?;
    let message = service
        .health()
        .map_err(|e| AppError::runtime(format!("Service at {} is unreachable: {e}", service.base_url())))?;
    println!("{}: {message}", service.base_url());
    Ok(())
}

fn handle_explain_sample(args: SampleArgs) -> Result<(), AppError> {
    let service = connect(&args.service, |_| LogTarget::Stderr)?;
    let attribution = service
        .explain_sample(args.pipeline, args.index)
        .map_err(|e| AppError::runtime(format!("explanation request failed: {e}")))?;
    println!(
        "Test-set row {} ({}):\n{}",
        args.index,
        args.pipeline.display_name(),
        crate::report::format_attribution(&attribution)
    );
    Ok(())
}

/// Rewrite argv so `hmeq` defaults to `hmeq tui`.
///
/// Rules:
/// - `hmeq`                      -> `hmeq tui`
/// - `hmeq -p gb ...`            -> `hmeq tui -p gb ...`
/// - `hmeq --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "run" | "health" | "explain-sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
