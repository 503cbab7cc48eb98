//! `hmeq-client` library crate.
//!
//! The binary (`hmeq`) is a thin wrapper around this library so that the
//! workflow, service client, and report formatting are testable without a
//! terminal or a live prediction service.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod service;
pub mod tui;
pub mod workflow;
