//! Generated-snippet execution pipeline: extract, sandbox, classify.
//!
//! One call to [`Executor::execute`] resolves one user turn: the raw model
//! text is stripped down to a runnable snippet, run against the session
//! dataset under a fixed binding table, and the outcome is classified as
//! exactly one of plot, table, text, or failure. Failures never escape as
//! host errors; the session always accepts the next turn.

pub mod classify;
pub mod extract;
pub mod figure;
pub mod interp;
pub mod sandbox;

use std::fmt;
use std::time::Duration;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::config::Config;
use crate::dataset::Dataset;
use figure::Figure;

/// Turn-level failure taxonomy. All variants are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The extractor found nothing runnable in the model output.
    EmptyCode,
    /// The snippet raised during execution.
    ExecutionError,
    /// The figure could not be encoded.
    SerializationError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::EmptyCode => write!(f, "empty code"),
            ErrorKind::ExecutionError => write!(f, "execution error"),
            ErrorKind::SerializationError => write!(f, "serialization error"),
        }
    }
}

/// Exactly one per snippet execution.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Rendered figure bytes (SVG).
    Plot(Vec<u8>),
    /// A columnar value, structure preserved for grid rendering.
    Tabular(DataFrame),
    /// Captured stdout, trimmed. `Text("")` means "no visible output".
    Text(String),
    Failure { kind: ErrorKind, message: String },
}

impl ExecutionResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure { kind, message: message.into() }
    }
}

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub timeout: Duration,
    pub plot_width: u32,
    pub plot_height: u32,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            plot_width: 800,
            plot_height: 600,
        }
    }
}

impl ExecOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let defaults = Self::default();
        Self {
            timeout: cfg
                .get_u64("EXECUTION_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            plot_width: cfg
                .get_usize("PLOT_WIDTH")
                .map(|v| v as u32)
                .unwrap_or(defaults.plot_width),
            plot_height: cfg
                .get_usize("PLOT_HEIGHT")
                .map(|v| v as u32)
                .unwrap_or(defaults.plot_height),
        }
    }
}

/// Per-session execution context. Owns the plotting surface so that the
/// reset-before-run / clear-after-classify protocol has a single home.
pub struct Executor {
    figure: Figure,
    opts: ExecOptions,
}

impl Executor {
    pub fn new(opts: ExecOptions) -> Self {
        let figure = Figure::new(opts.plot_width, opts.plot_height);
        Self { figure, opts }
    }

    /// Resolve one turn. Strictly sequential per session.
    pub fn execute(&mut self, raw_text: &str, dataset: &Dataset) -> ExecutionResult {
        let snippet = match extract::extract_snippet(raw_text) {
            Some(s) => s,
            None => {
                return ExecutionResult::failure(
                    ErrorKind::EmptyCode,
                    "the model returned no runnable code",
                )
            }
        };
        debug!(snippet = %snippet, "executing snippet");

        let sandbox = sandbox::Sandbox::new(dataset, &mut self.figure, self.opts.timeout);
        match sandbox.run(&snippet) {
            Ok(outcome) => classify::classify(outcome, &mut self.figure),
            Err(message) => {
                // Leave no undrained content for the next turn.
                self.figure.clear();
                ExecutionResult::failure(ErrorKind::ExecutionError, message)
            }
        }
    }
}
