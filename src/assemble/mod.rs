//! Response assembly: execution results become history entries plus a
//! render action for the terminal. Replay works entirely from stored
//! entries; a snippet is never re-executed.

use anyhow::Result;
use polars::prelude::{AnyValue, DataFrame};

use crate::exec::{ErrorKind, ExecutionResult};
use crate::history::{decode_plot, EntryRole, HistoryEntry, Payload};

/// What the host should put on screen for one assistant turn.
#[derive(Debug)]
pub enum RenderAction {
    Text(String),
    Error(String),
    Frame(DataFrame),
    Grid {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Plot(Vec<u8>),
}

/// Convert one execution result into its persisted entry and its render
/// action. The snippet rides along on plot entries so a transcript shows
/// what produced the image.
pub fn assemble(result: ExecutionResult, snippet: Option<String>) -> (HistoryEntry, RenderAction) {
    match result {
        ExecutionResult::Plot(bytes) => {
            let entry = HistoryEntry::assistant_plot(&bytes, snippet);
            (entry, RenderAction::Plot(bytes))
        }
        ExecutionResult::Tabular(df) => {
            let (columns, rows) = frame_to_grid(&df);
            let entry = HistoryEntry::assistant_tabular(columns, rows);
            (entry, RenderAction::Frame(df))
        }
        ExecutionResult::Text(text) => {
            let shown = if text.is_empty() {
                "(no output)".to_string()
            } else {
                text
            };
            (HistoryEntry::assistant_text(&shown), RenderAction::Text(shown))
        }
        ExecutionResult::Failure { kind, message } => {
            let shown = failure_text(kind, &message);
            (
                HistoryEntry::assistant_text(&shown),
                RenderAction::Error(shown),
            )
        }
    }
}

pub fn failure_text(kind: ErrorKind, message: &str) -> String {
    format!("could not answer ({}): {}", kind, message)
}

/// Rebuild a render action from a stored entry.
pub fn replay_action(entry: &HistoryEntry) -> Result<RenderAction> {
    let action = match &entry.payload {
        Payload::Text { text } => {
            if entry.role == EntryRole::User {
                RenderAction::Text(format!(">>> {}", text))
            } else {
                RenderAction::Text(text.clone())
            }
        }
        Payload::Tabular { columns, rows } => RenderAction::Grid {
            columns: columns.clone(),
            rows: rows.clone(),
        },
        Payload::Plot { image_b64, .. } => RenderAction::Plot(decode_plot(image_b64)?),
    };
    Ok(action)
}

fn frame_to_grid(df: &DataFrame) -> (Vec<String>, Vec<Vec<String>>) {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = df
            .get_columns()
            .iter()
            .map(|s| match s.get(i) {
                Ok(av) => cell_label(&av),
                Err(_) => String::new(),
            })
            .collect();
        rows.push(row);
    }
    (columns, rows)
}

fn cell_label(av: &AnyValue) -> String {
    match av {
        AnyValue::Utf8(v) => v.to_string(),
        AnyValue::Utf8Owned(v) => v.to_string(),
        AnyValue::Null => String::new(),
        other => other.to_string(),
    }
}
