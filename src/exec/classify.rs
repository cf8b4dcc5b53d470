//! Outcome classification: plot beats table beats text.
//!
//! Exactly one [`ExecutionResult`] per run. The figure is drained here
//! no matter what happened, so the next turn always starts blank.

use tracing::debug;

use super::figure::Figure;
use super::sandbox::SandboxOutcome;
use super::{ErrorKind, ExecutionResult};

pub fn classify(outcome: SandboxOutcome, figure: &mut Figure) -> ExecutionResult {
    if figure.has_content() {
        let rendered = figure.render();
        figure.clear();
        return match rendered {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "classified as plot");
                ExecutionResult::Plot(bytes)
            }
            Err(e) => ExecutionResult::failure(
                ErrorKind::SerializationError,
                format!("failed to encode figure: {}", e),
            ),
        };
    }
    figure.clear();

    if let Some(df) = outcome.last_frame {
        debug!(rows = df.height(), "classified as tabular");
        return ExecutionResult::Tabular(df);
    }

    ExecutionResult::Text(outcome.stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::figure::PlotCmd;
    use polars::df;
    use polars::prelude::NamedFrom;

    fn outcome(stdout: &str, last_frame: Option<polars::prelude::DataFrame>) -> SandboxOutcome {
        SandboxOutcome { stdout: stdout.to_string(), last_frame }
    }

    #[test]
    fn drawn_figure_wins_over_everything() {
        let mut fig = Figure::new(200, 150);
        fig.push(PlotCmd::Line { xs: vec![0.0, 1.0], ys: vec![1.0, 2.0] });
        let frame = df!("a" => &[1i64]).unwrap();
        let result = classify(outcome("printed text\n", Some(frame)), &mut fig);
        assert!(matches!(result, ExecutionResult::Plot(_)));
        assert!(!fig.has_content());
    }

    #[test]
    fn trailing_frame_classifies_as_tabular() {
        let mut fig = Figure::new(200, 150);
        let frame = df!("a" => &[1i64, 2]).unwrap();
        let result = classify(outcome("", Some(frame)), &mut fig);
        match result {
            ExecutionResult::Tabular(df) => assert_eq!(df.height(), 2),
            other => panic!("expected tabular, got {:?}", other),
        }
    }

    #[test]
    fn stdout_classifies_as_trimmed_text() {
        let mut fig = Figure::new(200, 150);
        let result = classify(outcome("20.0\n", None), &mut fig);
        assert!(matches!(result, ExecutionResult::Text(t) if t == "20.0"));
    }

    #[test]
    fn silent_run_is_empty_text_not_failure() {
        let mut fig = Figure::new(200, 150);
        let result = classify(outcome("", None), &mut fig);
        assert!(matches!(result, ExecutionResult::Text(t) if t.is_empty()));
    }

    #[test]
    fn title_only_figure_does_not_classify_as_plot() {
        let mut fig = Figure::new(200, 150);
        fig.set_title("just a title");
        let result = classify(outcome("hello\n", None), &mut fig);
        assert!(matches!(result, ExecutionResult::Text(t) if t == "hello"));
    }
}
