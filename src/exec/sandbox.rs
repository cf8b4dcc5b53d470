//! Constrained snippet runner.
//!
//! The sandbox owns the statement loop: it resets the plotting surface,
//! walks the snippet line by line under a wall-clock deadline, and stops
//! at the first failing statement. Errors are plain strings; the caller
//! maps them into the turn-level failure taxonomy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use polars::prelude::DataFrame;

use super::figure::Figure;
use super::interp::{Interp, Value};
use crate::dataset::Dataset;

/// What a successful run leaves behind for classification.
#[derive(Debug)]
pub struct SandboxOutcome {
    /// Everything `print(...)` emitted, in order.
    pub stdout: String,
    /// The value of the last bare expression, if any was tabular.
    pub last_frame: Option<DataFrame>,
}

pub struct Sandbox<'a> {
    dataset: &'a Dataset,
    figure: &'a mut Figure,
    deadline: Instant,
}

impl<'a> Sandbox<'a> {
    pub fn new(dataset: &'a Dataset, figure: &'a mut Figure, timeout: Duration) -> Self {
        Self {
            dataset,
            figure,
            deadline: Instant::now() + timeout,
        }
    }

    /// Run a snippet to completion or first error.
    ///
    /// The figure is cleared up front so one turn can never inherit drawn
    /// content from a previous one.
    pub fn run(self, snippet: &str) -> Result<SandboxOutcome, String> {
        self.figure.clear();

        let mut vars: HashMap<String, Value> = HashMap::new();
        let mut stdout = String::new();
        let mut last_frame: Option<DataFrame> = None;

        for line in snippet.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with("import ")
                || trimmed.starts_with("from ")
            {
                continue;
            }
            if Instant::now() > self.deadline {
                return Err("execution timed out before completing".to_string());
            }

            let mut interp = Interp::new(self.dataset, self.figure, &mut vars, &mut stdout);
            match interp.exec_stmt(trimmed)? {
                Some(Value::Frame(df)) => last_frame = Some(df),
                Some(Value::DatasetRef) => last_frame = Some(self.dataset.frame().clone()),
                Some(Value::Column(name)) => {
                    let series = self
                        .dataset
                        .column(&name)
                        .map_err(|e| e.to_string())?
                        .clone();
                    last_frame = Some(DataFrame::new(vec![series]).map_err(|e| e.to_string())?);
                }
                Some(_) | None => last_frame = None,
            }
        }

        Ok(SandboxOutcome { stdout, last_frame })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::prelude::NamedFrom;

    fn dataset() -> Dataset {
        let frame = df!("amount" => &[10i64, 20, 30]).unwrap();
        Dataset::from_frame(frame, "test.csv")
    }

    #[test]
    fn stdout_is_captured_in_order() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(5));
        let out = sandbox
            .run("print('a')\nprint('b')")
            .unwrap();
        assert_eq!(out.stdout, "a\nb\n");
    }

    #[test]
    fn comments_and_imports_are_skipped() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(5));
        let out = sandbox
            .run("import pandas as pd\n# a comment\nfrom math import sqrt\nprint(1)")
            .unwrap();
        assert_eq!(out.stdout, "1\n");
    }

    #[test]
    fn figure_is_reset_between_runs() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        Sandbox::new(&ds, &mut fig, Duration::from_secs(5))
            .run("plt.hist(df[\"amount\"])")
            .unwrap();
        assert!(fig.has_content());
        Sandbox::new(&ds, &mut fig, Duration::from_secs(5))
            .run("print(1)")
            .unwrap();
        assert!(!fig.has_content());
    }

    #[test]
    fn first_error_stops_the_run() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(5));
        let err = sandbox
            .run("print('before')\nraise ValueError(\"bad\")\nprint('after')")
            .unwrap_err();
        assert_eq!(err, "bad");
    }

    #[test]
    fn past_deadline_fails_with_timeout() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(0));
        let err = sandbox.run("print(1)").unwrap_err();
        assert!(err.contains("timed out"));
    }

    #[test]
    fn trailing_frame_expression_is_kept() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(5));
        let out = sandbox.run("df.describe()").unwrap();
        assert!(out.last_frame.is_some());
    }

    #[test]
    fn non_frame_trailing_expression_clears_the_candidate() {
        let ds = dataset();
        let mut fig = Figure::new(100, 100);
        let sandbox = Sandbox::new(&ds, &mut fig, Duration::from_secs(5));
        let out = sandbox.run("df.describe()\nprint('done')").unwrap();
        assert!(out.last_frame.is_none());
    }
}
