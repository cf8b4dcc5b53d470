//! End-to-end pipeline tests: raw model text in, classified result out.

use std::io::Write as _;

use dfchat::dataset::Dataset;
use dfchat::exec::{ErrorKind, ExecOptions, ExecutionResult, Executor};
use tempfile::NamedTempFile;

fn sales_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp csv");
    writeln!(file, "amount,city").unwrap();
    writeln!(file, "10,berlin").unwrap();
    writeln!(file, "20,paris").unwrap();
    writeln!(file, "30,berlin").unwrap();
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile) -> Dataset {
    Dataset::load_csv(file.path()).expect("load csv")
}

#[test]
fn printed_mean_comes_back_as_text() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    let raw = "```python\nprint(df[\"amount\"].mean())\n```";
    match executor.execute(raw, &ds) {
        ExecutionResult::Text(t) => assert_eq!(t, "20.0"),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn histogram_snippet_comes_back_as_plot() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    let raw = "plt.hist(df[\"amount\"], bins=5)\nplt.title(\"Amounts\")\nplt.show()";
    match executor.execute(raw, &ds) {
        ExecutionResult::Plot(bytes) => {
            assert!(!bytes.is_empty());
            assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
        }
        other => panic!("expected plot, got {:?}", other),
    }
}

#[test]
fn describe_comes_back_as_tabular() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    match executor.execute("df.describe()", &ds) {
        ExecutionResult::Tabular(df) => assert!(df.height() > 0),
        other => panic!("expected tabular, got {:?}", other),
    }
}

#[test]
fn raise_comes_back_as_execution_error_with_inner_message() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    match executor.execute("raise ValueError(\"bad\")", &ds) {
        ExecutionResult::Failure { kind, message } => {
            assert_eq!(kind, ErrorKind::ExecutionError);
            assert_eq!(message, "bad");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn empty_model_output_is_an_empty_code_failure() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    match executor.execute("```python\n```", &ds) {
        ExecutionResult::Failure { kind, .. } => assert_eq!(kind, ErrorKind::EmptyCode),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn plot_wins_over_printed_text_and_trailing_frames() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    let raw = "print('hello')\nplt.bar([\"a\", \"b\"], [1, 2])\ndf.describe()";
    assert!(matches!(
        executor.execute(raw, &ds),
        ExecutionResult::Plot(_)
    ));
}

#[test]
fn turns_do_not_bleed_into_each_other() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    // First turn draws; second turn must not inherit the figure or fail.
    assert!(matches!(
        executor.execute("plt.hist(df[\"amount\"])", &ds),
        ExecutionResult::Plot(_)
    ));
    match executor.execute("print(df[\"amount\"].sum())", &ds) {
        ExecutionResult::Text(t) => assert_eq!(t, "60.0"),
        other => panic!("expected text, got {:?}", other),
    }

    // A failing turn leaves the session usable too.
    assert!(matches!(
        executor.execute("raise ValueError(\"boom\")", &ds),
        ExecutionResult::Failure { .. }
    ));
    assert!(matches!(
        executor.execute("print(len(df))", &ds),
        ExecutionResult::Text(t) if t == "3"
    ));
}

#[test]
fn dataset_is_never_mutated_by_a_turn() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    let before = ds.frame().clone();
    let _ = executor.execute("x = df[\"amount\"].mean()\nprint(x * 2)", &ds);
    let _ = executor.execute("plt.scatter(df[\"amount\"], df[\"amount\"])", &ds);
    assert!(ds.frame().frame_equal(&before));
}

#[test]
fn variables_and_imports_behave_like_the_prompted_surface() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    let raw = "import pandas as pd\n# average per row\navg = df[\"amount\"].sum() / len(df)\nprint(avg)";
    match executor.execute(raw, &ds) {
        ExecutionResult::Text(t) => assert_eq!(t, "20.0"),
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn unknown_column_is_a_recoverable_execution_error() {
    let file = sales_csv();
    let ds = load(&file);
    let mut executor = Executor::new(ExecOptions::default());

    match executor.execute("print(df[\"missing\"].mean())", &ds) {
        ExecutionResult::Failure { kind, message } => {
            assert_eq!(kind, ErrorKind::ExecutionError);
            assert!(message.contains("missing"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}
