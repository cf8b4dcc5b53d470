//! Session dataset: a CSV loaded once into a polars DataFrame, read-only afterwards.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// In-memory tabular dataset for one chat session.
///
/// The executor only ever reads from it; every aggregate returns a fresh
/// value and the underlying frame is never mutated after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    name: String,
}

impl Dataset {
    pub fn load_csv(path: &Path) -> Result<Self> {
        let df = LazyCsvReader::new(path)
            .has_header(true)
            .finish()
            .with_context(|| format!("failed to open CSV {}", path.display()))?
            .collect()
            .with_context(|| format!("failed to load CSV {}", path.display()))?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { df, name })
    }

    pub fn from_frame(df: DataFrame, name: impl Into<String>) -> Self {
        Self { df, name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .with_context(|| format!("unknown column '{}'", name))
    }

    /// Column values as f64, nulls dropped. Errors on non-numeric columns.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        let s = self.column(name)?;
        let casted = s
            .cast(&DataType::Float64)
            .with_context(|| format!("column '{}' is not numeric", name))?;
        Ok(casted.f64()?.into_no_null_iter().collect())
    }

    /// Column values rendered as display labels (for categorical axes).
    pub fn label_values(&self, name: &str) -> Result<Vec<String>> {
        let s = self.column(name)?;
        Ok(s.iter().map(|av| any_value_label(&av)).collect())
    }

    pub fn mean(&self, name: &str) -> Result<f64> {
        self.column(name)?
            .mean()
            .with_context(|| format!("column '{}' has no numeric mean", name))
    }

    pub fn sum(&self, name: &str) -> Result<f64> {
        self.column(name)?
            .sum::<f64>()
            .with_context(|| format!("column '{}' has no numeric sum", name))
    }

    pub fn min(&self, name: &str) -> Result<f64> {
        self.lazy_scalar(col(name).min(), name)
    }

    pub fn max(&self, name: &str) -> Result<f64> {
        self.lazy_scalar(col(name).max(), name)
    }

    pub fn std(&self, name: &str) -> Result<f64> {
        self.lazy_scalar(col(name).std(1), name)
    }

    pub fn median(&self, name: &str) -> Result<f64> {
        self.lazy_scalar(col(name).median(), name)
    }

    /// Non-null value count.
    pub fn count(&self, name: &str) -> Result<usize> {
        let s = self.column(name)?;
        Ok(s.len() - s.null_count())
    }

    pub fn n_unique(&self, name: &str) -> Result<usize> {
        Ok(self.column(name)?.n_unique()?)
    }

    pub fn describe(&self) -> Result<DataFrame> {
        Ok(self.df.describe(None)?)
    }

    pub fn head(&self, n: usize) -> DataFrame {
        self.df.head(Some(n))
    }

    pub fn tail(&self, n: usize) -> DataFrame {
        self.df.tail(Some(n))
    }

    /// Schema plus a small sample, injected into the analyst system prompt.
    pub fn schema_preview(&self, rows: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "File: {} ({} rows x {} columns)",
            self.name,
            self.height(),
            self.width()
        );
        let _ = writeln!(out, "Columns:");
        for s in self.df.get_columns() {
            let _ = writeln!(out, "  - {} ({})", s.name(), s.dtype());
        }
        let _ = writeln!(out, "First {} rows:\n{}", rows, self.head(rows));
        out
    }

    fn lazy_scalar(&self, expr: Expr, name: &str) -> Result<f64> {
        let out = self.df.clone().lazy().select([expr]).collect()?;
        let s = out
            .get_columns()
            .first()
            .with_context(|| format!("aggregate on '{}' returned nothing", name))?;
        let casted = s
            .cast(&DataType::Float64)
            .with_context(|| format!("column '{}' is not numeric", name))?;
        casted
            .f64()?
            .get(0)
            .with_context(|| format!("aggregate on '{}' produced no value", name))
    }
}

fn any_value_label(av: &AnyValue) -> String {
    match av {
        AnyValue::Utf8(v) => v.to_string(),
        AnyValue::Utf8Owned(v) => v.to_string(),
        AnyValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn amounts() -> Dataset {
        let frame = df!("amount" => &[10i64, 20, 30]).unwrap();
        Dataset::from_frame(frame, "amounts.csv")
    }

    #[test]
    fn mean_of_amount_column() {
        let ds = amounts();
        assert_eq!(ds.mean("amount").unwrap(), 20.0);
    }

    #[test]
    fn aggregates_over_amount() {
        let ds = amounts();
        assert_eq!(ds.sum("amount").unwrap(), 60.0);
        assert_eq!(ds.min("amount").unwrap(), 10.0);
        assert_eq!(ds.max("amount").unwrap(), 30.0);
        assert_eq!(ds.count("amount").unwrap(), 3);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let ds = amounts();
        assert!(ds.mean("missing").is_err());
    }

    #[test]
    fn describe_summarizes_all_columns() {
        let ds = amounts();
        let summary = ds.describe().unwrap();
        assert!(summary.height() > 0);
    }

    #[test]
    fn schema_preview_names_columns() {
        let ds = amounts();
        let preview = ds.schema_preview(3);
        assert!(preview.contains("amount"));
        assert!(preview.contains("3 rows"));
    }
}
