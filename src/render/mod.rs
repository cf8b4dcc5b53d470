//! Printers: text, markdown (termimad), data grids, and plot export.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use polars::prelude::DataFrame;
use termimad::MadSkin;
use tracing::info;

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        if let Some(c) = self.color {
            match c {
                "green" => println!("{}", text.green()),
                "cyan" => println!("{}", text.cyan()),
                "magenta" => println!("{}", text.magenta()),
                "yellow" => println!("{}", text.yellow()),
                "red" => println!("{}", text.red()),
                _ => println!("{}", text),
            }
        } else {
            println!("{}", text);
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
    pub width: usize,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default(), width: 100 }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

/// Print a frame as the grid polars renders (column headers, dtypes, rows).
pub fn print_frame(df: &DataFrame) {
    println!("{}", df);
}

/// Print a tabular history payload without reconstructing a frame.
pub fn print_grid(columns: &[String], rows: &[Vec<String>]) {
    println!("{}", columns.join(" | "));
    for row in rows {
        println!("{}", row.join(" | "));
    }
}

/// Write plot bytes to the export directory and return the path.
pub fn export_plot(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create plot directory {}", dir.display()))?;
    let path = dir.join(filename);
    fs::write(&path, bytes)
        .with_context(|| format!("failed to write plot {}", path.display()))?;
    info!(path = %path.display(), "plot saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn export_plot_writes_the_file() {
        let dir = tempdir().unwrap();
        let path = export_plot(dir.path(), "chat-0.svg", b"<svg/>").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"<svg/>");
    }

    #[test]
    fn export_plot_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = export_plot(&nested, "p.svg", b"x").unwrap();
        assert!(path.exists());
    }
}
