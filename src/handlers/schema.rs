//! Schema handler: print the CSV shape locally, no model involved.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::dataset::Dataset;

pub struct SchemaHandler;

impl SchemaHandler {
    pub fn run(csv_path: &Path) -> Result<()> {
        let cfg = Config::load();
        let rows = cfg.get_usize("PREVIEW_ROWS").unwrap_or(5);
        let dataset = Dataset::load_csv(csv_path)?;
        println!("{}", dataset.schema_preview(rows));
        Ok(())
    }
}
