//! One-shot and persisted-chat question handler.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::handlers::session::Session;

pub struct AskHandler;

impl AskHandler {
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        chat_id: &str,
        prompt: &str,
        csv_path: &Path,
        model: &str,
        temperature: f32,
        top_p: f32,
        caching: bool,
        plot_dir: Option<PathBuf>,
    ) -> Result<()> {
        let cfg = Config::load();
        let mut session = Session::open(
            &cfg, csv_path, chat_id, model, temperature, top_p, caching, plot_dir,
        )?;
        session.turn(prompt).await
    }
}
