//! REPL handler: a line-oriented loop over one CSV session.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::handlers::session::Session;

pub struct ReplHandler;

impl ReplHandler {
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        chat_id: &str,
        init_prompt: Option<&str>,
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

        println!(
            "{}",
            format!(
                "Entering REPL over {} ({} rows). Type \"exit\" or \"quit\" to leave, \"schema\" for columns.",
                session.dataset().name(),
                session.dataset().height()
            )
            .cyan()
        );
        // Show where a resumed conversation left off.
        session.replay()?;

        if let Some(prompt) = init_prompt {
            if !prompt.trim().is_empty() {
                session.turn(prompt).await?;
            }
        }

        let stdin = io::stdin();
        loop {
            print!(">>> ");
            io::stdout().flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break; // EOF
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line {
                "exit" | "quit" => break,
                "schema" => {
                    let rows = cfg.get_usize("PREVIEW_ROWS").unwrap_or(5);
                    println!("{}", session.dataset().schema_preview(rows));
                }
                prompt => {
                    if let Err(e) = session.turn(prompt).await {
                        eprintln!("{}", format!("error: {}", e).red());
                    }
                }
            }
        }
        Ok(())
    }
}
