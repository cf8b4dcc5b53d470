use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use is_terminal::IsTerminal;

use dfchat::assemble::{replay_action, RenderAction};
use dfchat::config::Config;
use dfchat::history::{plot_filename, EntryRole, HistoryStore, Payload};
use dfchat::render::{self, MarkdownPrinter, TextPrinter};
use dfchat::{cli, handlers};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = cli::Cli::parse();
    let cfg = Config::load();

    // Resolve model: CLI overrides config; fall back to DEFAULT_MODEL
    let effective_model = args
        .model
        .clone()
        .or_else(|| cfg.get("DEFAULT_MODEL"))
        .unwrap_or_else(|| "gpt-4o".to_string());

    // stdin handling (pipe support: piped text becomes part of the prompt)
    let mut prompt_from_stdin = String::new();
    let stdin_is_tty = io::stdin().is_terminal();
    if !stdin_is_tty && args.repl.is_none() {
        io::stdin().read_to_string(&mut prompt_from_stdin)?;
    }
    let arg_prompt = args.prompt.clone().unwrap_or_default();
    let prompt = if !prompt_from_stdin.is_empty() && !arg_prompt.is_empty() {
        format!("{}\n\n{}", prompt_from_stdin.trim(), arg_prompt)
    } else if !prompt_from_stdin.is_empty() {
        prompt_from_stdin.trim().to_string()
    } else {
        arg_prompt
    };

    let md = if args.no_md {
        false
    } else if args.md {
        true
    } else {
        cfg.get_bool("PRETTIFY_MARKDOWN")
    };
    let caching = if args.no_cache {
        false
    } else {
        true // default enabled, --cache is the explicit form
    };

    // Transcript shortcuts need no CSV
    if let Some(id) = &args.show_chat {
        return show_chat(&cfg, id, md);
    }
    if args.list_chats {
        let store = HistoryStore::from_config(&cfg);
        for id in store.list()? {
            println!("{}", id);
        }
        return Ok(());
    }

    let csv_path = args
        .file
        .as_deref()
        .map(Path::new)
        .ok_or_else(|| anyhow!("no CSV provided; pass one with --file"))?;
    if !csv_path.exists() {
        bail!("CSV not found: {}", csv_path.display());
    }
    let plot_dir = args.plot_dir.as_deref().map(PathBuf::from);

    if args.schema {
        return handlers::schema::SchemaHandler::run(csv_path);
    }

    match (args.repl.as_deref(), args.chat.as_deref()) {
        (Some(repl_id), None) => {
            handlers::repl::ReplHandler::run(
                repl_id,
                if prompt.is_empty() { None } else { Some(prompt.as_str()) },
                csv_path,
                &effective_model,
                args.temperature,
                args.top_p,
                caching,
                plot_dir,
            )
            .await
        }
        (None, Some(chat_id)) => {
            if prompt.trim().is_empty() {
                bail!("provide a question after --chat or via stdin");
            }
            handlers::ask::AskHandler::run(
                chat_id,
                &prompt,
                csv_path,
                &effective_model,
                args.temperature,
                args.top_p,
                caching,
                plot_dir,
            )
            .await
        }
        (None, None) => {
            if prompt.trim().is_empty() {
                bail!("provide a question, or use --schema / --repl");
            }
            // One-shot questions run as a throwaway session.
            handlers::ask::AskHandler::run(
                "temp",
                &prompt,
                csv_path,
                &effective_model,
                args.temperature,
                args.top_p,
                caching,
                plot_dir,
            )
            .await
        }
        _ => Err(anyhow!("--chat and --repl cannot be used together")),
    }
}

fn show_chat(cfg: &Config, chat_id: &str, md: bool) -> Result<()> {
    let store = HistoryStore::from_config(cfg);
    if !store.exists(chat_id) {
        bail!("chat not found: {}", cfg.history_path().join(chat_id).display());
    }
    let entries = store.read(chat_id)?;

    if md {
        let mut text = String::new();
        for entry in &entries {
            let role = match entry.role {
                EntryRole::User => "user",
                EntryRole::Assistant => "assistant",
            };
            let body = match &entry.payload {
                Payload::Text { text } => text.clone(),
                Payload::Tabular { columns, rows } => {
                    let mut t = format!("| {} |\n", columns.join(" | "));
                    t.push_str(&format!(
                        "|{}\n",
                        "---|".repeat(columns.len())
                    ));
                    for row in rows {
                        t.push_str(&format!("| {} |\n", row.join(" | ")));
                    }
                    t
                }
                Payload::Plot { image_b64, .. } => {
                    format!("*(chart, {} bytes)*", image_b64.len() * 3 / 4)
                }
            };
            text.push_str(&format!("### {}\n\n{}\n\n", role, body));
        }
        MarkdownPrinter::default().print(&text);
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        match replay_action(entry)? {
            RenderAction::Plot(bytes) => {
                let name = plot_filename(chat_id, i);
                let path = render::export_plot(&cfg.plot_dir(), &name, &bytes)?;
                TextPrinter { color: Some("cyan") }
                    .print(&format!("chart saved to {}", path.display()));
            }
            RenderAction::Text(text) => TextPrinter { color: Some("green") }.print(&text),
            RenderAction::Error(text) => TextPrinter { color: Some("red") }.print(&text),
            RenderAction::Frame(df) => render::print_frame(&df),
            RenderAction::Grid { columns, rows } => render::print_grid(&columns, &rows),
        }
    }
    Ok(())
}
