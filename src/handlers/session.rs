//! A chat session: one dataset, one history, one executor.
//!
//! Both the one-shot handler and the REPL drive turns through here so
//! the persistence and rendering rules stay in one place.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::assemble::{assemble, replay_action, RenderAction};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::exec::{extract::extract_snippet, ExecOptions, Executor};
use crate::history::{plot_filename, HistoryEntry, HistoryStore, Payload, RequestCache};
use crate::llm::{ChatMessage, ChatOptions, LlmClient, Role};
use crate::render::{export_plot, print_frame, print_grid, TextPrinter};
use crate::role::analyst_role_text;

pub struct Session {
    dataset: Dataset,
    client: LlmClient,
    store: HistoryStore,
    cache: RequestCache,
    executor: Executor,
    chat_id: String,
    opts: ChatOptions,
    caching: bool,
    plot_dir: PathBuf,
}

impl Session {
    pub fn open(
        cfg: &Config,
        csv_path: &Path,
        chat_id: &str,
        model: &str,
        temperature: f32,
        top_p: f32,
        caching: bool,
        plot_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let dataset = Dataset::load_csv(csv_path)?;
        let client = LlmClient::from_config(cfg)?;
        let store = HistoryStore::from_config(cfg);
        let cache = RequestCache::from_config(cfg);
        let executor = Executor::new(ExecOptions::from_config(cfg));

        // temp chat id shouldn't persist across invocations
        if chat_id == "temp" {
            store.invalidate(chat_id)?;
        }

        Ok(Self {
            dataset,
            client,
            store,
            cache,
            executor,
            chat_id: chat_id.to_string(),
            opts: ChatOptions {
                model: model.to_string(),
                temperature,
                top_p,
            },
            caching,
            plot_dir: plot_dir.unwrap_or_else(|| cfg.plot_dir()),
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run one question end to end: ask the model for a snippet, execute
    /// it, render the outcome, persist the turn.
    pub async fn turn(&mut self, prompt: &str) -> Result<()> {
        let history = self.store.read(&self.chat_id)?;
        let messages = self.build_messages(&history, prompt);

        let raw = self.completion(messages).await?;
        debug!(chars = raw.len(), "model replied");

        let snippet = extract_snippet(&raw);
        let result = self.executor.execute(&raw, &self.dataset);
        let (entry, action) = assemble(result, snippet);

        // Plots get a stable sequence number from their position in history.
        let seq = history.len() + 1;
        self.render(&action, seq)?;

        if self.chat_id != "temp" {
            self.store.append(
                &self.chat_id,
                vec![HistoryEntry::user(prompt), entry],
            )?;
        }
        Ok(())
    }

    /// Print the stored transcript. Never re-executes a snippet; plots
    /// come back from their stored bytes.
    pub fn replay(&self) -> Result<()> {
        let entries = self.store.read(&self.chat_id)?;
        for (i, entry) in entries.iter().enumerate() {
            let action = replay_action(entry)?;
            self.render(&action, i)?;
        }
        Ok(())
    }

    fn build_messages(&self, history: &[HistoryEntry], prompt: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new(
            Role::System,
            analyst_role_text(&self.dataset),
        )];
        for entry in history {
            messages.push(entry_to_message(entry));
        }
        messages.push(ChatMessage::new(Role::User, prompt));
        messages
    }

    async fn completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let key = self.cache.key_for(
            &self.opts.model,
            &serde_json::to_string(&messages)?,
        );
        if self.caching {
            if let Some(text) = self.cache.get(&key) {
                debug!("completion served from cache");
                return Ok(text);
            }
        }
        let text = self.client.complete(messages, self.opts.clone()).await?;
        if self.caching && !text.is_empty() {
            let _ = self.cache.set(&key, &text);
        }
        Ok(text)
    }

    fn render(&self, action: &RenderAction, seq: usize) -> Result<()> {
        match action {
            RenderAction::Text(text) => TextPrinter { color: Some("green") }.print(text),
            RenderAction::Error(text) => TextPrinter { color: Some("red") }.print(text),
            RenderAction::Frame(df) => print_frame(df),
            RenderAction::Grid { columns, rows } => print_grid(columns, rows),
            RenderAction::Plot(bytes) => {
                let name = plot_filename(&self.chat_id, seq);
                let path = export_plot(&self.plot_dir, &name, bytes)?;
                TextPrinter { color: Some("cyan") }
                    .print(&format!("chart saved to {}", path.display()));
            }
        }
        Ok(())
    }
}

/// Flatten a stored entry into plain text for the model's context window.
/// Images never go back to the model; the snippet that drew them does.
fn entry_to_message(entry: &HistoryEntry) -> ChatMessage {
    let role = match entry.role {
        crate::history::EntryRole::User => Role::User,
        crate::history::EntryRole::Assistant => Role::Assistant,
    };
    let content = match &entry.payload {
        Payload::Text { text } => text.clone(),
        Payload::Tabular { columns, rows } => {
            format!("[table: {} | {} rows]", columns.join(", "), rows.len())
        }
        Payload::Plot { snippet, .. } => snippet
            .clone()
            .unwrap_or_else(|| "[chart]".to_string()),
    };
    ChatMessage::new(role, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EntryRole;

    #[test]
    fn tabular_entries_flatten_for_context() {
        let entry = HistoryEntry::assistant_tabular(
            vec!["city".into(), "n".into()],
            vec![vec!["a".into(), "1".into()]],
        );
        let msg = entry_to_message(&entry);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.contains("city, n"));
    }

    #[test]
    fn plot_entries_flatten_to_their_snippet() {
        let entry = HistoryEntry::assistant_plot(b"<svg/>", Some("plt.hist(df[\"a\"])".into()));
        let msg = entry_to_message(&entry);
        assert_eq!(msg.content, "plt.hist(df[\"a\"])");
    }

    #[test]
    fn user_entries_keep_their_text() {
        let entry = HistoryEntry::user("average amount?");
        assert_eq!(entry.role, EntryRole::User);
        assert_eq!(entry_to_message(&entry).content, "average amount?");
    }
}
