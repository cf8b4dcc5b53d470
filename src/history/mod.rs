//! Chat history persistence and the LLM request cache.
//!
//! Each chat id maps to one JSON file holding an append-only list of
//! entries. Replay reads entries back verbatim; plot images are stored
//! inline as base64 so a transcript is self-contained.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    Assistant,
}

/// What one turn produced, in a replayable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Text {
        text: String,
    },
    Tabular {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Plot {
        image_b64: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snippet: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: EntryRole,
    pub payload: Payload,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::User,
            payload: Payload::Text { text: text.into() },
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: EntryRole::Assistant,
            payload: Payload::Text { text: text.into() },
        }
    }

    pub fn assistant_tabular(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            role: EntryRole::Assistant,
            payload: Payload::Tabular { columns, rows },
        }
    }

    pub fn assistant_plot(image: &[u8], snippet: Option<String>) -> Self {
        Self {
            role: EntryRole::Assistant,
            payload: Payload::Plot {
                image_b64: B64.encode(image),
                snippet,
            },
        }
    }
}

pub fn decode_plot(image_b64: &str) -> Result<Vec<u8>> {
    B64.decode(image_b64).context("corrupt plot entry in history")
}

/// One JSON file per chat id under the history directory.
pub struct HistoryStore {
    dir: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn new(dir: PathBuf, max_entries: usize) -> Self {
        Self { dir, max_entries }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let dir = cfg.history_path();
        let max_entries = cfg.get_usize("HISTORY_LENGTH").unwrap_or(100);
        Self::new(dir, max_entries)
    }

    fn path_for(&self, chat_id: &str) -> PathBuf {
        self.dir.join(chat_id)
    }

    pub fn exists(&self, chat_id: &str) -> bool {
        self.path_for(chat_id).exists()
    }

    pub fn invalidate(&self, chat_id: &str) -> Result<()> {
        let path = self.path_for(chat_id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove chat '{}'", chat_id))?;
        }
        Ok(())
    }

    pub fn read(&self, chat_id: &str) -> Result<Vec<HistoryEntry>> {
        let path = self.path_for(chat_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read chat '{}'", chat_id))?;
        serde_json::from_str(&data)
            .with_context(|| format!("chat '{}' holds malformed history", chat_id))
    }

    pub fn write(&self, chat_id: &str, entries: &[HistoryEntry]) -> Result<()> {
        fs::create_dir_all(&self.dir).context("failed to create history directory")?;
        let start = entries.len().saturating_sub(self.max_entries);
        let body = serde_json::to_string(&entries[start..])?;
        fs::write(self.path_for(chat_id), body)
            .with_context(|| format!("failed to write chat '{}'", chat_id))
    }

    pub fn append(&self, chat_id: &str, new_entries: Vec<HistoryEntry>) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.read(chat_id)?;
        entries.extend(new_entries);
        self.write(chat_id, &entries)?;
        Ok(entries)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).context("failed to list chats")? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Keyed cache of raw LLM completions, one file per request digest.
pub struct RequestCache {
    dir: PathBuf,
    length: usize,
}

impl RequestCache {
    pub fn new(dir: PathBuf, length: usize) -> Self {
        Self { dir, length }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let dir = cfg.cache_path();
        let length = cfg.get_usize("CACHE_LENGTH").unwrap_or(100);
        Self::new(dir, length)
    }

    pub fn key_for(&self, model: &str, prompt: &str) -> String {
        format!("{:x}", md5::compute(format!("{}:{}", model, prompt)))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).context("failed to create cache directory")?;
        fs::write(self.dir.join(key), value).context("failed to write cache entry")?;
        self.evict()?;
        Ok(())
    }

    /// Drop oldest entries beyond the configured length.
    fn evict(&self) -> Result<()> {
        let mut files: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_file() {
                let mtime = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
                files.push((mtime, entry.path()));
            }
        }
        if files.len() <= self.length {
            return Ok(());
        }
        files.sort_by_key(|(t, _)| *t);
        let excess = files.len() - self.length;
        for (_, path) in files.into_iter().take(excess) {
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

/// Derive a stable per-chat filename from a plot's position in history.
pub fn plot_filename(chat_id: &str, seq: usize) -> String {
    format!("{}-{}.svg", sanitize(chat_id), seq)
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn history_roundtrip() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf(), 100);
        let entries = vec![
            HistoryEntry::user("what is the mean amount?"),
            HistoryEntry::assistant_text("20.0"),
        ];
        store.write("session1", &entries).unwrap();
        let back = store.read("session1").unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].role, EntryRole::User);
        assert!(matches!(&back[1].payload, Payload::Text { text } if text == "20.0"));
    }

    #[test]
    fn history_truncates_to_max_entries() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf(), 4);
        let entries: Vec<HistoryEntry> =
            (0..10).map(|i| HistoryEntry::user(format!("q{}", i))).collect();
        store.write("s", &entries).unwrap();
        let back = store.read("s").unwrap();
        assert_eq!(back.len(), 4);
        assert!(matches!(&back[0].payload, Payload::Text { text } if text == "q6"));
    }

    #[test]
    fn plot_entries_roundtrip_bytes() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf(), 100);
        let bytes = b"<svg>fake</svg>".to_vec();
        let entry = HistoryEntry::assistant_plot(&bytes, Some("plt.hist(df[\"a\"])".into()));
        store.write("p", &[entry]).unwrap();
        let back = store.read("p").unwrap();
        match &back[0].payload {
            Payload::Plot { image_b64, snippet } => {
                assert_eq!(decode_plot(image_b64).unwrap(), bytes);
                assert!(snippet.is_some());
            }
            other => panic!("expected plot payload, got {:?}", other),
        }
    }

    #[test]
    fn missing_chat_reads_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf(), 100);
        assert!(store.read("nope").unwrap().is_empty());
        assert!(!store.exists("nope"));
    }

    #[test]
    fn list_and_invalidate() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().to_path_buf(), 100);
        store.write("a", &[HistoryEntry::user("x")]).unwrap();
        store.write("b", &[HistoryEntry::user("y")]).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
        store.invalidate("a").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn cache_roundtrip_and_eviction() {
        let dir = tempdir().unwrap();
        let cache = RequestCache::new(dir.path().to_path_buf(), 2);
        let key = cache.key_for("gpt-4o", "mean of amount");
        assert!(cache.get(&key).is_none());
        cache.set(&key, "print(df[\"amount\"].mean())").unwrap();
        assert_eq!(cache.get(&key).unwrap(), "print(df[\"amount\"].mean())");
        cache.set("k2", "v2").unwrap();
        cache.set("k3", "v3").unwrap();
        let survivors = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(survivors, 2);
    }

    #[test]
    fn plot_filenames_are_sanitized() {
        assert_eq!(plot_filename("my chat/1", 3), "my_chat_1-3.svg");
    }
}
