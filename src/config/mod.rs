use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .dfchatrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().flatten() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(self.get("HISTORY_PATH").unwrap())
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(self.get("CACHE_PATH").unwrap())
    }

    pub fn plot_dir(&self) -> PathBuf {
        PathBuf::from(self.get("PLOT_DIR").unwrap())
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or DFCHAT_*/OPENAI_* for forward-compat
    const KEYS: &[&str] = &[
        "OPENAI_API_KEY",
        "API_BASE_URL",
        "DEFAULT_MODEL",
        "REQUEST_TIMEOUT",
        "HISTORY_PATH",
        "HISTORY_LENGTH",
        "CACHE_PATH",
        "CACHE_LENGTH",
        "EXECUTION_TIMEOUT",
        "PLOT_DIR",
        "PLOT_WIDTH",
        "PLOT_HEIGHT",
        "PREVIEW_ROWS",
        "PRETTIFY_MARKDOWN",
    ];

    KEYS.contains(&k) || k.starts_with("DFCHAT_") || k.starts_with("OPENAI_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("dfchat").join(".dfchatrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    // Paths
    let temp = env::temp_dir().join("dfchat");

    m.insert(
        "HISTORY_PATH".into(),
        temp.join("history").to_string_lossy().into_owned(),
    );
    m.insert(
        "CACHE_PATH".into(),
        temp.join("cache").to_string_lossy().into_owned(),
    );
    m.insert(
        "PLOT_DIR".into(),
        temp.join("plots").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("HISTORY_LENGTH".into(), "100".into());
    m.insert("CACHE_LENGTH".into(), "100".into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("EXECUTION_TIMEOUT".into(), "30".into());
    m.insert("PLOT_WIDTH".into(), "800".into());
    m.insert("PLOT_HEIGHT".into(), "600".into());
    m.insert("PREVIEW_ROWS".into(), "5".into());

    // Strings
    m.insert("DEFAULT_MODEL".into(), "gpt-4o".into());
    m.insert("API_BASE_URL".into(), "default".into());

    // Bools as strings
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());

    m
}
