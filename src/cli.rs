use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "dfchat", about = "Chat with your CSV data from the terminal", version)]
#[command(group(ArgGroup::new("chat_mode").args(["chat", "repl"]).multiple(false)))]
#[command(group(ArgGroup::new("md_switch").args(["md", "no_md"]).multiple(false)))]
#[command(group(ArgGroup::new("cache_switch").args(["cache", "no_cache"]).multiple(false)))]
pub struct Cli {
    /// The question to answer against the loaded CSV.
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// CSV file to analyze.
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Large language model to use.
    #[arg(long)]
    pub model: Option<String>,

    /// Randomness of generated output.
    #[arg(long, default_value_t = 0.0, value_parser = clap::value_parser!(f32))]
    pub temperature: f32,

    /// Limits highest probable tokens (words).
    #[arg(long = "top-p", default_value_t = 1.0, value_parser = clap::value_parser!(f32))]
    pub top_p: f32,

    /// Prettify Markdown output when replaying transcripts.
    #[arg(long)]
    pub md: bool,
    /// Disable Markdown prettifying.
    #[arg(long = "no-md")]
    pub no_md: bool,

    /// Cache model completions.
    #[arg(long)]
    pub cache: bool,
    /// Disable caching.
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Follow conversation with id, use "temp" for quick session.
    #[arg(long)]
    pub chat: Option<String>,

    /// Start a REPL (Read-eval-print loop) session over the CSV.
    #[arg(long)]
    pub repl: Option<String>,

    /// Show all turns from provided chat id.
    #[arg(long = "show-chat")]
    pub show_chat: Option<String>,

    /// List all existing chat ids.
    #[arg(short = 'l', long = "list-chats", visible_alias = "lc")]
    pub list_chats: bool,

    /// Print the CSV schema and a sample, without calling the model.
    #[arg(long)]
    pub schema: bool,

    /// Directory plots are exported to (defaults to PLOT_DIR).
    #[arg(long = "plot-dir")]
    pub plot_dir: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
