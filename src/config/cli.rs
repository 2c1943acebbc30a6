use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the readalong binary.
#[derive(Debug, Parser)]
#[command(
    name = "readalong",
    version,
    about = "Align narration segments with article text"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "READALONG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Align a content file with narration segments and print the result.
    Align(Box<AlignArgs>),
    /// Print the id of the segment narrated at a given time.
    Active(ActiveArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Matched ranges as JSON.
    #[default]
    Json,
    /// Highlighted rendering of the content.
    Html,
}

#[derive(Debug, Args, Clone)]
pub struct AlignArgs {
    /// Content to align (article HTML, or inline text with --inline).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content: PathBuf,

    /// Segment source: an http(s) URL or a path to a JSON file.
    #[arg(long, value_name = "SOURCE")]
    pub segments: String,

    /// Treat the content as inline text (title or excerpt) instead of HTML.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub inline: bool,

    /// Playback time used to mark the active segment.
    #[arg(long, value_name = "SECONDS")]
    pub at: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub overrides: AlignOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct ActiveArgs {
    /// Segment source: an http(s) URL or a path to a JSON file.
    #[arg(long, value_name = "SOURCE")]
    pub segments: String,

    /// Playback time in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub at: f64,

    #[command(flatten)]
    pub overrides: RuntimeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the segment fetch timeout.
    #[arg(long = "fetch-timeout-seconds", value_name = "SECONDS")]
    pub fetch_timeout_seconds: Option<u64>,

    /// Override the user agent sent when fetching segments.
    #[arg(long = "fetch-user-agent", value_name = "AGENT")]
    pub fetch_user_agent: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct AlignOverrides {
    #[command(flatten)]
    pub runtime: RuntimeOverrides,

    /// Override the inline length under which the whole-title rule applies.
    #[arg(long = "align-short-content-chars", value_name = "CHARS")]
    pub short_content_chars: Option<u64>,

    /// Override the number of leading words used by the word-prefix fallback.
    #[arg(long = "align-prefix-words", value_name = "COUNT")]
    pub prefix_words: Option<u64>,

    /// Override how many extra words a word-prefix match may extend by.
    #[arg(long = "align-extension-words", value_name = "COUNT")]
    pub extension_words: Option<u64>,

    /// Override the element wrapped around highlighted ranges.
    #[arg(long = "highlight-element", value_name = "TAG")]
    pub highlight_element: Option<String>,

    /// Override the class put on every highlighted range.
    #[arg(long = "highlight-class", value_name = "CLASS")]
    pub highlight_class: Option<String>,

    /// Override the extra class put on the active range.
    #[arg(long = "highlight-active-class", value_name = "CLASS")]
    pub highlight_active_class: Option<String>,
}
