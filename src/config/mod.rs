//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::align::{
    DEFAULT_ACTIVE_CLASS, DEFAULT_CACHE_CAPACITY, DEFAULT_MARKER_CLASS, DEFAULT_MARKER_ELEMENT,
};

mod cli;

pub use cli::{
    ActiveArgs, AlignArgs, AlignOverrides, CliArgs, Command, OutputFormat, RuntimeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "readalong";
const ENV_PREFIX: &str = "READALONG";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHORT_CONTENT_CHARS: u64 = 50;
const DEFAULT_PREFIX_WORDS: u64 = 5;
const DEFAULT_EXTENSION_WORDS: u64 = 10;
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("readalong/", env!("CARGO_PKG_VERSION"));

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub fetch: FetchSettings,
    pub align: AlignSettings,
    pub highlight: HighlightSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlignSettings {
    pub cache_capacity: NonZeroUsize,
    pub short_content_chars: usize,
    pub prefix_words: NonZeroUsize,
    pub extension_words: usize,
}

#[derive(Debug, Clone)]
pub struct HighlightSettings {
    pub element: String,
    pub class: String,
    pub active_class: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Align(args) => raw.apply_align_overrides(&args.overrides),
        Command::Active(args) => raw.apply_runtime_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    fetch: RawFetchSettings,
    align: RawAlignSettings,
    highlight: RawHighlightSettings,
}

impl RawSettings {
    fn apply_runtime_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.fetch_timeout_seconds {
            self.fetch.timeout_seconds = Some(seconds);
        }
        if let Some(agent) = overrides.fetch_user_agent.as_ref() {
            self.fetch.user_agent = Some(agent.clone());
        }
    }

    fn apply_align_overrides(&mut self, overrides: &AlignOverrides) {
        self.apply_runtime_overrides(&overrides.runtime);

        if let Some(chars) = overrides.short_content_chars {
            self.align.short_content_chars = Some(chars);
        }
        if let Some(words) = overrides.prefix_words {
            self.align.prefix_words = Some(words);
        }
        if let Some(words) = overrides.extension_words {
            self.align.extension_words = Some(words);
        }
        if let Some(element) = overrides.highlight_element.as_ref() {
            self.highlight.element = Some(element.clone());
        }
        if let Some(class) = overrides.highlight_class.as_ref() {
            self.highlight.class = Some(class.clone());
        }
        if let Some(class) = overrides.highlight_active_class.as_ref() {
            self.highlight.active_class = Some(class.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            fetch,
            align,
            highlight,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let fetch = build_fetch_settings(fetch)?;
        let align = build_align_settings(align)?;
        let highlight = build_highlight_settings(highlight)?;

        Ok(Self {
            logging,
            fetch,
            align,
            highlight,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_fetch_settings(fetch: RawFetchSettings) -> Result<FetchSettings, LoadError> {
    let timeout_secs = fetch.timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "fetch.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let user_agent = match fetch.user_agent {
        Some(agent) => {
            let trimmed = agent.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid("fetch.user_agent", "must not be empty"));
            }
            trimmed.to_string()
        }
        None => DEFAULT_USER_AGENT.to_string(),
    };

    Ok(FetchSettings {
        timeout: Duration::from_secs(timeout_secs),
        user_agent,
    })
}

fn build_align_settings(align: RawAlignSettings) -> Result<AlignSettings, LoadError> {
    let cache_capacity = non_zero_usize(
        align
            .cache_capacity
            .unwrap_or(DEFAULT_CACHE_CAPACITY as u64),
        "align.cache_capacity",
    )?;
    let short_content_chars = to_usize(
        align
            .short_content_chars
            .unwrap_or(DEFAULT_SHORT_CONTENT_CHARS),
        "align.short_content_chars",
    )?;
    let prefix_words = non_zero_usize(
        align.prefix_words.unwrap_or(DEFAULT_PREFIX_WORDS),
        "align.prefix_words",
    )?;
    let extension_words = to_usize(
        align.extension_words.unwrap_or(DEFAULT_EXTENSION_WORDS),
        "align.extension_words",
    )?;

    Ok(AlignSettings {
        cache_capacity,
        short_content_chars,
        prefix_words,
        extension_words,
    })
}

fn build_highlight_settings(
    highlight: RawHighlightSettings,
) -> Result<HighlightSettings, LoadError> {
    let element = highlight
        .element
        .unwrap_or_else(|| DEFAULT_MARKER_ELEMENT.to_string());
    let valid_element = !element.is_empty()
        && element.starts_with(|c: char| c.is_ascii_alphabetic())
        && element.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid_element {
        return Err(LoadError::invalid(
            "highlight.element",
            format!("`{element}` is not a valid element name"),
        ));
    }

    let class = class_name(
        highlight.class,
        DEFAULT_MARKER_CLASS,
        "highlight.class",
    )?;
    let active_class = class_name(
        highlight.active_class,
        DEFAULT_ACTIVE_CLASS,
        "highlight.active_class",
    )?;

    Ok(HighlightSettings {
        element,
        class,
        active_class,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFetchSettings {
    timeout_seconds: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAlignSettings {
    cache_capacity: Option<u64>,
    short_content_chars: Option<u64>,
    prefix_words: Option<u64>,
    extension_words: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHighlightSettings {
    element: Option<String>,
    class: Option<String>,
    active_class: Option<String>,
}

fn class_name(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let Some(value) = value else {
        return Ok(default.to_string());
    };
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(LoadError::invalid(key, "must be a single non-empty class name"));
    }
    Ok(trimmed.to_string())
}

fn to_usize(value: u64, key: &'static str) -> Result<usize, LoadError> {
    value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(to_usize(value, key)?)
        .ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
