//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, GlobalOverrides, ListArgs, RevalidateArgs, SlugArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/";
const DEFAULT_MAX_AGE_MS: u64 = 300_000;
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_PHOTO_PAGE_SIZE: u32 = 24;

#[derive(Debug, Clone)]
pub struct Settings {
    pub content: ContentSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub revalidate: RevalidateSettings,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub base_url: Url,
    /// Falls back to the client's built-in agent when unset.
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub max_age: Duration,
    pub page_size: NonZeroU32,
    pub photo_page_size: NonZeroU32,
    pub dedupe_by_id: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Default)]
pub struct RevalidateSettings {
    pub secret: Option<String>,
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

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);
    if let Command::Revalidate(args) = &cli.command {
        raw.apply_revalidate_override(args);
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    content: RawContentSettings,
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
    revalidate: RawRevalidateSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.base_url.as_ref() {
            self.content.base_url = Some(url.clone());
        }
        if let Some(ms) = overrides.cache_max_age_ms {
            self.cache.max_age_ms = Some(ms);
        }
        if let Some(size) = overrides.cache_page_size {
            self.cache.page_size = Some(size);
        }
        if let Some(size) = overrides.cache_photo_page_size {
            self.cache.photo_page_size = Some(size);
        }
        if let Some(dedupe) = overrides.cache_dedupe_by_id {
            self.cache.dedupe_by_id = Some(dedupe);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_revalidate_override(&mut self, args: &RevalidateArgs) {
        if let Some(secret) = args.secret.as_ref() {
            self.revalidate.secret = Some(secret.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            content,
            cache,
            logging,
            revalidate,
        } = raw;

        Ok(Self {
            content: build_content_settings(content)?,
            cache: build_cache_settings(cache)?,
            logging: build_logging_settings(logging)?,
            revalidate: build_revalidate_settings(revalidate),
        })
    }
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let raw_url = content
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("content.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "content.base_url",
            format!("unsupported scheme `{}`", base_url.scheme()),
        ));
    }

    let user_agent = non_blank(content.user_agent);

    Ok(ContentSettings {
        base_url,
        user_agent,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let max_age_ms = cache.max_age_ms.unwrap_or(DEFAULT_MAX_AGE_MS);
    if max_age_ms == 0 {
        return Err(LoadError::invalid(
            "cache.max_age_ms",
            "must be greater than zero",
        ));
    }

    let page_size = non_zero_u32(
        cache.page_size.unwrap_or(DEFAULT_PAGE_SIZE).into(),
        "cache.page_size",
    )?;
    let photo_page_size = non_zero_u32(
        cache.photo_page_size.unwrap_or(DEFAULT_PHOTO_PAGE_SIZE).into(),
        "cache.photo_page_size",
    )?;

    Ok(CacheSettings {
        max_age: Duration::from_millis(max_age_ms),
        page_size,
        photo_page_size,
        dedupe_by_id: cache.dedupe_by_id.unwrap_or(false),
    })
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

fn build_revalidate_settings(revalidate: RawRevalidateSettings) -> RevalidateSettings {
    RevalidateSettings {
        secret: non_blank(revalidate.secret),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    base_url: Option<String>,
    user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    max_age_ms: Option<u64>,
    page_size: Option<u32>,
    photo_page_size: Option<u32>,
    dedupe_by_id: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidateSettings {
    secret: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
