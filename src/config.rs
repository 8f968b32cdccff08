//! Configuration loader and application settings.
//!
//! Everything comes from environment variables (a `.env` file is loaded by
//! the binary first). Malformed numbers and flags log a warning and keep the
//! default; an unknown source name is an error.

use crate::arbitrage::{ArbitrageConfig, DEFAULT_MIN_SPREAD_APR};
use crate::errors::{AppError, Result};
use crate::sources::Source;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org/";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WATCH_MIN_APR: f64 = 10.0;
pub const DEFAULT_EVAL_SECS: u64 = 60;
pub const DEFAULT_POLL_SECS: u64 = 5;
/// `getUpdates` long-poll window.
pub const DEFAULT_LONG_POLL_SECS: u64 = 10;

/// Bot credentials. Present only when both token and chat id are set.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Numeric id or `@channel` name.
    pub chat_id: String,
    pub api_url: Url,
}

/// Initial watcher settings and schedule.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Alert threshold on `spreadApr`, percent.
    pub min_spread_apr: f64,
    pub heartbeat: bool,
    pub high_yield: bool,
    pub eval_interval: Duration,
    pub poll_interval: Duration,
    pub long_poll: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            min_spread_apr: DEFAULT_WATCH_MIN_APR,
            heartbeat: false,
            high_yield: false,
            eval_interval: Duration::from_secs(DEFAULT_EVAL_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            long_poll: Duration::from_secs(DEFAULT_LONG_POLL_SECS),
        }
    }
}

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sources: Vec<Source>,
    pub fetch_timeout: Duration,
    pub arbitrage: ArbitrageConfig,
    pub watch: WatchConfig,
    pub telegram: Option<TelegramConfig>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sources = match get("SOURCES") {
            Some(list) => parse_sources(&list)?,
            None => Source::ALL.to_vec(),
        };

        let fetch_timeout = secs_or(
            "FETCH_TIMEOUT_SECS",
            get("FETCH_TIMEOUT_SECS"),
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        );

        let arbitrage = ArbitrageConfig {
            min_spread_apr: floor_apr_or(get("MIN_SPREAD_APR")),
        };

        let defaults = WatchConfig::default();
        let watch = WatchConfig {
            min_spread_apr: apr_or("WATCH_MIN_APR", get("WATCH_MIN_APR"), defaults.min_spread_apr),
            heartbeat: flag_or("WATCH_HEARTBEAT", get("WATCH_HEARTBEAT"), defaults.heartbeat),
            high_yield: flag_or("WATCH_HIGH_YIELD", get("WATCH_HIGH_YIELD"), defaults.high_yield),
            eval_interval: secs_or("WATCH_EVAL_SECS", get("WATCH_EVAL_SECS"), defaults.eval_interval),
            poll_interval: secs_or("WATCH_POLL_SECS", get("WATCH_POLL_SECS"), defaults.poll_interval),
            long_poll: defaults.long_poll,
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => {
                let raw = get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.into());
                Some(TelegramConfig {
                    bot_token,
                    chat_id,
                    api_url: api_base(&raw)?,
                })
            }
            (None, None) => None,
            _ => {
                warn!("[INIT] TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must both be set; notifications go to the log");
                None
            }
        };

        Ok(Self {
            sources,
            fetch_timeout,
            arbitrage,
            watch,
            telegram,
        })
    }
}

fn parse_sources(list: &str) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let source = Source::from_str(name)?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    if sources.is_empty() {
        return Err(AppError::Config("SOURCES names no sources".into()));
    }
    Ok(sources)
}

/// Base URL with a trailing slash so method paths append instead of replace.
fn api_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match raw {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!(key, value = %v, ?default, "[INIT] invalid value, using default");
            default
        }),
    }
}

/// Percent threshold; must be finite and non-negative.
fn parse_apr(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn apr_or(key: &str, raw: Option<String>, default: f64) -> f64 {
    match raw {
        None => default,
        Some(v) => parse_apr(&v).unwrap_or_else(|| {
            warn!(key, value = %v, default, "[INIT] invalid APR, using default");
            default
        }),
    }
}

/// `MIN_SPREAD_APR` may only raise the general-policy floor.
fn floor_apr_or(raw: Option<String>) -> f64 {
    let value = apr_or("MIN_SPREAD_APR", raw, DEFAULT_MIN_SPREAD_APR);
    if value < DEFAULT_MIN_SPREAD_APR {
        warn!(
            value,
            floor = DEFAULT_MIN_SPREAD_APR,
            "[INIT] MIN_SPREAD_APR below the detector floor, using the floor"
        );
        return DEFAULT_MIN_SPREAD_APR;
    }
    value
}

fn secs_or(key: &str, raw: Option<String>, default: Duration) -> Duration {
    let secs = parse_or(key, raw, default.as_secs());
    if secs == 0 {
        warn!(key, "[INIT] interval must be positive, using default");
        return default;
    }
    Duration::from_secs(secs)
}

fn flag_or(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            warn!(key, value = other, default, "[INIT] invalid flag, using default");
            default
        }
    }
}
