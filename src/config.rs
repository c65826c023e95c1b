use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

#[derive(Clone)]
pub struct Config {
    pub telegram_token: String,
    pub remove_bg_api_key: String,
    pub remove_bg_url: String,
    pub port: u16,
    pub frame_path: PathBuf,
    pub frame_size: u32,
    pub frame_padding: u32,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            telegram_token: var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN environment variable is required")?,
            remove_bg_api_key: var("REMOVE_BG_API_KEY")
                .context("REMOVE_BG_API_KEY environment variable is required")?,
            remove_bg_url: var("REMOVE_BG_API_URL")
                .unwrap_or_else(|| DEFAULT_REMOVE_BG_URL.to_string()),
            port: parse_or(var("PORT"), "PORT", 8080)?,
            frame_path: var("FRAME_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frame.png")),
            frame_size: parse_or(var("FRAME_SIZE"), "FRAME_SIZE", 1200)?,
            frame_padding: parse_or(var("FRAME_PADDING"), "FRAME_PADDING", 130)?,
            http_timeout: Duration::from_secs(parse_timeout(var("HTTP_TIMEOUT_SECS"))?),
        })
    }
}

// A zero timeout would fail every outbound request immediately.
fn parse_timeout(value: Option<String>) -> Result<u64> {
    let secs = parse_or(value, "HTTP_TIMEOUT_SECS", 30)?;
    if secs == 0 {
        bail!("HTTP_TIMEOUT_SECS must be greater than zero");
    }
    Ok(secs)
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"<redacted>")
            .field("remove_bg_api_key", &"<redacted>")
            .field("remove_bg_url", &self.remove_bg_url)
            .field("port", &self.port)
            .field("frame_path", &self.frame_path)
            .field("frame_size", &self.frame_size)
            .field("frame_padding", &self.frame_padding)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
