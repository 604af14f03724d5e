use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

pub const DEFAULT_HANDLE: &str = "bry-ly";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "minimalist-portfolio";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

/// Everything the fetcher needs to talk to the events API, resolved once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityConfig {
    /// Account whose public events are read. `None` disables the fetch entirely.
    pub handle: Option<String>,
    pub token: Option<String>,
    pub api_base: Url,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl ActivityConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. An unset `GITHUB_USERNAME` falls back to the
    /// default handle; an empty one turns the feature off.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let handle = match lookup("GITHUB_USERNAME") {
            Some(handle) => non_empty(handle),
            None => Some(DEFAULT_HANDLE.to_string()),
        };
        let base = lookup("GITHUB_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let mut cfg = Self {
            handle,
            token: lookup("GITHUB_TOKEN").and_then(non_empty),
            api_base: parse_api_base(&base)?,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        };
        if let Some(ua) = lookup("ACTIVITY_USER_AGENT").and_then(non_empty) {
            cfg.user_agent = ua;
        }
        if let Some(secs) = lookup("ACTIVITY_HTTP_TIMEOUT_SECS").and_then(non_empty) {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("ACTIVITY_HTTP_TIMEOUT_SECS is not a number: {secs}"))?;
            cfg.timeout = Some(Duration::from_secs(secs));
        }
        Ok(cfg)
    }
}

pub fn parse_api_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid API base URL: {raw}"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("API base URL must be an http(s) URL: {raw}");
    }
    Ok(url)
}

pub fn listen_from_env(flag: Option<String>) -> Result<SocketAddr> {
    let raw = flag
        .or_else(|| std::env::var("ACTIVITY_LISTEN").ok())
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.parse()
        .with_context(|| format!("Invalid listen address: {raw}"))
}

fn non_empty(v: String) -> Option<String> {
    let v = v.trim().to_string();
    if v.is_empty() { None } else { Some(v) }
}
