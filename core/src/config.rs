//! Client configuration: base URL and caller-chosen timeouts.
//!
//! Configuration is built once and passed explicitly into the client. Nothing
//! here is global.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ConfigError;

pub const ENV_BASE_URL: &str = "STOREFRONT_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "STOREFRONT_TIMEOUT_MS";
pub const ENV_STORAGE_TIMEOUT_MS: &str = "STOREFRONT_STORAGE_TIMEOUT_MS";

/// Default bound on a token-store read.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

/// Validated origin plus mount path, e.g. `https://host/nvs-rice-mart`.
///
/// Trailing slashes are trimmed so joining with an endpoint path never
/// produces `//`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: input.to_string(),
            reason,
        };
        let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if parsed.path().contains("//") {
            return Err(invalid("path contains an empty segment".to_string()));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("must not carry a query or fragment".to_string()));
        }
        if trimmed.contains(char::is_whitespace) {
            return Err(invalid("contains whitespace".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BaseUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BaseUrl::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Everything `ApiClient` needs besides its transport and token store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub base_url: BaseUrl,

    /// Per-request timeout handed to the transport. `None` means the
    /// transport's own behavior applies.
    #[serde(default, rename = "timeout_ms", deserialize_with = "millis_opt")]
    pub request_timeout: Option<Duration>,

    #[serde(
        default = "default_storage_timeout",
        rename = "storage_timeout_ms",
        deserialize_with = "millis"
    )]
    pub storage_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            request_timeout: None,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Read `STOREFRONT_BASE_URL`, `STOREFRONT_TIMEOUT_MS` and
    /// `STOREFRONT_STORAGE_TIMEOUT_MS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingBaseUrl)?;
        let mut config = Self::new(BaseUrl::parse(&base_url)?);
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.request_timeout = Some(parse_millis(ENV_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_STORAGE_TIMEOUT_MS) {
            config.storage_timeout = parse_millis(ENV_STORAGE_TIMEOUT_MS, &raw)?;
        }
        Ok(config)
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnv {
            name,
            reason: format!("{raw:?}: {e}"),
        })
}

fn default_storage_timeout() -> Duration {
    DEFAULT_STORAGE_TIMEOUT
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn millis_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
