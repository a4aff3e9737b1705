//! Process configuration.
//!
//! [`ProxyConfig`] is populated once at startup and handed to the service
//! state; nothing reads the environment after that. [`ProxyConfig::from_lookup`]
//! takes the variable source as a closure so tests can supply values without
//! touching the process environment.

use std::fmt;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
pub const API_KEY_FILE_ENV: &str = "GOOGLE_MAPS_API_KEY_FILE";
pub const PORT_ENV: &str = "PORT";
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";
pub const UPSTREAM_BASE_URL_ENV: &str = "UPSTREAM_BASE_URL";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_MS";
pub const MAX_CONCURRENT_REQUESTS_ENV: &str = "MAX_CONCURRENT_REQUESTS";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the outbound Google Maps client.
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL without a trailing slash, e.g. `https://maps.googleapis.com/maps/api`.
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Config pointing at the public Google endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete proxy configuration.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub upstream: UpstreamConfig,
    /// Upper bound on requests handled at once; `None` means unbounded.
    pub max_concurrent_requests: Option<usize>,
}

impl ProxyConfig {
    /// Config with defaults for everything except the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            upstream: UpstreamConfig::new(api_key),
            max_concurrent_requests: None,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns the raw value of a
    /// variable or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = match get(API_KEY_ENV) {
            Some(key) => key.trim().to_string(),
            None => match get(API_KEY_FILE_ENV) {
                Some(path) => read_key_file(path.trim())?,
                None => return Err(Error::MissingConfig { name: API_KEY_ENV }),
            },
        };

        let mut config = Self::new(api_key);

        if let Some(raw) = get(PORT_ENV) {
            config.port = parse_value(PORT_ENV, &raw)?;
        }

        if let Some(raw) = get(BIND_ADDRESS_ENV) {
            config.bind_address = parse_value(BIND_ADDRESS_ENV, &raw)?;
        }

        if let Some(raw) = get(UPSTREAM_BASE_URL_ENV) {
            let trimmed = raw.trim();
            if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                return Err(Error::InvalidConfig {
                    name: UPSTREAM_BASE_URL_ENV,
                    value: raw.clone(),
                    reason: "must start with http:// or https://".to_string(),
                });
            }
            config.upstream = config.upstream.with_base_url(trimmed);
        }

        if let Some(raw) = get(UPSTREAM_TIMEOUT_ENV) {
            let millis: u64 = parse_value(UPSTREAM_TIMEOUT_ENV, &raw)?;
            if millis == 0 {
                return Err(Error::InvalidConfig {
                    name: UPSTREAM_TIMEOUT_ENV,
                    value: raw,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.upstream.timeout = Duration::from_millis(millis);
        }

        if let Some(raw) = get(MAX_CONCURRENT_REQUESTS_ENV) {
            let limit: usize = parse_value(MAX_CONCURRENT_REQUESTS_ENV, &raw)?;
            config.max_concurrent_requests = (limit > 0).then_some(limit);
        }

        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn read_key_file(path: &str) -> Result<String> {
    let key = fs::read_to_string(path)?.trim().to_string();
    if key.is_empty() {
        return Err(Error::InvalidConfig {
            name: API_KEY_FILE_ENV,
            value: path.to_string(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(key)
}
