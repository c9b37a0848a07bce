use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Runtime settings for the HTTP service, read from the environment.
///
/// | variable                  | default   |
/// |---------------------------|-----------|
/// | `INSIGHTS_HOST`           | `0.0.0.0` |
/// | `PORT`                    | `8000`    |
/// | `INSIGHTS_MAX_BODY_BYTES` | 16 MiB    |
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: parse_or(&lookup, "INSIGHTS_HOST", defaults.host)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            max_body_bytes: parse_or(&lookup, "INSIGHTS_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("INSIGHTS_HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("INSIGHTS_MAX_BODY_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9100");
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
