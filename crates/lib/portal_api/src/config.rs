//! API server configuration.

use std::fmt;
use std::str::FromStr;

use portal_core::monitoring::service::DEFAULT_PROBE_INTERVAL_SECS;
use thiserror::Error;

/// Deployment environment. Debug details are only exposed in development.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// A configuration variable that is set but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Public site origin used to build magic links.
    pub site_url: String,
    pub environment: Environment,
    /// Endpoint probed by the monitoring service.
    pub monitor_target_url: String,
    pub monitor_interval_secs: u64,
    /// Content API base URL. Articles are served from memory when unset.
    pub article_source_url: Option<String>,
    /// Bearer token for the internal routes (monitoring, order intake).
    /// When unset those routes are only open in development.
    pub internal_api_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3100".into(),
            site_url: "http://localhost:3000".into(),
            environment: Environment::Production,
            monitor_target_url: "http://localhost:3000".into(),
            monitor_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            article_source_url: None,
            internal_api_token: None,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                  |
    /// |-------------------------|--------------------------|
    /// | `BIND_ADDR`             | `127.0.0.1:3100`         |
    /// | `SITE_URL`              | `http://localhost:3000`  |
    /// | `PORTAL_ENV`            | `production`             |
    /// | `MONITOR_TARGET_URL`    | value of `SITE_URL`      |
    /// | `MONITOR_INTERVAL_SECS` | `300`                    |
    /// | `ARTICLE_SOURCE_URL`    | unset (in-memory)        |
    /// | `INTERNAL_API_TOKEN`    | unset                    |
    ///
    /// A variable that is set to an unparseable value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let set = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let site_url = set("SITE_URL").unwrap_or(defaults.site_url);
        let environment = match set("PORTAL_ENV") {
            Some(v) => v.parse().map_err(|reason| ConfigError {
                var: "PORTAL_ENV",
                reason,
            })?,
            None => defaults.environment,
        };
        let monitor_interval_secs = match set("MONITOR_INTERVAL_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError {
                        var: "MONITOR_INTERVAL_SECS",
                        reason: format!("expected a positive number of seconds, got '{v}'"),
                    });
                }
            },
            None => defaults.monitor_interval_secs,
        };

        Ok(Self {
            bind_addr: set("BIND_ADDR").unwrap_or(defaults.bind_addr),
            monitor_target_url: set("MONITOR_TARGET_URL").unwrap_or_else(|| site_url.clone()),
            site_url,
            environment,
            monitor_interval_secs,
            article_source_url: set("ARTICLE_SOURCE_URL"),
            internal_api_token: set("INTERNAL_API_TOKEN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!(" Production ".parse::<Environment>(), Ok(Environment::Production));
        assert!("staging".parse::<Environment>().is_err());
        assert!(!Environment::default().is_development());
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[("SITE_URL", "https://example.com")])).unwrap();
        assert_eq!(config.site_url, "https://example.com");
        assert_eq!(config.monitor_target_url, "https://example.com");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.monitor_interval_secs, DEFAULT_PROBE_INTERVAL_SECS);
        assert_eq!(config.internal_api_token, None);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("PORTAL_ENV", "staging")])).unwrap_err();
        assert_eq!(err.var, "PORTAL_ENV");

        let config = ApiConfig::from_lookup(lookup(&[("PORTAL_ENV", "dev")])).unwrap();
        assert!(config.environment.is_development());
    }

    #[test]
    fn bad_interval_is_rejected() {
        for value in ["0", "soon", "-5"] {
            let err = ApiConfig::from_lookup(lookup(&[("MONITOR_INTERVAL_SECS", value)])).unwrap_err();
            assert_eq!(err.var, "MONITOR_INTERVAL_SECS");
        }
        let config = ApiConfig::from_lookup(lookup(&[("MONITOR_INTERVAL_SECS", "60")])).unwrap();
        assert_eq!(config.monitor_interval_secs, 60);
    }
}
