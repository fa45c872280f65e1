//! Runtime configuration from environment variables
//!
//! - `STATUSD_LISTEN_ADDRESS` - socket address to bind (default `0.0.0.0:8080`)
//! - `STATUSD_SHUTDOWN_GRACE_SECS` - grace period for in-flight requests, at least 1 (default 5)
//! - `STATUSD_ENDPOINTS` - `extended` (default) or `minimal`

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const LISTEN_ADDRESS_VAR: &str = "STATUSD_LISTEN_ADDRESS";
pub const SHUTDOWN_GRACE_VAR: &str = "STATUSD_SHUTDOWN_GRACE_SECS";
pub const ENDPOINTS_VAR: &str = "STATUSD_ENDPOINTS";

/// Default listen address (all interfaces, port 8080)
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Default time in-flight requests get to finish after shutdown begins
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value:?}")]
    InvalidListenAddress { var: &'static str, value: String },

    #[error("{var} must be a positive whole number of seconds: {value:?}")]
    InvalidGracePeriod { var: &'static str, value: String },

    #[error("{var} must be \"extended\" or \"minimal\": {value:?}")]
    InvalidEndpoints { var: &'static str, value: String },
}

/// Which routes the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoints {
    /// `/health` and `/` only
    Minimal,
    /// `/health`, `/`, `/status` and `/metrics`
    #[default]
    Extended,
}

impl FromStr for Endpoints {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "extended" => Ok(Self::Extended),
            _ => Err(ConfigError::InvalidEndpoints {
                var: ENDPOINTS_VAR,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_address: SocketAddr,
    pub shutdown_grace: Duration,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Create config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable lookup
    ///
    /// Unset or blank variables fall back to defaults; set but malformed
    /// ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let listen_address = match get(LISTEN_ADDRESS_VAR) {
            Some(value) => parse_listen_address(&value).ok_or(
                ConfigError::InvalidListenAddress {
                    var: LISTEN_ADDRESS_VAR,
                    value,
                },
            )?,
            None => defaults.listen_address,
        };

        let shutdown_grace = match get(SHUTDOWN_GRACE_VAR) {
            Some(value) => match value.trim().parse::<u64>() {
                // A zero timeout can expire before even an idle server drains
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidGracePeriod {
                        var: SHUTDOWN_GRACE_VAR,
                        value,
                    })
                }
            },
            None => defaults.shutdown_grace,
        };

        let endpoints = match get(ENDPOINTS_VAR) {
            Some(value) => value.parse::<Endpoints>()?,
            None => defaults.endpoints,
        };

        Ok(Self {
            listen_address,
            shutdown_grace,
            endpoints,
        })
    }
}

/// Parse a listen address, accepting the host-less `:8080` form
fn parse_listen_address(value: &str) -> Option<SocketAddr> {
    let value = value.trim();
    match value.strip_prefix(':') {
        Some(port) => port
            .parse::<u16>()
            .ok()
            .map(|port| SocketAddr::from(([0, 0, 0, 0], port))),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
