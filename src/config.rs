//! Relay configuration parsed from environment variables.
//!
//! Every variable is optional. A variable that is set but does not parse is
//! an error: the relay refuses to start rather than guess.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_MAX_ROOM_CLIENTS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// Per-connection outbound queue depth.
    pub channel_capacity: usize,
    /// Join limit per room.
    pub max_room_clients: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_room_clients: DEFAULT_MAX_ROOM_CLIENTS,
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `SKETCHROOM_BIND`: listen address, default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `SKETCHROOM_CHANNEL_CAPACITY`: default 256
    /// - `SKETCHROOM_MAX_ROOM_CLIENTS`: default 64
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a variable that is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a value that is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            bind: env_parse(&lookup, "SKETCHROOM_BIND", defaults.bind)?,
            port: env_parse(&lookup, "PORT", defaults.port)?,
            channel_capacity: env_parse(&lookup, "SKETCHROOM_CHANNEL_CAPACITY", defaults.channel_capacity)?,
            max_room_clients: env_parse(&lookup, "SKETCHROOM_MAX_ROOM_CLIENTS", defaults.max_room_clients)?,
        };
        // tokio's mpsc panics on a zero-capacity channel.
        if config.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "SKETCHROOM_CHANNEL_CAPACITY",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(config)
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid { var, value: raw.clone(), reason: e.to_string() })
}
