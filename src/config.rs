//! Server configuration from environment variables
//!
//! Variables (all optional):
//! - `CHAT_HOST`: bind IP (default `0.0.0.0`)
//! - `CHAT_PORT`: listen port (default `3000`)
//! - `CHAT_STATIC_DIR`: directory holding `index.html` (default `static`)
//! - `CHAT_OUTBOUND_CAPACITY`: per-connection outbound queue depth (default `64`)
//! - `CHAT_DISPATCH_CAPACITY`: inbound dispatch queue depth (default `256`)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub outbound_capacity: usize,
    pub dispatch_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            static_dir: PathBuf::from("static"),
            outbound_capacity: 64,
            dispatch_capacity: 256,
        }
    }
}

/// Read and parse one variable. Unset or blank is `None`.
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    let Some(value) = std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

/// Queue capacities must be non-zero
fn parse_capacity(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match parse_var::<usize>(name)? {
        Some(0) => Err(ConfigError::InvalidValue {
            name,
            value: "0".to_string(),
        }),
        other => Ok(other),
    }
}

impl ServerConfig {
    /// Load config from environment variables, rejecting invalid values
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: parse_var("CHAT_HOST")?.unwrap_or(defaults.host),
            port: parse_var("CHAT_PORT")?.unwrap_or(defaults.port),
            static_dir: parse_var("CHAT_STATIC_DIR")?.unwrap_or(defaults.static_dir),
            outbound_capacity: parse_capacity("CHAT_OUTBOUND_CAPACITY")?
                .unwrap_or(defaults.outbound_capacity),
            dispatch_capacity: parse_capacity("CHAT_DISPATCH_CAPACITY")?
                .unwrap_or(defaults.dispatch_capacity),
        })
    }

    /// Load config from environment variables, falling back to defaults per variable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn or_default<T>(result: Result<Option<T>, ConfigError>, default: T) -> T {
            match result {
                Ok(value) => value.unwrap_or(default),
                Err(e) => {
                    tracing::warn!("{}, using default", e);
                    default
                }
            }
        }

        Self {
            host: or_default(parse_var("CHAT_HOST"), defaults.host),
            port: or_default(parse_var("CHAT_PORT"), defaults.port),
            static_dir: or_default(parse_var("CHAT_STATIC_DIR"), defaults.static_dir),
            outbound_capacity: or_default(
                parse_capacity("CHAT_OUTBOUND_CAPACITY"),
                defaults.outbound_capacity,
            ),
            dispatch_capacity: or_default(
                parse_capacity("CHAT_DISPATCH_CAPACITY"),
                defaults.dispatch_capacity,
            ),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn index_html(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}
