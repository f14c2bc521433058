//! Configuration for the engine TCP server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `ENGINE_BIND_ADDR`   (default: "0.0.0.0")
//! - `ENGINE_PORT`        (default: "9000")
//! - `ENGINE_MAX_CLIENTS` (default: "1024")
//! - `ENGINE_DATA_DIR`    (default: "io/output")
//! - `ENGINE_PAIR`        (default: unset, any pair accepted)
//! - `ENGINE_LOG`         (default: "info", `RUST_LOG` wins when set)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Where `orderbook.json` and `trades.json` are loaded from and saved to.
    pub data_dir: PathBuf,

    /// Restrict the engine to a single instrument pair.
    pub pair: Option<String>,

    /// Fallback log filter.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 9000,
            max_clients: 1024,
            data_dir: PathBuf::from("io/output"),
            pair: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to [`Config::default`].
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            bind_addr: env::var("ENGINE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: read_env_or_default("ENGINE_PORT", defaults.port)?,
            max_clients: read_env_or_default("ENGINE_MAX_CLIENTS", defaults.max_clients)?,
            data_dir: env::var("ENGINE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            pair: env::var("ENGINE_PAIR").ok().filter(|p| !p.trim().is_empty()),
            log_level: env::var("ENGINE_LOG").unwrap_or(defaults.log_level),
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {val:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.socket_addr_string(), "0.0.0.0:9000");
        assert_eq!(config.max_clients, 1024);
        assert_eq!(config.data_dir, PathBuf::from("io/output"));
        assert!(config.pair.is_none());
    }

    #[test]
    fn env_override_and_parse_error() {
        // Keys unique to this test so parallel tests do not interfere.
        env::set_var("ENGINE_TEST_PORT_OK", " 9100 ");
        env::set_var("ENGINE_TEST_PORT_BAD", "ninety");

        assert_eq!(read_env_or_default("ENGINE_TEST_PORT_OK", 1u16).unwrap(), 9100);
        assert_eq!(read_env_or_default("ENGINE_TEST_PORT_UNSET", 7u16).unwrap(), 7);

        let err = read_env_or_default("ENGINE_TEST_PORT_BAD", 1u16).unwrap_err();
        assert!(err.to_string().contains("ENGINE_TEST_PORT_BAD"));
    }
}
