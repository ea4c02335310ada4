//! Configuration shared by the binaries

use std::net::{IpAddr, Ipv4Addr};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{DEFAULT_HASH, DEFAULT_HOST, DEFAULT_PORT};

/// All configuration. Every section falls back to its defaults when missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Where the facade connects and which hash table it uses.
    pub client: ClientConfig,
    /// How the in-memory server listens.
    pub server: ServerConfig,
}

/// Connection settings for [`RedisUtils`].
///
/// [`RedisUtils`]: crate::RedisUtils
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address of the Redis server.
    pub host: String,
    /// Port of the Redis server.
    pub port: u16,
    /// Name of the default hash table.
    pub hash: String,
}

/// Network settings for [`Server`].
///
/// [`Server`]: crate::Server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The host address.
    pub host: IpAddr,
    /// The port number. 0 picks any free port.
    pub port: u16,
    /// Max number of concurrent connections that can be served by the server.
    pub max_connections: usize,
    /// Min number of milliseconds to wait for when retrying to accept a new connection.
    pub min_backoff_ms: u64,
    /// Max number of milliseconds to wait for when retrying to accept a new connection.
    pub max_backoff_ms: u64,
}

impl Configuration {
    /// Reads the configuration from an optional file, then from environment variables
    /// prefixed with `REDIS_UTILS`, e.g. `REDIS_UTILS__CLIENT__PORT=6380`.
    pub fn get(name: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(name) = name {
            builder = builder.add_source(File::with_name(name));
        }
        builder
            .add_source(
                Environment::with_prefix("REDIS_UTILS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl ClientConfig {
    /// The `host:port` address of the server.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            hash: DEFAULT_HASH.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_connections: 128,
            min_backoff_ms: 1,
            max_backoff_ms: 64000,
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> Configuration {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_source_uses_defaults() {
        let conf = from_toml("");
        assert_eq!(conf.client.host, "127.0.0.1");
        assert_eq!(conf.client.port, 6379);
        assert_eq!(conf.client.hash, "apm_custom_goods");
        assert_eq!(conf.client.addr(), "127.0.0.1:6379");
        assert_eq!(conf.server.max_connections, 128);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let conf = from_toml(
            r#"
            [client]
            hash = "sessions"

            [server]
            port = 0
            "#,
        );
        assert_eq!(conf.client.hash, "sessions");
        assert_eq!(conf.client.port, 6379);
        assert_eq!(conf.server.port, 0);
        assert_eq!(conf.server.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
