//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Loaded once at startup and passed into the constructors that need it;
/// the library keeps no ambient global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Tip service transport settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Client adapter settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Document store settings
    #[serde(default)]
    pub db: DbConfig,

    /// Page preview extraction settings
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::config("server.port must be > 0"));
        }
        if !self.server.debug {
            if self.server.cert_file.trim().is_empty() {
                return Err(AppError::config(
                    "server.cert_file is required when server.debug = false",
                ));
            }
            if self.server.key_file.trim().is_empty() {
                return Err(AppError::config(
                    "server.key_file is required when server.debug = false",
                ));
            }
        }
        if self.client.port == 0 {
            return Err(AppError::config("client.port must be > 0"));
        }
        if self.client.host.trim().is_empty() {
            return Err(AppError::config("client.host is empty"));
        }
        if !self.client.debug && self.client.ca_file.trim().is_empty() {
            return Err(AppError::config(
                "client.ca_file is required when client.debug = false",
            ));
        }
        if self.db.uri.trim().is_empty() {
            return Err(AppError::config("db.uri is empty"));
        }
        if self.db.name.trim().is_empty() {
            return Err(AppError::config("db.name is empty"));
        }
        if self.db.collection.trim().is_empty() {
            return Err(AppError::config("db.collection is empty"));
        }
        if self.preview.timeout_secs == 0 {
            return Err(AppError::config("preview.timeout_secs must be > 0"));
        }
        if self.preview.user_agent.trim().is_empty() {
            return Err(AppError::config("preview.user_agent is empty"));
        }
        Ok(())
    }
}

/// Tip service transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port the service listens on
    #[serde(default = "defaults::server_port")]
    pub port: u16,

    /// Serve plaintext instead of TLS
    #[serde(default = "defaults::debug")]
    pub debug: bool,

    /// PEM certificate chain, used when debug = false
    #[serde(default = "defaults::cert_file")]
    pub cert_file: String,

    /// PEM private key, used when debug = false
    #[serde(default = "defaults::key_file")]
    pub key_file: String,

    /// Bound on a single create operation (pre-check + extraction + insert)
    #[serde(default = "defaults::op_timeout")]
    pub op_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::server_port(),
            debug: defaults::debug(),
            cert_file: defaults::cert_file(),
            key_file: defaults::key_file(),
            op_timeout_secs: defaults::op_timeout(),
        }
    }
}

/// Client adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host name the client dials (also the TLS server name)
    #[serde(default = "defaults::client_host")]
    pub host: String,

    /// Port the client dials
    #[serde(default = "defaults::server_port")]
    pub port: u16,

    /// Dial plaintext instead of TLS
    #[serde(default = "defaults::debug")]
    pub debug: bool,

    /// PEM CA certificate anchoring trust in the server, used when debug = false
    #[serde(default = "defaults::ca_file")]
    pub ca_file: String,

    /// Bound on a single request/response call
    #[serde(default = "defaults::unary_timeout")]
    pub unary_timeout_secs: u64,

    /// Bound on draining a full response stream
    #[serde(default = "defaults::stream_timeout")]
    pub stream_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: defaults::client_host(),
            port: defaults::server_port(),
            debug: defaults::debug(),
            ca_file: defaults::ca_file(),
            unary_timeout_secs: defaults::unary_timeout(),
            stream_timeout_secs: defaults::stream_timeout(),
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// MongoDB connection URI
    #[serde(default = "defaults::db_uri")]
    pub uri: String,

    /// Database name
    #[serde(default = "defaults::db_name")]
    pub name: String,

    /// Collection holding tip documents
    #[serde(default = "defaults::db_collection")]
    pub collection: String,

    /// Readiness probe attempts before the server gives up
    #[serde(default = "defaults::ready_attempts")]
    pub ready_attempts: u32,

    /// Delay between readiness probe attempts in milliseconds
    #[serde(default = "defaults::ready_delay")]
    pub ready_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            uri: defaults::db_uri(),
            name: defaults::db_name(),
            collection: defaults::db_collection(),
            ready_attempts: defaults::ready_attempts(),
            ready_delay_ms: defaults::ready_delay(),
        }
    }
}

/// Page preview extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// User-Agent header for page fetches
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Page fetch timeout in seconds
    #[serde(default = "defaults::preview_timeout")]
    pub timeout_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::preview_timeout(),
        }
    }
}

/// Default values for configuration fields.
mod defaults {
    pub fn server_port() -> u16 {
        50051
    }

    // Secured transport unless the configuration explicitly opts out.
    pub fn debug() -> bool {
        false
    }

    pub fn cert_file() -> String {
        "ssl/server.crt".to_string()
    }

    pub fn key_file() -> String {
        "ssl/server.pem".to_string()
    }

    pub fn ca_file() -> String {
        "ssl/ca.crt".to_string()
    }

    pub fn op_timeout() -> u64 {
        10
    }

    pub fn client_host() -> String {
        "localhost".to_string()
    }

    pub fn unary_timeout() -> u64 {
        5
    }

    pub fn stream_timeout() -> u64 {
        15
    }

    pub fn db_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }

    pub fn db_name() -> String {
        "tipboard".to_string()
    }

    pub fn db_collection() -> String {
        "tips".to_string()
    }

    pub fn ready_attempts() -> u32 {
        10
    }

    pub fn ready_delay() -> u64 {
        500
    }

    pub fn user_agent() -> String {
        "tipboard/0.1 (+preview-extractor)".to_string()
    }

    pub fn preview_timeout() -> u64 {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 50051);
        // Transport is secured unless the config opts into plaintext.
        assert!(!config.server.debug);
        assert!(!config.client.debug);
        assert_eq!(config.db.uri, "mongodb://localhost:27017");
        assert_eq!(config.client.unary_timeout_secs, 5);
        assert_eq!(config.client.stream_timeout_secs, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 60000

            [db]
            name = "bookmarks"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 60000);
        assert!(!config.server.debug);
        assert_eq!(config.db.name, "bookmarks");
        assert_eq!(config.db.collection, "tips");
    }

    #[test]
    fn test_validate_rejects_missing_tls_material() {
        let mut config = Config::default();
        config.server.debug = false;
        config.server.cert_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_collection() {
        let mut config = Config::default();
        config.db.collection = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
