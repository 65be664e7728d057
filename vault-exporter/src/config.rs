//! Configuration for the Vault exporter.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vault_exporter_common::LoggingConfig;

/// Default Vault address, matching the Vault CLI.
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] vault_exporter_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Connection to the monitored Vault node.
    #[serde(default)]
    pub vault: VaultConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vault client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault base address (default: "https://127.0.0.1:8200").
    #[serde(default = "default_vault_addr")]
    pub address: String,

    /// PEM-encoded CA bundle used to verify the Vault server certificate.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// PEM-encoded client certificate for Vault communication.
    #[serde(default)]
    pub client_cert: Option<PathBuf>,

    /// PEM-encoded private key for `client_cert`.
    #[serde(default)]
    pub client_key: Option<PathBuf>,

    /// Skip server certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_vault_addr() -> String {
    DEFAULT_VAULT_ADDR.to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: default_vault_addr(),
            ca_cert: None,
            client_cert: None,
            client_key: None,
            insecure: false,
            timeout_secs: default_timeout(),
        }
    }
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConfig {
    /// Address to listen on (default: ":9410"). A leading `:` binds all interfaces.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    ":9410".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

impl WebConfig {
    /// Resolve the listen address into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen_address(&self.listen)
    }
}

/// Parse a listen address, treating `:port` as `0.0.0.0:port`.
pub fn parse_listen_address(listen: &str) -> Result<SocketAddr, ConfigError> {
    let candidate = if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    };

    candidate
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::Validation(format!("Invalid listen address: {}", listen)))
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    ///
    /// The result is not validated: command-line overrides still apply on
    /// top of it, so callers run [`ExporterConfig::validate`] afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(vault_exporter_common::load_config(path)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.web.socket_addr()?;

        if !self.web.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.web.path == "/" {
            return Err(ConfigError::Validation(
                "Metrics path must not be the landing page /".to_string(),
            ));
        }

        match reqwest::Url::parse(&self.vault.address) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Validation(format!(
                    "Unsupported Vault address scheme '{}': {}",
                    url.scheme(),
                    self.vault.address
                )));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "Invalid Vault address '{}': {}",
                    self.vault.address, e
                )));
            }
        }

        if self.vault.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.vault.client_cert.is_some() != self.vault.client_key.is_some() {
            return Err(ConfigError::Validation(
                "client_cert and client_key must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vault_exporter_common::LogFormat;

    fn parse(content: &str) -> Result<ExporterConfig, ConfigError> {
        let config: ExporterConfig = vault_exporter_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("{}").unwrap();

        assert_eq!(config.web.listen, ":9410");
        assert_eq!(config.web.path, "/metrics");
        assert_eq!(config.vault.address, "https://127.0.0.1:8200");
        assert_eq!(config.vault.timeout_secs, 60);
        assert!(!config.vault.insecure);
        assert_eq!(config.vault.ca_cert, None);
        assert_eq!(config.vault.client_cert, None);
        assert_eq!(config.vault.client_key, None);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            vault: {
                address: "https://vault.internal:8200",
                ca_cert: "/etc/vault/ca.pem",
                client_cert: "/etc/vault/client.pem",
                client_key: "/etc/vault/client-key.pem",
                insecure: true,
                timeout_secs: 5
            },
            web: {
                listen: "127.0.0.1:9411",
                path: "/vault/metrics"
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;

        let config = parse(json).unwrap();

        assert_eq!(config.vault.address, "https://vault.internal:8200");
        assert_eq!(config.vault.ca_cert, Some(PathBuf::from("/etc/vault/ca.pem")));
        assert_eq!(
            config.vault.client_key,
            Some(PathBuf::from("/etc/vault/client-key.pem"))
        );
        assert!(config.vault.insecure);
        assert_eq!(config.vault.timeout_secs, 5);
        assert_eq!(config.web.listen, "127.0.0.1:9411");
        assert_eq!(config.web.path, "/vault/metrics");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_parse_listen_address_port_only() {
        let addr = parse_listen_address(":9410").unwrap();
        assert_eq!(addr, "0.0.0.0:9410".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_parse_listen_address_full() {
        let addr = parse_listen_address("[::1]:9410").unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9410);
    }

    #[test]
    fn test_validate_invalid_listen() {
        let result = parse(r#"{ web: { listen: "not-an-address" } }"#);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let result = parse(r#"{ web: { path: "no-leading-slash" } }"#);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with /")
        );
    }

    #[test]
    fn test_validate_root_path() {
        let result = parse(r#"{ web: { path: "/" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_bad_vault_address() {
        let result = parse(r#"{ vault: { address: "vault:8200/nope" } }"#);
        assert!(result.is_err());

        let result = parse(r#"{ vault: { address: "ftp://vault:8200" } }"#);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported Vault address scheme")
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let result = parse(r#"{ vault: { timeout_secs: 0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_cert_without_key() {
        let result = parse(r#"{ vault: { client_cert: "/tmp/cert.pem" } }"#);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must be set together")
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = ExporterConfig::load_from_file("/nonexistent/vault-exporter.json5");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_load_from_file_leaves_validation_to_caller() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ web: { path: "/" }, vault: { timeout_secs: 3 } }"#)
            .unwrap();

        let mut config = ExporterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.vault.timeout_secs, 3);
        assert!(config.validate().is_err());

        config.web.path = "/metrics".to_string();
        assert!(config.validate().is_ok());
    }
}
