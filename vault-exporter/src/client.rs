//! HTTP client for the Vault health endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::VaultConfig;
use crate::health::{FetchError, HealthSnapshot, HealthSource};

/// Path of the health endpoint relative to the Vault address.
pub const HEALTH_PATH: &str = "/v1/sys/health";

/// Status code Vault is asked to use for every non-active state, so that
/// sealed, uninitialised and standby nodes still answer with a 2xx body.
const NON_ACTIVE_CODE: &str = "299";

/// Query overriding Vault's default per-state status codes.
const HEALTH_QUERY: [(&str, &str); 5] = [
    ("uninitcode", NON_ACTIVE_CODE),
    ("sealedcode", NON_ACTIVE_CODE),
    ("standbycode", NON_ACTIVE_CODE),
    ("drsecondarycode", NON_ACTIVE_CODE),
    ("performancestandbycode", NON_ACTIVE_CODE),
];

/// Errors raised while building the client at startup.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CA certificate in {path}: {source}")]
    CaCert {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("no certificates found in {0}")]
    EmptyCaBundle(PathBuf),

    #[error("invalid client certificate or key: {0}")]
    Identity(#[source] reqwest::Error),

    #[error("client certificate and key must be provided together")]
    IncompleteIdentity,

    #[error("invalid Vault address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Client for a single Vault node's health endpoint.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    health_url: reqwest::Url,
}

impl VaultClient {
    /// Build a client from configuration, loading any TLS material eagerly.
    pub fn new(config: &VaultConfig) -> Result<Self, ClientError> {
        let health_url = health_url(&config.address)?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if config.insecure {
            warn!("TLS certificate verification disabled for Vault connection");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_path) = &config.ca_cert {
            let pem = read_pem(ca_path)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|source| {
                ClientError::CaCert {
                    path: ca_path.clone(),
                    source,
                }
            })?;
            if certs.is_empty() {
                return Err(ClientError::EmptyCaBundle(ca_path.clone()));
            }
            debug!(path = %ca_path.display(), count = certs.len(), "Loaded Vault CA certificates");
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        match (&config.client_cert, &config.client_key) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_pem(cert_path)?;
                pem.push(b'\n');
                pem.extend(read_pem(key_path)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(ClientError::Identity)?;
                debug!(cert = %cert_path.display(), "Loaded Vault client certificate");
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => return Err(ClientError::IncompleteIdentity),
        }

        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self { http, health_url })
    }

    /// Full URL of the health endpoint, without the status-code query.
    pub fn health_url(&self) -> &reqwest::Url {
        &self.health_url
    }
}

impl HealthSource for VaultClient {
    async fn fetch_health(&self) -> Result<HealthSnapshot, FetchError> {
        let response = self
            .http
            .get(self.health_url.clone())
            .query(&HEALTH_QUERY)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Only 4xx/5xx are failures; anything else is decoded like a 2xx.
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn health_url(address: &str) -> Result<reqwest::Url, ClientError> {
    let invalid = |reason: String| ClientError::Address {
        address: address.to_string(),
        reason,
    };

    let base = reqwest::Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }

    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), HEALTH_PATH);
    reqwest::Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ClientError> {
    std::fs::read(path).map_err(|source| ClientError::Read {
        path: path.to_path_buf(),
        source,
    })
}
