//! Vault health data model and the source abstraction the collector reads from.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health of a single Vault node, as reported by `/v1/sys/health`.
///
/// Created fresh on every scrape and dropped once rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Missing flags read as `false`.
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub standby: bool,
    #[serde(default)]
    pub version: String,
    /// Empty on an uninitialised node.
    #[serde(default)]
    pub cluster_name: String,
    /// Empty on an uninitialised node.
    #[serde(default)]
    pub cluster_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_standby: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_performance_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_dr_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time_utc: Option<i64>,
}

/// Failure to obtain a health snapshot. No partial data accompanies it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to Vault failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Vault returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode Vault health response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can report the current health of a Vault node.
pub trait HealthSource: Send + Sync + 'static {
    /// Fetch the current health snapshot.
    fn fetch_health(&self) -> impl Future<Output = Result<HealthSnapshot, FetchError>> + Send;
}
