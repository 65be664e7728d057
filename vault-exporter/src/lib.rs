//! Prometheus exporter for HashiCorp Vault health.
//!
//! On every scrape the exporter queries a Vault node's `/v1/sys/health`
//! endpoint once and republishes the answer as a fixed set of gauges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Vault node    │<────│    Collector    │<────│   HTTP Server   │
//! │ (/v1/sys/health)│     │ (per scrape)    │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Metrics
//! - `vault_up` - whether the health query succeeded
//! - `vault_initialized`, `vault_sealed`, `vault_standby` - node state as 0/1
//! - `vault_info{version, cluster_name, cluster_id}` - constant 1
//! - `vault_exporter_build_info{version, revision, branch, rustversion}` - constant 1
//!
//! When the query fails only `vault_up 0` is emitted for Vault.
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod client;
pub mod collector;
pub mod config;
pub mod exposition;
pub mod health;
pub mod http;
pub mod metrics;

pub use client::{ClientError, VaultClient};
pub use collector::{SharedCollector, VaultCollector};
pub use config::ExporterConfig;
pub use health::{FetchError, HealthSnapshot, HealthSource};
pub use http::HttpServer;
