//! Prometheus exporter for HashiCorp Vault.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use vault_exporter::config::ConfigError;
use vault_exporter::{ExporterConfig, HttpServer, VaultClient, VaultCollector};
use vault_exporter_common::{BuildInfo, LogFormat, LoggingConfig, init_tracing};

const PROGRAM: &str = "vault_exporter";

/// Prometheus exporter for HashiCorp Vault.
#[derive(Parser, Debug)]
#[command(name = "vault_exporter")]
#[command(about = "Export Vault health as Prometheus metrics")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address")]
    listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path")]
    telemetry_path: Option<String>,

    /// Address of the Vault server.
    #[arg(long = "vault-addr", env = "VAULT_ADDR")]
    vault_addr: Option<String>,

    /// The path to a PEM-encoded CA cert file to use to verify the Vault server SSL certificate.
    #[arg(long = "vault-tls-cacert", env = "VAULT_CACERT")]
    vault_ca_cert: Option<PathBuf>,

    /// The path to the certificate for Vault communication.
    #[arg(long = "vault-tls-client-cert", env = "VAULT_CLIENT_CERT")]
    vault_client_cert: Option<PathBuf>,

    /// The path to the private key for Vault communication.
    #[arg(long = "vault-tls-client-key", env = "VAULT_CLIENT_KEY")]
    vault_client_key: Option<PathBuf>,

    /// Set SSL to ignore certificate validation.
    #[arg(
        long = "insecure-ssl",
        env = "VAULT_SKIP_VERIFY",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    insecure_ssl: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format (text, json).
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print build information and exit.
    Version,
}

impl Args {
    /// Apply command-line overrides on top of file/default configuration.
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(listen) = self.listen_address {
            config.web.listen = listen;
        }
        if let Some(path) = self.telemetry_path {
            config.web.path = path;
        }
        if let Some(address) = self.vault_addr {
            config.vault.address = address;
        }
        if let Some(ca_cert) = self.vault_ca_cert {
            config.vault.ca_cert = Some(ca_cert);
        }
        if let Some(client_cert) = self.vault_client_cert {
            config.vault.client_cert = Some(client_cert);
        }
        if let Some(client_key) = self.vault_client_key {
            config.vault.client_key = Some(client_key);
        }
        if self.insecure_ssl {
            config.vault.insecure = true;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }

    /// Load the config file (if any), apply overrides and validate the result.
    fn resolve_config(self) -> Result<ExporterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::load_from_file(path)?,
            None => ExporterConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let build = BuildInfo::current();

    if args.command == Some(Command::Version) {
        println!("{}", build.report(PROGRAM));
        return Ok(());
    }

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            // No usable logging config yet, report with the defaults
            let _ = init_tracing(&LoggingConfig::default());
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    init_tracing(&config.logging)?;

    info!(build = %build.info(), "Starting {}", PROGRAM);
    info!(context = %build.context(), "Build context");

    let client = VaultClient::new(&config.vault).inspect_err(|e| {
        error!(error = %e, "Failed to create Vault client");
    })?;
    info!(url = %client.health_url(), "Monitoring Vault health endpoint");

    let collector = Arc::new(VaultCollector::new(client));
    let listen_addr = config.web.socket_addr()?;
    let http_server = HttpServer::new(collector, listen_addr, config.web.path.clone(), build);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut http_task = tokio::spawn(async move { http_server.run(shutdown_rx).await });

    tokio::select! {
        result = &mut http_task => {
            // The server only returns early on failure (e.g. the address is taken).
            let result = result.map_err(anyhow::Error::from).and_then(|r| r);
            if let Err(e) = &result {
                error!(error = %e, "HTTP server failed");
            }
            return result;
        }
        signal = shutdown_signal() => {
            info!(signal, "Received shutdown signal, shutting down...");
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    if tokio::time::timeout(Duration::from_secs(5), http_task)
        .await
        .is_err()
    {
        error!("HTTP server did not stop within 5s");
    }

    info!("Exporter stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM and name the one received.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
