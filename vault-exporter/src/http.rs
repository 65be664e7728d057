//! HTTP server for the metrics endpoint and landing page.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;
use vault_exporter_common::BuildInfo;

use crate::collector::SharedCollector;
use crate::exposition;
use crate::health::HealthSource;
use crate::metrics::build_info_sample;

/// Application state shared across handlers.
struct AppState<S> {
    collector: SharedCollector<S>,
    build: BuildInfo,
    landing_page: Arc<str>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            build: self.build,
            landing_page: self.landing_page.clone(),
        }
    }
}

/// Create the HTTP router.
fn create_router<S: HealthSource>(
    collector: SharedCollector<S>,
    metrics_path: &str,
    build: BuildInfo,
) -> Router {
    let state = AppState {
        collector,
        build,
        landing_page: landing_page(metrics_path, &build).into(),
    };

    Router::new()
        .route(metrics_path, get(metrics_handler::<S>))
        .route("/", get(landing_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handler for the metrics endpoint. Always answers 200; Vault failures
/// show up as `vault_up 0`.
async fn metrics_handler<S: HealthSource>(State(state): State<AppState<S>>) -> Response {
    let samples = state.collector.collect().await;

    let mut body = exposition::render(&samples);
    exposition::render_into(&mut body, &[build_info_sample(&state.build)]);

    (
        StatusCode::OK,
        [("content-type", exposition::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Handler for the landing page.
async fn landing_handler<S: HealthSource>(State(state): State<AppState<S>>) -> Html<String> {
    Html(state.landing_page.to_string())
}

fn landing_page(metrics_path: &str, build: &BuildInfo) -> String {
    format!(
        r#"<html>
<head><title>Vault Exporter</title></head>
<body>
<h1>Vault Exporter</h1>
<p><a href='{path}'>Metrics</a></p>
<h2>Build</h2>
<pre>{info} {context}</pre>
</body>
</html>
"#,
        path = html_escape(metrics_path),
        info = html_escape(&build.info()),
        context = html_escape(&build.context()),
    )
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTTP server configuration.
pub struct HttpServer<S> {
    collector: SharedCollector<S>,
    listen_addr: SocketAddr,
    metrics_path: String,
    build: BuildInfo,
}

impl<S: HealthSource> HttpServer<S> {
    /// Create a new HTTP server.
    pub fn new(
        collector: SharedCollector<S>,
        listen_addr: SocketAddr,
        metrics_path: String,
        build: BuildInfo,
    ) -> Self {
        Self {
            collector,
            listen_addr,
            metrics_path,
            build,
        }
    }

    /// Bind the listen address and serve until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "Starting HTTP server"
        );

        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let local_addr = listener.local_addr()?;
        let router = create_router(self.collector, &self.metrics_path, self.build);

        info!(
            addr = %local_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
