//! HTTP server using Axum
//!
//! Serves the message endpoint, the subscriber stream and the dashboard page.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::config::{ApiServerConfig, Config};
use crate::error::{PulseError, Result};
use crate::models::MessageIdGenerator;
use crate::stream::ConnectionRegistry;

use super::middleware::cors_layer;
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: ConnectionRegistry,
    pub ids: Arc<MessageIdGenerator>,
    pub started_at: Instant,
    /// Flips to `true` when the server is stopping; open streams end on it
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(config: Config, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            ids: Arc::new(MessageIdGenerator::new()),
            started_at: Instant::now(),
            shutdown,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Config, shutdown: watch::Receiver<bool>) -> Self {
        if config.auth.api_key.is_none() {
            warn!("API_KEY is not set; every publish will be rejected");
        }

        Self {
            config: config.api.clone(),
            state: AppState::new(config, shutdown),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let cors = cors_layer(&self.config.cors_origins);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| PulseError::InvalidConfig(format!("invalid listen address: {}", e)))?;

        let router = self.build_router();

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| PulseError::Internal(e.to_string()))?;

        info!(
            "API server shut down ({} subscribers still registered)",
            self.state.registry.len()
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config(api_key: Option<&str>) -> Config {
    use crate::config::{AuthConfig, DashboardConfig, LogConfig, StreamConfig};

    Config {
        api: ApiServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_origins: vec![],
        },
        auth: AuthConfig {
            api_key: api_key.map(str::to_string),
        },
        stream: StreamConfig::default(),
        dashboard: DashboardConfig::default(),
        log: LogConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get(server: &ApiServer, uri: &str) -> (StatusCode, String) {
        let response = server
            .build_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_subscribers() {
        let (_tx, rx) = watch::channel(false);
        let server = ApiServer::new(test_config(Some("k")), rx);

        let (status, body) = get(&server, "/health").await;
        assert_eq!(status, StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "pulseboard");
        assert_eq!(body["subscribers"], 0);
    }

    #[tokio::test]
    async fn test_dashboard_page_uses_configured_cap() {
        let (_tx, rx) = watch::channel(false);
        let mut config = test_config(None);
        config.dashboard.max_messages = 7;
        let server = ApiServer::new(config, rx);

        let (status, body) = get(&server, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Message Dashboard"));
        assert!(body.contains("const maxVisibleMessages = 7;"));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_address() {
        let (_tx, rx) = watch::channel(false);
        let mut config = test_config(None);
        config.api.host = "not an address".to_string();
        let server = ApiServer::new(config, rx.clone());

        let err = server.run(rx).await.unwrap_err();
        assert!(matches!(err, PulseError::InvalidConfig(_)));
    }
}
