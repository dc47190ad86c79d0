//! PYQ Hub API Gateway
//!
//! HTTP boundary of the paper catalog.
//! Handles:
//! - Request validation and routing
//! - Multipart uploads and file downloads
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod uploads;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use pyqhub_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics, CatalogStore, InMemoryStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::uploads::UploadStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn CatalogStore>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = if config.catalog.seed_sample_universities {
            InMemoryStore::with_sample_data()
        } else {
            InMemoryStore::new()
        };

        Self {
            uploads: Arc::new(UploadStore::new(&config.storage)),
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match std::env::var("APP_CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => AppConfig::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config.observability);
    info!("Starting PYQ Hub API Gateway v{}", pyqhub_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(port = config.observability.metrics_port, "Metrics exporter listening");
    }
    metrics::register_metrics();

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    // Create app state
    let state = AppState::new(config);
    if let Err(e) = state.uploads.check_writable().await {
        tracing::warn!(
            error = %e,
            upload_dir = %state.uploads.root().display(),
            "Upload directory is not writable; uploads will fail"
        );
    }

    // Build the router
    let app = create_router(state);

    // Start the server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Structured logging; `RUST_LOG` wins over the configured level
fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let upload_limit = state.uploads.body_limit();

    // API routes
    let mut api_routes = Router::new()
        // University endpoints
        .route(
            "/universities",
            get(handlers::universities::list_universities)
                .post(handlers::universities::create_university),
        )
        .route("/universities/{id}", get(handlers::universities::get_university))
        .route(
            "/universities/{id}/papers",
            get(handlers::universities::list_university_papers),
        )

        // Paper endpoints
        .route("/papers", get(handlers::papers::list_papers))
        .route("/papers/search", get(handlers::papers::search_papers))
        .route("/papers/filter", post(handlers::papers::filter_papers))
        .route(
            "/papers/upload",
            post(handlers::upload::upload_papers).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/papers/{id}", get(handlers::papers::get_paper))
        .route("/papers/{id}/download", get(handlers::papers::download_paper))

        // Statistics
        .route("/stats", get(handlers::stats::catalog_stats));

    if config.rate_limit.enabled {
        let rate_limit = middleware::RateLimit::new(&config.rate_limit);
        api_routes = api_routes.layer(from_fn_with_state(rate_limit, middleware::rate_limit_middleware));
    }

    // Compose the app
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .route_layer(from_fn(middleware::track_requests))
        .nest_service("/uploads", ServeDir::new(&config.storage.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
