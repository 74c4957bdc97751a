// Main entry point - Dependency injection, pollers and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::data_source::ZoneDataSource;
use crate::application::poller::{Poller, PollerHandle, Schedule};
use crate::application::session::CredentialSession;
use crate::application::snapshot_store::SnapshotStore;
use crate::application::transformer::Transformer;
use crate::infrastructure::config::{load_app_config, AppConfig, SourceKind};
use crate::infrastructure::data_api_source::DataApiSource;
use crate::infrastructure::historical_source::HistoricalSource;
use crate::infrastructure::realm_identity::RealmIdentity;
use crate::infrastructure::scrape_source::ScrapeSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    close_chart, expand_zone, get_dashboard, get_historical, get_snapshot, health_check,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load dashboard configuration")?;

    let transformer = Arc::new(Transformer::from_settings(&config.display, &config.zones));
    let current_store = Arc::new(SnapshotStore::new());
    let historical_store = config
        .historical
        .as_ref()
        .map(|_| Arc::new(SnapshotStore::new()));

    let session = acquire_session(&config).await;

    // Start pollers (application layer)
    let mut pollers: Vec<PollerHandle> = Vec::new();
    if let Some(source) = current_source(&config, session.is_some())? {
        let period = Duration::from_secs(config.polling.current_interval_secs.max(1));
        pollers.push(
            Poller::new(
                source,
                session.clone(),
                transformer.clone(),
                current_store.clone(),
                Schedule::Every(period),
            )
            .spawn(),
        );
    }
    if let (Some(settings), Some(store)) = (&config.historical, &historical_store) {
        pollers.push(
            Poller::new(
                Arc::new(HistoricalSource::new(settings.url.clone())),
                session.clone(),
                transformer.clone(),
                store.clone(),
                Schedule::Once,
            )
            .spawn(),
        );
    }

    let dashboard_service = Arc::new(DashboardService::new(
        current_store.clone(),
        historical_store,
        config.zones.clone(),
        config.display.panel_style(),
    ));

    let state = Arc::new(AppState {
        dashboard_service,
        current_store,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/dashboard/zones/:zone/expand", post(expand_zone))
        .route("/api/dashboard/close", post(close_chart))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/historical", get(get_historical))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;
    tracing::info!("Starting furnace-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for poller in pollers {
        poller.shutdown().await;
    }

    Ok(())
}

/// Log in once. Missing secrets or a failed login are logged and leave authenticated polling disabled.
async fn acquire_session(config: &AppConfig) -> Option<Arc<CredentialSession>> {
    let identity = config.identity.as_ref()?;
    let (Some(email), Some(password)) = (&identity.email, &identity.password) else {
        tracing::error!("Identity email or password not set, data polling will not start");
        return None;
    };
    let provider = Arc::new(RealmIdentity::new(
        identity.base_url.clone(),
        identity.app_id.clone(),
    ));
    let session = Arc::new(CredentialSession::new(provider));

    match session.acquire(email, password).await {
        Ok(_) => Some(session),
        Err(e) => {
            tracing::error!("Login failed, data polling will not start: {}", e);
            None
        }
    }
}

/// The live feed. An unauthenticated data-API deployment gets none.
fn current_source(
    config: &AppConfig,
    authenticated: bool,
) -> anyhow::Result<Option<Arc<dyn ZoneDataSource>>> {
    match config.source.kind {
        SourceKind::DataApi => {
            let settings = config
                .data_api
                .as_ref()
                .context("source.kind is data_api but [data_api] is not configured")?;
            if !authenticated {
                return Ok(None);
            }
            let source: Arc<dyn ZoneDataSource> = Arc::new(DataApiSource::new(settings));
            Ok(Some(source))
        }
        SourceKind::Scrape => {
            let settings = config
                .scrape
                .as_ref()
                .context("source.kind is scrape but [scrape] is not configured")?;
            let source: Arc<dyn ZoneDataSource> = Arc::new(ScrapeSource::new(settings)?);
            Ok(Some(source))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
