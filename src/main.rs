mod config;
mod models;
mod routes;
mod services;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::UserRegistry;
use crate::services::{
    catalog_cache::CatalogCache, epg_cache::EpgCache, fetcher::Fetcher,
    refresh::start_refresh_task,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub registry: Arc<UserRegistry>,
    pub fetcher: Fetcher,
    pub catalog: Arc<CatalogCache>,
    pub epg: Arc<EpgCache>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xtream_bridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting xtream-bridge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Stream mode: {:?}", config.stream_mode);

    // Load the static user registry once, before serving traffic
    let registry = Arc::new(UserRegistry::load(Path::new(&config.users_file), &config)?);
    tracing::info!(
        "Loaded {} user(s) from {}",
        registry.len(),
        config.users_file
    );
    if registry.is_empty() {
        tracing::warn!("User registry is empty; every request will be rejected");
    }

    // Initialize services
    let fetcher = Fetcher::new(&config)?;
    let catalog = Arc::new(CatalogCache::new(fetcher.clone()));
    let epg = Arc::new(EpgCache::new(
        fetcher.clone(),
        Duration::from_secs(config.epg_ttl_secs),
    ));

    // Periodic catalog refresh (runs in background when enabled)
    if config.catalog_refresh_secs > 0 {
        tokio::spawn(start_refresh_task(
            registry.clone(),
            catalog.clone(),
            config.catalog_refresh_secs,
        ));
        tracing::info!(
            "Catalog refresh task started (every {}s)",
            config.catalog_refresh_secs
        );
    }

    // Build application state
    let state = Arc::new(AppState {
        config,
        registry,
        fetcher,
        catalog,
        epg,
        start_time: Instant::now(),
    });

    // Build router
    let app = Router::new()
        // Status endpoints
        .route("/", get(routes::admin::root))
        .route("/health", get(routes::admin::health_check))
        // Xtream panel API
        .route(
            "/player_api.php",
            get(routes::player_api::player_api).post(routes::player_api::player_api),
        )
        .route("/get.php", get(routes::export::get_playlist))
        .route("/xmltv.php", get(routes::export::get_epg))
        // Stream gateway
        .route(
            "/live/:username/:password/:stream",
            get(routes::stream::live_stream),
        )
        // Admin endpoints (protected by ADMIN_KEY)
        .route("/admin/reload", post(routes::admin::reload_all))
        .route("/admin/reload/:username", post(routes::admin::reload_user))
        .route(
            "/admin/cache/:username",
            delete(routes::admin::invalidate_user),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
