use analytics::AnalyticsEngine;
use axum::{
    Router,
    routing::get,
};
use configuration::settings::Config;
use database::{DbRepository, TradeStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TradeStore>,
    pub engine: AnalyticsEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self {
            store,
            engine: AnalyticsEngine::new(),
        }
    }
}

/// Builds the API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        // Registered before `/:id` so "export" is never parsed as a trade id.
        .route("/api/trades/export", get(handlers::export_trades))
        .route(
            "/api/trades/:id",
            get(handlers::get_trade)
                .patch(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route(
            "/api/capital",
            get(handlers::get_capital).post(handlers::update_capital),
        )
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/analytics/years", get(handlers::get_years))
        .route("/api/analytics/quarterly", get(handlers::get_quarterly))
        .route("/api/analytics/yearly", get(handlers::get_yearly))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects to PostgreSQL, applies migrations and serves on the configured address.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;

    let db_pool = database::connect(&config.database).await?;
    database::run_migrations(&db_pool).await?;
    let repo = DbRepository::new(db_pool, config.ledger.default_total_capital);

    let state = Arc::new(AppState::new(Arc::new(repo)));
    serve(addr, state).await
}
