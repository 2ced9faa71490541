use crate::service::MarketService;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub service: MarketService,
}

/// All `/api` routes with CORS and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/market", get(handlers::get_market))
        .route("/api/signals", get(handlers::get_signals))
        .route("/api/predictions", get(handlers::get_predictions))
        .route("/api/backtest", get(handlers::get_backtest))
        .route("/api/forecast-accuracy", get(handlers::get_forecast_accuracy))
        .route("/api/weather", get(handlers::get_weather))
        .route("/api/demand", get(handlers::get_demand))
        .route("/api/recommendations", get(handlers::get_recommendations))
        .route("/api/compare", get(handlers::get_compare))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn run_server(service: MarketService, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { service }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
