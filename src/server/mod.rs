mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::updater::Geolocator;

pub fn build_router(geolocator: Arc<Geolocator>) -> Router {
    let state = Arc::new(AppState { geolocator });

    Router::new()
        .route("/api/instances", get(handlers::list_instances))
        .route(
            "/api/instances/{id}",
            get(handlers::get_instance)
                .put(handlers::reconfigure_instance)
                .delete(handlers::deactivate_instance),
        )
        .route("/api/instances/{id}/update", post(handlers::update_instance))
        .route(
            "/api/timezone",
            get(handlers::get_timezone).post(handlers::set_timezone),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(geolocator: Arc<Geolocator>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(geolocator);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("geolocator listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
