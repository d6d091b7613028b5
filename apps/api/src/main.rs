mod config;
mod documents;
mod errors;
mod payments;
mod routes;
mod security;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::renderer::BasicRenderer;
use crate::payments::gateway::PaystackClient;
use crate::routes::build_router;
use crate::security::gate::Gate;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required secrets)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting API v{}", env!("CARGO_PKG_VERSION"));

    // Request gate: rate-limit counters + CSRF token store, in-memory,
    // cleared on restart.
    let gate = Arc::new(Gate::new(config.session_secret.clone()));

    // Payment gateway client (bounded timeout, no retries)
    let gateway = Arc::new(PaystackClient::new(config.paystack_secret_key.clone()));
    info!("Payment gateway client initialized");

    // Document renderer
    let renderer = Arc::new(BasicRenderer);

    let static_dir = config.static_dir.clone();
    let port = config.port;

    // Build app state
    let state = AppState {
        config,
        gate,
        gateway,
        renderer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    info!("Serving static front end from {static_dir}");

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
