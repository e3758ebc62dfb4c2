use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use interview_room_core::api;
use interview_room_core::config::Config;
use interview_room_core::provider::ProviderAdminClient;
use interview_room_core::rooms::{
    run_room_cleanup, run_session_end_listener, CleanupConfig, RoomRegistry,
};
use interview_room_core::state::AppState;
use interview_room_core::token::TokenIssuer;
use interview_room_core::ws::ws_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting interview room core...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        app_id = config.zego_app_id,
        "Configuration loaded"
    );

    let tokens = TokenIssuer::new(&config);
    if !tokens.is_configured() {
        tracing::warn!("Provider app id or secret invalid, ticket requests will fail");
    }

    // Provider admin client backs dismiss
    let admin = Arc::new(ProviderAdminClient::new(&config)?);
    let rooms = Arc::new(RoomRegistry::new(admin, config.dismiss_grace()));

    let state = AppState::new(config.clone(), tokens, rooms.clone());

    // Background tasks
    let cancel_token = CancellationToken::new();
    let cleanup = tokio::spawn(run_room_cleanup(
        rooms.clone(),
        state.signals.clone(),
        CleanupConfig::from(&config),
        cancel_token.clone(),
    ));
    let listener_task = tokio::spawn(run_session_end_listener(
        rooms.subscribe_events(),
        state.signals.clone(),
        cancel_token.clone(),
    ));

    // Build router
    let app = Router::new()
        .merge(api::create_router(state.clone()))
        .merge(ws_routes().with_state(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    let _ = tokio::join!(cleanup, listener_task);

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
