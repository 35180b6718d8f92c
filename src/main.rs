mod app_error;
mod cli;
mod config;
mod controllers;
mod model;
mod services;

use crate::cli::Cli;
use crate::config::config::Config;
use crate::controllers::predict::post_predict;
use crate::controllers::reload::post_reload;
use crate::controllers::status::get_status;
use crate::services::model_manager::{ModelManager, ModelManagerState};
use axum::routing::get;
use axum::{Router, routing::post};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    enable_logging(cli.verbose);
    let Some(config) = Config::from_path(cli.config_path) else {
        return Ok(ExitCode::FAILURE);
    };
    let state: ModelManagerState = Arc::new(ModelManager::new(config));

    // Startup load runs in the background; the service comes up unready
    // and reports so until the first successful load.
    let init_state = state.clone();
    tokio::spawn(async move { init_state.initialize().await });

    let api_router = Router::new()
        .route("/predict", post(post_predict))
        .route("/reload", post(post_reload))
        .route("/status", get(get_status))
        .with_state(state);
    let app = Router::new().nest("/v1", api_router).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any),
    );

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(ExitCode::SUCCESS)
}

fn enable_logging(verbose: u8) {
    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
