use crate::integrations::Services;
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod certificate;
pub mod error;
pub mod integrations;
pub mod model;
pub mod quiz;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "tina";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;
    let db = DbConnection::connect(config.app().database_uri())?;

    build_server_with_services(db, Services::from_config(config)).await
}

/// Builds the app over an existing database with network-backed integrations.
pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(true).await;
    build_server_with_services(db, Services::from_config(config)).await
}

/// Runs pending migrations, then wires `services` into the router.
pub async fn build_server_with_services(
    db: DbConnection,
    services: Services,
) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(cfg!(debug_assertions)).await;

    let mm = ModelManager::new(db);
    tracing::debug!("applying migrations...");
    mm.migrate().await?;

    let state = AppState::new(mm, services, config);
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let bindto = state.config().host().bindto();
    let listener = TcpListener::bind(bindto).await?;

    tracing::info!("axum is starting at: {}", bindto);
    let axum_handle = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    axum_handle.await?;
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
