// src/main.rs
mod auth;
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod middleware;
mod models;
mod numeric;
mod reports;
mod routes;
mod state;
mod store;
mod validation;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    // Create database pool
    let db_pool = match database::create_pool(&config.database_url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create database pool");
            return;
        }
    };

    if config.run_migrations {
        if let Err(e) = database::run_migrations(&db_pool).await {
            tracing::error!(error = %e, "Failed to run migrations");
            return;
        }
        tracing::info!("Migrations applied");
    }

    let app_state = state::AppState::new(db_pool, &config.jwt_secret);

    // Build application under /FlockLedger base path
    let api = routes::create_router(app_state.clone())
        .route("/", get(|| async { "FlockLedger API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest("/FlockLedger", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Try port..port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = config.port.saturating_add(offset);
            let addr = SocketAddr::from((config.host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
