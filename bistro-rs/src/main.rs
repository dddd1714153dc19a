//! # bistro-rs
//!
//! Bistro restaurant management backend in Rust.
//!
//! Serves a REST API over a MongoDB document store for user accounts, menu
//! items, reviews, shopping carts, and payment statistics, with JWT bearer
//! guards on the admin surface and Stripe payment-intent creation.
//!
//! ## Architecture
//!
//! - **Store**: one long-lived MongoDB client exposing five typed collections;
//!   a unique index on `user.email` backs idempotent sign-in creates
//! - **Tokens**: HS256 JWTs with a 1-hour validity window, issued by `/jwt`
//! - **Payments**: card payment intents via the Stripe HTTP API; only the
//!   client secret leaves the server
//! - **HTTP**: Axum router with rate limiting, request IDs, permissive CORS,
//!   and graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod config;
mod http;
mod models;
mod payment;
mod store;
mod token;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Cli};
use crate::http::{router, AppState};
use crate::payment::PaymentClient;
use crate::store::Store;
use crate::token::TokenService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        database = %config.database,
        payment_api = %config.payment_api_base,
        "configuration loaded"
    );

    let store = Store::connect(&config.mongodb_uri, &config.database)
        .await
        .context("failed to initialize document store client")?;
    store
        .ensure_indexes()
        .await
        .context("failed to create store indexes")?;
    info!(database = %config.database, "document store ready");

    let state = AppState {
        store,
        tokens: Arc::new(TokenService::new(&config.token_secret)),
        payments: PaymentClient::new(
            config.payment_secret_key.clone(),
            config.payment_api_base.clone(),
        ),
    };

    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "bistro-rs listening");

    serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = shutdown.await;
        info!("shutting down gracefully");
    })
    .await
    .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
