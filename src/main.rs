mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use services::PricingStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting BotCraft backend"
    );

    // Create database pool
    let pool = db::create_pool(&settings).await?;

    // Connect the price band store and load (or seed) the pricing document
    let pricing = PricingStore::connect(pool.clone(), &settings.redis_url).await?;
    if let Err(e) = pricing.bootstrap().await {
        tracing::warn!(error = %e, "Pricing bootstrap failed - serving default price bands");
    }

    // Keep the snapshot fresh across admin edits from any instance
    let listener_task = tokio::spawn(pricing.clone().run_listener());

    // Create JWKS cache for JWT verification
    let http_client = reqwest::Client::new();
    let jwks_cache = auth::JwksCache::new(
        http_client,
        settings.jwt_jwks_url.clone(),
        settings.jwt_issuer.clone(),
        settings.jwt_audience.clone(),
        settings.jwks_cache_ttl_seconds,
    );

    // Optionally warm the JWKS cache
    if let Err(e) = jwks_cache.warm().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), jwks_cache, pricing);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down the pricing change subscription
    listener_task.abort();
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
