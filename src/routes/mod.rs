pub mod health;
pub mod pricing;
pub mod quote;

use axum::{routing::get, routing::post, routing::put, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/quote", post(quote::calculate_quote))
        .route("/pricing", get(pricing::get_pricing))
        // Admin routes
        .route("/admin/pricing", put(pricing::update_pricing))
}
