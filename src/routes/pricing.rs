//! Price band table endpoints
//!
//! The public read feeds the marketing site's "from $X" price labels; the
//! admin write replaces the whole table at once. There is deliberately no
//! endpoint to patch a single platform's band: admin clients read, merge,
//! and write back the full document.

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::catalog::PricingTable;
use crate::error::ApiError;

/// GET /pricing
///
/// Current price band table snapshot. Public.
pub async fn get_pricing(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let table = state.pricing.snapshot();
    Json(DataResponse::new(table.as_ref().clone()))
}

/// PUT /admin/pricing
///
/// Replace the price band table wholesale. Admin only. The new table is
/// validated, persisted, applied locally, and broadcast to every other
/// running instance.
pub async fn update_pricing(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(table): Json<PricingTable>,
) -> Result<impl IntoResponse, ApiError> {
    table
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.pricing.save(table).await?;

    tracing::info!(admin = %admin.user_id(), "Pricing table replaced");

    let table = state.pricing.snapshot();
    Ok(Json(DataResponse::new(table.as_ref().clone())))
}
