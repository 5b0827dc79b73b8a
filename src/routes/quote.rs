//! Quote calculation endpoint

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::domain::quote::{self, QuoteRequest};

/// POST /quote
///
/// Public. Computes a price and delivery estimate from the quote wizard
/// input against the current price band snapshot. Purely in-memory; never
/// waits on the database or Redis.
pub async fn calculate_quote(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> impl IntoResponse {
    let table = state.pricing.snapshot();
    let result = quote::calculate(&table, &request);

    tracing::debug!(
        platform = %request.platform_id,
        final_price = result.final_price,
        estimated_days = result.estimated_days,
        "Quote calculated"
    );

    Json(DataResponse::new(result))
}
