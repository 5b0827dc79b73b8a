//! Quote domain types and the pricing calculator
//!
//! The calculator is a pure function over the current price band table and
//! a quote request. It never performs I/O and never fails: requests with no
//! platform selected produce the documented all-zero result, and unknown
//! platform ids fall back to a conservative hard-coded band.

use serde::{Deserialize, Serialize};

use super::catalog::{PriceBand, PricingTable, FALLBACK_BAND};
use super::complexity;

/// Flat fee added to the price per selected feature. Fixed by product,
/// not admin-configurable.
pub const FLAT_FEATURE_FEE: f64 = 5.0;

/// Requester-chosen project difficulty classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl ComplexityTier {
    /// Multiplier placing the base price within the band. Independent from
    /// `days_multiplier`; the two tables differ in source and must not be
    /// merged.
    pub fn price_multiplier(&self) -> f64 {
        match self {
            Self::Basic => 0.8,
            Self::Intermediate => 1.0,
            Self::Advanced => 1.5,
        }
    }

    /// Multiplier applied to the delivery-time estimate.
    pub fn days_multiplier(&self) -> f64 {
        match self {
            Self::Basic => 1.0,
            Self::Intermediate => 1.5,
            Self::Advanced => 2.0,
        }
    }
}

/// Requester-chosen delivery speed preference. Affects the delivery
/// estimate only; urgency carries no price surcharge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimelineUrgency {
    Urgent,
    #[default]
    Normal,
    Flexible,
}

impl TimelineUrgency {
    /// Baseline turnaround in days before complexity scaling.
    pub fn base_days(&self) -> f64 {
        match self {
            Self::Urgent => 2.0,
            Self::Normal => 7.0,
            Self::Flexible => 14.0,
        }
    }

    /// Display-only factor reported in the quote breakdown. The delivery
    /// estimate itself is driven by `base_days`.
    pub fn time_multiplier(&self) -> f64 {
        match self {
            Self::Urgent => 0.3,
            Self::Normal => 1.0,
            Self::Flexible => 2.0,
        }
    }
}

/// Quote wizard input, shaped by the frontend contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub platform_id: String,
    #[serde(default)]
    pub complexity: ComplexityTier,
    #[serde(default)]
    pub timeline: TimelineUrgency,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Full price breakdown returned to the frontend. Transient; recomputed
/// on every request and never cached.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub base_price: f64,
    pub complexity_multiplier: f64,
    pub timeline_multiplier: f64,
    pub features_price: f64,
    pub text_complexity_multiplier: f64,
    pub final_price: f64,
    pub estimated_days: u32,
}

impl QuoteResult {
    /// The "nothing selected yet" state. The frontend disables the price
    /// display when `final_price` is zero.
    pub fn empty() -> Self {
        Self {
            base_price: 0.0,
            complexity_multiplier: 0.0,
            timeline_multiplier: 0.0,
            features_price: 0.0,
            text_complexity_multiplier: 0.0,
            final_price: 0.0,
            estimated_days: 0,
        }
    }
}

/// Interpolate the base price within `[min, max]`.
///
/// Tier multipliers up to 1.0 map linearly onto the lower half of the
/// band, multipliers above 1.0 onto the upper half, so the result stays
/// inside the band for every tier.
fn base_price(band: PriceBand, multiplier: f64) -> f64 {
    let span = band.max - band.min;
    let half = span * 0.5;
    if multiplier <= 1.0 {
        band.min + half * ((multiplier - 0.8) / 0.2)
    } else {
        band.min + half + half * ((multiplier - 1.0) / 0.5)
    }
}

/// Compute a quote from the current band table snapshot.
pub fn calculate(table: &PricingTable, request: &QuoteRequest) -> QuoteResult {
    let platform_id = request.platform_id.trim();
    if platform_id.is_empty() {
        return QuoteResult::empty();
    }

    let band = match table.band_for(platform_id) {
        Some(band) if band.is_valid() => band,
        Some(band) => {
            // The store validates on load and save, so this only fires if a
            // broken table was injected some other way. Quote off the
            // fallback rather than clamping into an inverted range.
            tracing::warn!(
                platform = platform_id,
                min = band.min,
                max = band.max,
                "invalid price band in table, using fallback"
            );
            FALLBACK_BAND
        }
        None => {
            tracing::debug!(
                platform = platform_id,
                "no price band configured, using fallback"
            );
            FALLBACK_BAND
        }
    };

    let complexity_multiplier = request.complexity.price_multiplier();
    let base = base_price(band, complexity_multiplier);
    let text_multiplier = complexity::score(&request.description);
    let features_price = request.features.len() as f64 * FLAT_FEATURE_FEE;

    let unclamped = (base * text_multiplier + features_price).round();
    // The band is the contract with the admin: no combination of inputs may
    // quote outside it.
    let final_price = unclamped.clamp(band.min, band.max);
    if final_price != unclamped {
        tracing::warn!(
            platform = platform_id,
            unclamped,
            min = band.min,
            max = band.max,
            "quote estimate fell outside the price band, clamped"
        );
    }

    let text_factor = if text_multiplier > 1.5 { 1.3 } else { 1.0 };
    let estimated_days = (request.timeline.base_days()
        * request.complexity.days_multiplier()
        * text_factor)
        .ceil()
        .max(1.0) as u32;

    QuoteResult {
        base_price: base,
        complexity_multiplier,
        timeline_multiplier: request.timeline.time_multiplier(),
        features_price,
        text_complexity_multiplier: text_multiplier,
        final_price,
        estimated_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::PriceBand;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn discord_table(min: f64, max: f64) -> PricingTable {
        let mut platforms = BTreeMap::new();
        platforms.insert("discord".to_string(), PriceBand::new(min, max));
        let mut table = BTreeMap::new();
        table.insert("bots".to_string(), platforms);
        PricingTable(table)
    }

    fn request(platform: &str) -> QuoteRequest {
        QuoteRequest {
            platform_id: platform.to_string(),
            complexity: ComplexityTier::Basic,
            timeline: TimelineUrgency::Normal,
            features: vec![],
            description: String::new(),
        }
    }

    #[test]
    fn basic_quote_sits_at_band_minimum() {
        let table = discord_table(25.0, 70.0);
        let result = calculate(&table, &request("discord"));
        assert_eq!(result.base_price, 25.0);
        assert_eq!(result.text_complexity_multiplier, 1.0);
        assert_eq!(result.features_price, 0.0);
        assert_eq!(result.final_price, 25.0);
        assert_eq!(result.estimated_days, 7);
    }

    #[test]
    fn advanced_quote_reaches_band_maximum() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        req.complexity = ComplexityTier::Advanced;
        let result = calculate(&table, &req);
        assert_eq!(result.base_price, 70.0);
        assert_eq!(result.final_price, 70.0);
        assert_eq!(result.estimated_days, 14);
    }

    #[test]
    fn features_add_flat_fee() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        req.features = vec!["a".into(), "b".into(), "c".into()];
        let result = calculate(&table, &req);
        assert_eq!(result.features_price, 15.0);
        assert_eq!(result.final_price, 40.0);
    }

    #[test]
    fn feature_pileup_clamps_to_band_max() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        req.features = (0..20).map(|i| format!("f{i}")).collect();
        let result = calculate(&table, &req);
        // 25 + 20*5 = 125 before the clamp
        assert_eq!(result.features_price, 100.0);
        assert_eq!(result.final_price, 70.0);
    }

    #[test]
    fn tier_ordering_holds() {
        let table = discord_table(25.0, 70.0);
        let mut prices = vec![];
        for tier in [
            ComplexityTier::Basic,
            ComplexityTier::Intermediate,
            ComplexityTier::Advanced,
        ] {
            let mut req = request("discord");
            req.complexity = tier;
            prices.push(calculate(&table, &req).base_price);
        }
        assert!(prices[0] <= prices[1] && prices[1] <= prices[2]);
        // Intermediate lands on the band midpoint
        assert_eq!(prices[1], 47.5);
    }

    #[test]
    fn missing_platform_yields_zero_result() {
        let table = discord_table(25.0, 70.0);
        assert_eq!(calculate(&table, &request("")), QuoteResult::empty());
        assert_eq!(calculate(&table, &request("   ")), QuoteResult::empty());
    }

    #[test]
    fn inverted_band_falls_back_instead_of_panicking() {
        let table = discord_table(70.0, 25.0);
        let result = calculate(&table, &request("discord"));
        // Quoted off the fallback band, inside its range
        assert_eq!(result.base_price, FALLBACK_BAND.min);
        assert!(result.final_price >= FALLBACK_BAND.min);
        assert!(result.final_price <= FALLBACK_BAND.max);
    }

    #[test]
    fn unknown_platform_uses_fallback_band() {
        let table = discord_table(25.0, 70.0);
        let result = calculate(&table, &request("tiktok"));
        assert_eq!(result.base_price, 25.0);
        assert_eq!(result.final_price, 25.0);
    }

    #[test]
    fn urgency_changes_days_not_price() {
        let table = discord_table(25.0, 70.0);
        let mut urgent = request("discord");
        urgent.timeline = TimelineUrgency::Urgent;
        let mut flexible = request("discord");
        flexible.timeline = TimelineUrgency::Flexible;

        let u = calculate(&table, &urgent);
        let f = calculate(&table, &flexible);
        assert_eq!(u.final_price, f.final_price);
        assert_eq!(u.estimated_days, 2);
        assert_eq!(f.estimated_days, 14);
    }

    #[test]
    fn dense_description_extends_delivery() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        // Enough words and keywords to push the multiplier past 1.5
        req.description = format!(
            "api database dashboard integration webhook {}",
            vec!["x"; 110].join(" ")
        );
        let result = calculate(&table, &req);
        assert!(result.text_complexity_multiplier > 1.5);
        // ceil(7 * 1.0 * 1.3) = 10
        assert_eq!(result.estimated_days, 10);
    }

    #[test]
    fn moderate_description_raises_price_within_band() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        // 25 words, under 200 chars, two keywords: 1.0 + 0.1 + 0.16 = 1.26
        req.description = format!("api dashboard {}", vec!["a"; 23].join(" "));
        let result = calculate(&table, &req);
        assert!((result.text_complexity_multiplier - 1.26).abs() < 1e-9);
        // round(25 * 1.26) = 32, inside the band
        assert_eq!(result.final_price, 32.0);
    }

    #[test]
    fn calculation_is_deterministic() {
        let table = discord_table(25.0, 70.0);
        let mut req = request("discord");
        req.complexity = ComplexityTier::Advanced;
        req.features = vec!["auth".into(), "payments".into()];
        req.description = "bot with api integration and an admin dashboard".into();
        assert_eq!(calculate(&table, &req), calculate(&table, &req));
    }

    #[test]
    fn estimated_days_never_below_one() {
        let table = discord_table(0.0, 0.0);
        let mut req = request("discord");
        req.timeline = TimelineUrgency::Urgent;
        let result = calculate(&table, &req);
        assert!(result.estimated_days >= 1);
    }

    #[test]
    fn request_deserializes_from_frontend_contract() {
        let req: QuoteRequest = serde_json::from_str(
            r#"{
                "platformId": "discord",
                "complexity": "advanced",
                "timeline": "urgent",
                "features": ["moderation", "logging"],
                "description": "mod bot"
            }"#,
        )
        .unwrap();
        assert_eq!(req.complexity, ComplexityTier::Advanced);
        assert_eq!(req.timeline, TimelineUrgency::Urgent);
        assert_eq!(req.features.len(), 2);
    }

    #[test]
    fn absent_fields_take_safe_defaults() {
        let req: QuoteRequest = serde_json::from_str(r#"{"platformId": "discord"}"#).unwrap();
        assert_eq!(req.complexity, ComplexityTier::Intermediate);
        assert_eq!(req.timeline, TimelineUrgency::Normal);
        assert!(req.features.is_empty());
        assert!(req.description.is_empty());
    }

    fn tier_strategy() -> impl Strategy<Value = ComplexityTier> {
        prop_oneof![
            Just(ComplexityTier::Basic),
            Just(ComplexityTier::Intermediate),
            Just(ComplexityTier::Advanced),
        ]
    }

    fn timeline_strategy() -> impl Strategy<Value = TimelineUrgency> {
        prop_oneof![
            Just(TimelineUrgency::Urgent),
            Just(TimelineUrgency::Normal),
            Just(TimelineUrgency::Flexible),
        ]
    }

    proptest! {
        #[test]
        fn final_price_stays_inside_band(
            min in 0.0f64..1000.0,
            span in 0.0f64..1000.0,
            tier in tier_strategy(),
            timeline in timeline_strategy(),
            feature_count in 0usize..40,
            description in "[ -~]{0,400}",
        ) {
            let max = min + span;
            let table = discord_table(min, max);
            let req = QuoteRequest {
                platform_id: "discord".to_string(),
                complexity: tier,
                timeline,
                features: (0..feature_count).map(|i| format!("f{i}")).collect(),
                description,
            };
            let result = calculate(&table, &req);
            prop_assert!(result.final_price >= min && result.final_price <= max);
            prop_assert!(result.base_price >= min && result.base_price <= max);
            prop_assert!(result.estimated_days >= 1);
        }

        #[test]
        fn more_features_never_cheapen_the_quote(
            feature_count in 0usize..30,
            tier in tier_strategy(),
        ) {
            let table = discord_table(25.0, 70.0);
            let mut req = request("discord");
            req.complexity = tier;
            req.features = (0..feature_count).map(|i| format!("f{i}")).collect();
            let fewer = calculate(&table, &req);
            req.features.push("one more".to_string());
            let more = calculate(&table, &req);
            prop_assert!(more.final_price >= fewer.final_price);
        }
    }
}
