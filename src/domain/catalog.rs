//! Service catalog domain types
//!
//! Categories, platforms, and the admin-configured price band table.
//! The table is always read and written as one whole document; nothing
//! in here mutates a single band in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Top-level grouping of service offerings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    #[default]
    Bots,
    Sites,
    Custom,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bots => "bots",
            Self::Sites => "sites",
            Self::Custom => "custom",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s {
            "bots" => Some(Self::Bots),
            "sites" => Some(Self::Sites),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve a platform id to its category.
///
/// The mapping is static and total: ids the frontend may send but we do
/// not recognize resolve to `Bots`, never to an error.
pub fn platform_category(platform_id: &str) -> ServiceCategory {
    match platform_id {
        "discord" | "telegram" | "whatsapp" => ServiceCategory::Bots,
        "landing" | "business" | "shop" => ServiceCategory::Sites,
        "automation" | "integration" | "parsing" => ServiceCategory::Custom,
        _ => ServiceCategory::Bots,
    }
}

/// Admin-configured `[min, max]` price range for one platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// Used when a platform id has no band in the current table. Deliberately
/// conservative and hard-coded; never derived from the table contents.
pub const FALLBACK_BAND: PriceBand = PriceBand {
    min: 25.0,
    max: 100.0,
};

/// The whole price band document: category -> platform -> band.
///
/// Serializes to the same nested-object shape the admin screen edits,
/// e.g. `{"bots": {"discord": {"min": 25, "max": 70}}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct PricingTable(pub BTreeMap<String, BTreeMap<String, PriceBand>>);

#[derive(Debug, Error)]
pub enum TableError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("empty platform id under category '{0}'")]
    EmptyPlatformId(String),

    #[error("invalid band for {category}/{platform}: min={min}, max={max}")]
    InvalidBand {
        category: String,
        platform: String,
        min: f64,
        max: f64,
    },
}

impl PricingTable {
    /// Look up the band for a platform, following the static
    /// platform -> category mapping. `None` means the admin table has no
    /// entry; callers decide the fallback.
    pub fn band_for(&self, platform_id: &str) -> Option<PriceBand> {
        let category = platform_category(platform_id);
        self.0
            .get(category.as_str())
            .and_then(|platforms| platforms.get(platform_id))
            .copied()
    }

    /// Validate a full replacement table before it is persisted.
    pub fn validate(&self) -> Result<(), TableError> {
        for (category, platforms) in &self.0 {
            if ServiceCategory::from_slug(category).is_none() {
                return Err(TableError::UnknownCategory(category.clone()));
            }
            for (platform, band) in platforms {
                if platform.trim().is_empty() {
                    return Err(TableError::EmptyPlatformId(category.clone()));
                }
                if !band.is_valid() {
                    return Err(TableError::InvalidBand {
                        category: category.clone(),
                        platform: platform.clone(),
                        min: band.min,
                        max: band.max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Seed table written to the store on first boot when no pricing
    /// document exists yet.
    pub fn defaults() -> Self {
        fn bands(entries: &[(&str, f64, f64)]) -> BTreeMap<String, PriceBand> {
            entries
                .iter()
                .map(|(id, min, max)| (id.to_string(), PriceBand::new(*min, *max)))
                .collect()
        }

        let mut table = BTreeMap::new();
        table.insert(
            ServiceCategory::Bots.as_str().to_string(),
            bands(&[
                ("discord", 25.0, 70.0),
                ("telegram", 30.0, 80.0),
                ("whatsapp", 35.0, 90.0),
            ]),
        );
        table.insert(
            ServiceCategory::Sites.as_str().to_string(),
            bands(&[
                ("landing", 50.0, 150.0),
                ("business", 100.0, 300.0),
                ("shop", 150.0, 400.0),
            ]),
        );
        table.insert(
            ServiceCategory::Custom.as_str().to_string(),
            bands(&[
                ("automation", 40.0, 120.0),
                ("integration", 50.0, 150.0),
                ("parsing", 30.0, 100.0),
            ]),
        );
        Self(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let table = PricingTable::defaults();
        assert!(table.validate().is_ok());
    }

    #[test]
    fn defaults_cover_every_mapped_platform() {
        let table = PricingTable::defaults();
        for id in [
            "discord",
            "telegram",
            "whatsapp",
            "landing",
            "business",
            "shop",
            "automation",
            "integration",
            "parsing",
        ] {
            assert!(table.band_for(id).is_some(), "missing band for {id}");
        }
    }

    #[test]
    fn unknown_platform_maps_to_bots() {
        assert_eq!(platform_category("tiktok"), ServiceCategory::Bots);
        assert_eq!(platform_category(""), ServiceCategory::Bots);
    }

    #[test]
    fn band_lookup_misses_for_unlisted_platform() {
        let table = PricingTable::defaults();
        assert!(table.band_for("tiktok").is_none());
    }

    #[test]
    fn validate_rejects_inverted_band() {
        let mut table = PricingTable::defaults();
        table
            .0
            .get_mut("bots")
            .unwrap()
            .insert("discord".to_string(), PriceBand::new(70.0, 25.0));
        assert!(matches!(
            table.validate(),
            Err(TableError::InvalidBand { .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite() {
        let mut table = PricingTable::defaults();
        table
            .0
            .get_mut("sites")
            .unwrap()
            .insert("landing".to_string(), PriceBand::new(-1.0, 10.0));
        assert!(table.validate().is_err());

        let mut table = PricingTable::defaults();
        table
            .0
            .get_mut("sites")
            .unwrap()
            .insert("landing".to_string(), PriceBand::new(1.0, f64::NAN));
        assert!(table.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_category() {
        let mut table = PricingTable::defaults();
        table
            .0
            .insert("consulting".to_string(), Default::default());
        assert!(matches!(
            table.validate(),
            Err(TableError::UnknownCategory(c)) if c == "consulting"
        ));
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = PricingTable::defaults();
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.get("bots").and_then(|b| b.get("discord")).is_some());
        let back: PricingTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
