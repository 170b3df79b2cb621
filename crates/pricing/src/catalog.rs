//! Static pricing catalogs.
//!
//! A catalog is data only. Listing types differ by catalog, never by code path.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Identifier of a plan tier (e.g. `"standard"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    /// Creates a new tier ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TierId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an add-on (e.g. `"nationwide"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddOnId(String);

impl AddOnId {
    /// Creates a new add-on ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AddOnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AddOnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named plan with a monthly base price and the add-ons it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: TierId,
    /// Price per month in dollars. Zero marks the free tier.
    pub base_price_per_month: Decimal,
    pub allowed_add_ons: BTreeSet<AddOnId>,
}

impl PricingTier {
    /// Creates a new tier.
    pub fn new(
        id: impl Into<TierId>,
        base_price_per_month: Decimal,
        allowed_add_ons: impl IntoIterator<Item = AddOnId>,
    ) -> Self {
        Self {
            id: id.into(),
            base_price_per_month,
            allowed_add_ons: allowed_add_ons.into_iter().collect(),
        }
    }

    /// Returns true if this tier costs nothing.
    pub fn is_free(&self) -> bool {
        self.base_price_per_month.is_zero()
    }

    /// Returns true if the add-on may be selected with this tier.
    pub fn allows(&self, add_on: &AddOnId) -> bool {
        self.allowed_add_ons.contains(add_on)
    }
}

/// A step-function discount keyed by the minimum qualifying month count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBand {
    pub min_months: u32,
    /// Discount in percent (`15` means 15%).
    pub discount_pct: Decimal,
}

impl DurationBand {
    /// Creates a new duration band.
    pub fn new(min_months: u32, discount_pct: Decimal) -> Self {
        Self {
            min_months,
            discount_pct,
        }
    }
}

/// How an add-on modifies the price.
///
/// Discounts are applied multiplicatively before any flat fee is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddOnKind {
    /// Percent off the running total (`5` means 5%).
    Discount { pct: Decimal },
    /// Fixed dollar amount added once per listing.
    FlatFee { amount: Decimal },
}

/// An optional pricing modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: AddOnId,
    #[serde(flatten)]
    pub kind: AddOnKind,
}

impl AddOn {
    /// Creates a multiplicative discount add-on.
    pub fn discount(id: impl Into<AddOnId>, pct: Decimal) -> Self {
        Self {
            id: id.into(),
            kind: AddOnKind::Discount { pct },
        }
    }

    /// Creates a flat-fee add-on.
    pub fn flat_fee(id: impl Into<AddOnId>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            kind: AddOnKind::FlatFee { amount },
        }
    }
}

pub const AUTO_RENEW: &str = "auto-renew";
pub const NATIONWIDE: &str = "nationwide";
pub const FEATURED: &str = "featured";

/// Immutable table of tiers, duration bands and add-ons.
///
/// Safe to share between any number of sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogParts")]
pub struct PricingCatalog {
    tiers: Vec<PricingTier>,
    /// Sorted ascending by `min_months`.
    bands: Vec<DurationBand>,
    add_ons: Vec<AddOn>,
    allowed_durations: BTreeSet<u32>,
}

#[derive(Deserialize)]
struct CatalogParts {
    tiers: Vec<PricingTier>,
    bands: Vec<DurationBand>,
    add_ons: Vec<AddOn>,
    allowed_durations: BTreeSet<u32>,
}

impl TryFrom<CatalogParts> for PricingCatalog {
    type Error = CatalogError;

    fn try_from(parts: CatalogParts) -> Result<Self, Self::Error> {
        Self::new(
            parts.tiers,
            parts.bands,
            parts.add_ons,
            parts.allowed_durations,
        )
    }
}

impl PricingCatalog {
    /// Builds a catalog, checking it for internal consistency.
    pub fn new(
        tiers: Vec<PricingTier>,
        mut bands: Vec<DurationBand>,
        add_ons: Vec<AddOn>,
        allowed_durations: impl IntoIterator<Item = u32>,
    ) -> Result<Self, CatalogError> {
        let allowed_durations: BTreeSet<u32> = allowed_durations.into_iter().collect();

        if tiers.is_empty() {
            return Err(CatalogError::InvalidCatalog("no tiers".to_string()));
        }
        if bands.is_empty() {
            return Err(CatalogError::InvalidCatalog("no duration bands".to_string()));
        }
        if allowed_durations.is_empty() || allowed_durations.contains(&0) {
            return Err(CatalogError::InvalidCatalog(
                "allowed durations must be non-empty and positive".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for tier in &tiers {
            if !seen.insert(tier.id.clone()) {
                return Err(CatalogError::InvalidCatalog(format!(
                    "duplicate tier '{}'",
                    tier.id
                )));
            }
            if tier.base_price_per_month.is_sign_negative() {
                return Err(CatalogError::InvalidCatalog(format!(
                    "tier '{}' has a negative price",
                    tier.id
                )));
            }
            if let Some(missing) = tier
                .allowed_add_ons
                .iter()
                .find(|id| !add_ons.iter().any(|a| &a.id == *id))
            {
                return Err(CatalogError::InvalidCatalog(format!(
                    "tier '{}' allows unknown add-on '{}'",
                    tier.id, missing
                )));
            }
        }

        let valid_pct = |pct: &Decimal| !pct.is_sign_negative() && *pct < Decimal::ONE_HUNDRED;
        if bands.iter().any(|b| !valid_pct(&b.discount_pct)) {
            return Err(CatalogError::InvalidCatalog(
                "duration discounts must be within [0, 100)".to_string(),
            ));
        }
        for add_on in &add_ons {
            let ok = match add_on.kind {
                AddOnKind::Discount { pct } => valid_pct(&pct),
                AddOnKind::FlatFee { amount } => !amount.is_sign_negative(),
            };
            if !ok {
                return Err(CatalogError::InvalidCatalog(format!(
                    "add-on '{}' has an invalid amount",
                    add_on.id
                )));
            }
        }

        bands.sort_by_key(|b| b.min_months);
        if bands.windows(2).any(|w| w[0].min_months == w[1].min_months) {
            return Err(CatalogError::InvalidCatalog(
                "duplicate duration band".to_string(),
            ));
        }

        Ok(Self {
            tiers,
            bands,
            add_ons,
            allowed_durations,
        })
    }

    /// Catalog for job postings.
    pub fn job() -> Self {
        Self::standard_catalog([
            ("free", Decimal::ZERO, false),
            ("standard", Decimal::new(4999, 2), true),
            ("premium", Decimal::new(9999, 2), true),
            ("diamond", Decimal::new(14999, 2), false),
        ])
    }

    /// Catalog for salon-for-sale listings.
    pub fn salon() -> Self {
        Self::standard_catalog([
            ("free", Decimal::ZERO, false),
            ("basic", Decimal::new(3999, 2), true),
            ("gold", Decimal::new(7999, 2), true),
            ("diamond", Decimal::new(12999, 2), false),
        ])
    }

    /// Shared shape of the built-in catalogs. The boolean marks tiers that may
    /// buy `featured`; paid tiers without it get it included.
    fn standard_catalog(tiers: [(&str, Decimal, bool); 4]) -> Self {
        let tiers = tiers
            .into_iter()
            .map(|(id, price, featured)| {
                let add_ons: Vec<AddOnId> = if price.is_zero() {
                    Vec::new()
                } else if featured {
                    vec![AUTO_RENEW.into(), NATIONWIDE.into(), FEATURED.into()]
                } else {
                    vec![AUTO_RENEW.into(), NATIONWIDE.into()]
                };
                PricingTier::new(id, price, add_ons)
            })
            .collect();

        Self {
            tiers,
            bands: vec![
                DurationBand::new(1, Decimal::ZERO),
                DurationBand::new(3, Decimal::new(10, 0)),
                DurationBand::new(6, Decimal::new(15, 0)),
                DurationBand::new(12, Decimal::new(20, 0)),
            ],
            add_ons: vec![
                AddOn::discount(AUTO_RENEW, Decimal::new(5, 0)),
                AddOn::flat_fee(NATIONWIDE, Decimal::new(500, 2)),
                AddOn::flat_fee(FEATURED, Decimal::new(1000, 2)),
            ],
            allowed_durations: [1, 3, 6, 12].into_iter().collect(),
        }
    }

    /// Looks up a tier by ID.
    pub fn tier(&self, id: &TierId) -> Option<&PricingTier> {
        self.tiers.iter().find(|t| &t.id == id)
    }

    /// Looks up an add-on by ID.
    pub fn add_on(&self, id: &AddOnId) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| &a.id == id)
    }

    /// Returns all tiers in catalog order.
    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// Returns the duration bands, sorted by `min_months`.
    pub fn bands(&self) -> &[DurationBand] {
        &self.bands
    }

    /// Returns the allowed durations in ascending order.
    pub fn allowed_durations(&self) -> impl Iterator<Item = u32> + '_ {
        self.allowed_durations.iter().copied()
    }

    /// Returns true if `months` is an allowed duration.
    pub fn allows_duration(&self, months: u32) -> bool {
        self.allowed_durations.contains(&months)
    }

    /// Returns the band with the largest `min_months` not above `months`.
    ///
    /// Durations below the smallest band fall back to the smallest band.
    pub fn band_for(&self, months: u32) -> DurationBand {
        let first = self.bands[0];
        self.bands
            .iter()
            .rev()
            .find(|b| b.min_months <= months)
            .copied()
            .unwrap_or(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_selection_is_a_step_function() {
        let catalog = PricingCatalog::job();
        assert_eq!(catalog.band_for(1).discount_pct, Decimal::ZERO);
        assert_eq!(catalog.band_for(2).discount_pct, Decimal::ZERO);
        assert_eq!(catalog.band_for(3).discount_pct, Decimal::new(10, 0));
        assert_eq!(catalog.band_for(5).discount_pct, Decimal::new(10, 0));
        assert_eq!(catalog.band_for(6).discount_pct, Decimal::new(15, 0));
        assert_eq!(catalog.band_for(12).discount_pct, Decimal::new(20, 0));
        assert_eq!(catalog.band_for(24).discount_pct, Decimal::new(20, 0));
    }

    #[test]
    fn test_band_below_smallest_falls_back_to_smallest() {
        let catalog = PricingCatalog::new(
            vec![PricingTier::new("paid", Decimal::TEN, [])],
            vec![
                DurationBand::new(6, Decimal::new(15, 0)),
                DurationBand::new(3, Decimal::new(10, 0)),
            ],
            vec![],
            [1, 3, 6],
        )
        .unwrap();
        assert_eq!(catalog.band_for(1).min_months, 3);
        assert_eq!(catalog.bands()[0].min_months, 3);
    }

    #[test]
    fn test_builtin_diamond_excludes_featured() {
        let job = PricingCatalog::job();
        let diamond = job.tier(&"diamond".into()).unwrap();
        assert!(!diamond.allows(&FEATURED.into()));
        assert!(diamond.allows(&NATIONWIDE.into()));

        let salon = PricingCatalog::salon();
        assert!(salon.tier(&"gold".into()).unwrap().allows(&FEATURED.into()));
        assert!(salon.tier(&"free".into()).unwrap().is_free());
    }

    #[test]
    fn test_rejects_duplicate_tiers() {
        let result = PricingCatalog::new(
            vec![
                PricingTier::new("a", Decimal::ONE, []),
                PricingTier::new("a", Decimal::TWO, []),
            ],
            vec![DurationBand::new(1, Decimal::ZERO)],
            vec![],
            [1],
        );
        assert!(matches!(result, Err(CatalogError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_tier_with_unknown_add_on() {
        let result = PricingCatalog::new(
            vec![PricingTier::new("a", Decimal::ONE, [AddOnId::new("ghost")])],
            vec![DurationBand::new(1, Decimal::ZERO)],
            vec![],
            [1],
        );
        assert!(matches!(result, Err(CatalogError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_full_discount() {
        let result = PricingCatalog::new(
            vec![PricingTier::new("a", Decimal::ONE, [])],
            vec![DurationBand::new(1, Decimal::ONE_HUNDRED)],
            vec![],
            [1],
        );
        assert!(matches!(result, Err(CatalogError::InvalidCatalog(_))));
    }

    #[test]
    fn test_catalog_deserialization_is_validated() {
        let json = serde_json::json!({
            "tiers": [],
            "bands": [{ "min_months": 1, "discount_pct": "0" }],
            "add_ons": [],
            "allowed_durations": [1]
        });
        let result: Result<PricingCatalog, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_serialization_roundtrip() {
        let catalog = PricingCatalog::salon();
        let json = serde_json::to_string(&catalog).unwrap();
        let restored: PricingCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(catalog, restored);
    }
}
