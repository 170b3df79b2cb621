//! Quote engine.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::catalog::{AddOn, AddOnKind, PricingCatalog};
use crate::error::CatalogError;
use crate::money::Money;
use crate::quote::PriceQuote;
use crate::selection::PricingSelection;

/// Turns a [`PricingSelection`] into a [`PriceQuote`] using one catalog.
///
/// Pure and deterministic. Cloning is cheap; the catalog is shared.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<PricingCatalog>,
}

impl PricingEngine {
    /// Creates an engine over the given catalog.
    pub fn new(catalog: PricingCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Creates an engine sharing an existing catalog.
    pub fn shared(catalog: Arc<PricingCatalog>) -> Self {
        Self { catalog }
    }

    /// Returns the catalog this engine prices against.
    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    /// Prices a selection.
    ///
    /// Free tiers short-circuit to a zero quote regardless of duration or
    /// add-ons. For paid tiers the duration and every add-on are checked
    /// against the catalog first; nothing is clamped or dropped silently.
    pub fn quote(&self, selection: &PricingSelection) -> Result<PriceQuote, CatalogError> {
        let tier = self
            .catalog
            .tier(&selection.tier)
            .ok_or_else(|| CatalogError::UnknownTier(selection.tier.clone()))?;

        if tier.is_free() {
            return Ok(PriceQuote::free());
        }

        let months = selection.duration_months;
        if !self.catalog.allows_duration(months) {
            return Err(CatalogError::UnsupportedDuration {
                months,
                allowed: self.catalog.allowed_durations().collect(),
            });
        }

        let add_ons = selection
            .add_ons
            .iter()
            .map(|id| {
                let add_on = self
                    .catalog
                    .add_on(id)
                    .ok_or_else(|| CatalogError::UnknownAddOn(id.clone()))?;
                if !tier.allows(id) {
                    return Err(CatalogError::AddOnNotAllowed {
                        tier: tier.id.clone(),
                        add_on: id.clone(),
                    });
                }
                Ok(add_on)
            })
            .collect::<Result<Vec<&AddOn>, CatalogError>>()?;

        // 1. Base
        let base_price = tier
            .base_price_per_month
            .checked_mul(Decimal::from(months))
            .ok_or(CatalogError::AmountOutOfRange)?;

        // 2. Duration band
        let duration_discount_pct = self.catalog.band_for(months).discount_pct;
        let after_duration = base_price
            .checked_mul(remaining_fraction(duration_discount_pct))
            .ok_or(CatalogError::AmountOutOfRange)?;

        // 3. Multiplicative discounts, always before flat fees
        let discount_factor = add_ons
            .iter()
            .filter_map(|a| match a.kind {
                AddOnKind::Discount { pct } => Some(remaining_fraction(pct)),
                AddOnKind::FlatFee { .. } => None,
            })
            .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(f))
            .ok_or(CatalogError::AmountOutOfRange)?;
        let after_add_on_discounts = after_duration
            .checked_mul(discount_factor)
            .ok_or(CatalogError::AmountOutOfRange)?;

        // 4. Flat fees
        let flat_fees_total = add_ons
            .iter()
            .filter_map(|a| match a.kind {
                AddOnKind::FlatFee { amount } => Some(amount),
                AddOnKind::Discount { .. } => None,
            })
            .try_fold(Decimal::ZERO, |acc, fee| acc.checked_add(fee))
            .ok_or(CatalogError::AmountOutOfRange)?;

        // 5. Round
        let total = after_add_on_discounts
            .checked_add(flat_fees_total)
            .and_then(Money::from_decimal)
            .ok_or(CatalogError::AmountOutOfRange)?;

        tracing::debug!(
            tier = %tier.id,
            months,
            %total,
            "quote computed"
        );

        Ok(PriceQuote {
            base_price,
            duration_discount_pct,
            add_on_discount_pct: (Decimal::ONE - discount_factor) * Decimal::ONE_HUNDRED,
            flat_fees_total,
            total,
        })
    }
}

/// `1 - pct / 100`
fn remaining_fraction(pct: Decimal) -> Decimal {
    Decimal::ONE - pct / Decimal::ONE_HUNDRED
}
