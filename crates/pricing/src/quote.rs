//! Price quotes and the finalized selection sent to the payment gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::selection::PricingSelection;

/// The fully resolved price for one selection.
///
/// Derived from its inputs on demand; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// `price per month * months`, before any discount.
    pub base_price: Decimal,
    /// Percent taken off by the duration band.
    pub duration_discount_pct: Decimal,
    /// Combined percent taken off by multiplicative add-ons.
    pub add_on_discount_pct: Decimal,
    /// Sum of flat add-on fees.
    pub flat_fees_total: Decimal,
    /// Amount due, rounded half-up to the cent.
    pub total: Money,
}

impl PriceQuote {
    /// Quote for a free tier: every component is zero.
    pub fn free() -> Self {
        Self {
            base_price: Decimal::ZERO,
            duration_discount_pct: Decimal::ZERO,
            add_on_discount_pct: Decimal::ZERO,
            flat_fees_total: Decimal::ZERO,
            total: Money::zero(),
        }
    }

    /// Returns true if nothing is owed.
    pub fn is_free(&self) -> bool {
        self.total.is_zero()
    }

    /// Amount due in cents.
    pub fn amount_cents(&self) -> i64 {
        self.total.cents()
    }
}

/// Wire shape of a priced selection, as expected by the payment gateway.
///
/// `amountCents` always equals `round(total * 100)` of the quote it was
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSelection {
    pub tier: String,
    pub duration_months: u32,
    pub add_ons: Vec<String>,
    pub amount_cents: i64,
}

impl FinalizedSelection {
    /// Pairs a selection with the quote computed for it.
    pub fn new(selection: &PricingSelection, quote: &PriceQuote) -> Self {
        Self {
            tier: selection.tier.as_str().to_string(),
            duration_months: selection.duration_months,
            add_ons: selection
                .add_ons
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            amount_cents: quote.amount_cents(),
        }
    }
}
