//! The pricing-relevant subset of a draft.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{AddOnId, TierId};

/// A plan tier, a duration and a set of add-ons chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSelection {
    pub tier: TierId,
    pub duration_months: u32,
    #[serde(default)]
    pub add_ons: BTreeSet<AddOnId>,
}

impl PricingSelection {
    /// Creates a selection without add-ons.
    pub fn new(tier: impl Into<TierId>, duration_months: u32) -> Self {
        Self {
            tier: tier.into(),
            duration_months,
            add_ons: BTreeSet::new(),
        }
    }

    /// Adds an add-on to the selection.
    pub fn with_add_on(mut self, add_on: impl Into<AddOnId>) -> Self {
        self.add_ons.insert(add_on.into());
        self
    }

    /// Returns true if the add-on is selected.
    pub fn has_add_on(&self, add_on: &AddOnId) -> bool {
        self.add_ons.contains(add_on)
    }
}
