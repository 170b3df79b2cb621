//! Step descriptors and the per-listing-type step sequences.

use pricing::PricingCatalog;
use serde::{Deserialize, Serialize};

use crate::photo::PhotoPolicy;

/// Identifier of a wizard step (e.g. `"job-details"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Immutable step descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub index: usize,
}

pub const JOB_DETAILS: &str = "job-details";
pub const REQUIREMENTS: &str = "requirements";
pub const COMPENSATION: &str = "compensation";
pub const SALON_DETAILS: &str = "salon-details";
pub const FINANCIALS: &str = "financials";
pub const AMENITIES: &str = "amenities";
pub const CONTACT: &str = "contact";
pub const PHOTOS: &str = "photos";
pub const PRICING: &str = "pricing";
pub const PAYMENT: &str = "payment";

const JOB_STEPS: [&str; 7] = [
    JOB_DETAILS,
    REQUIREMENTS,
    COMPENSATION,
    CONTACT,
    PHOTOS,
    PRICING,
    PAYMENT,
];

const SALON_STEPS: [&str; 7] = [
    SALON_DETAILS,
    FINANCIALS,
    AMENITIES,
    PHOTOS,
    CONTACT,
    PRICING,
    PAYMENT,
];

/// What is being listed. Fixes the step sequence, catalog and photo limits
/// once, at wizard construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// A job opening at a salon.
    Job,
    /// A salon for sale.
    Salon,
}

impl ListingKind {
    /// Returns the ordered step sequence for this listing type.
    pub fn steps(&self) -> Vec<Step> {
        let ids: &[&str] = match self {
            ListingKind::Job => &JOB_STEPS,
            ListingKind::Salon => &SALON_STEPS,
        };
        ids.iter()
            .enumerate()
            .map(|(index, id)| Step {
                id: StepId::from(*id),
                index,
            })
            .collect()
    }

    /// Returns the pricing catalog for this listing type.
    pub fn catalog(&self) -> PricingCatalog {
        match self {
            ListingKind::Job => PricingCatalog::job(),
            ListingKind::Salon => PricingCatalog::salon(),
        }
    }

    /// Returns the default photo limits for this listing type.
    pub fn photo_policy(&self) -> PhotoPolicy {
        match self {
            ListingKind::Job => PhotoPolicy::job(),
            ListingKind::Salon => PhotoPolicy::salon(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Job => "job",
            ListingKind::Salon => "salon",
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
