//! Pricing error types.

use thiserror::Error;

use crate::catalog::{AddOnId, TierId};

/// Errors raised when a selection cannot be priced against a catalog.
///
/// These are configuration or programming errors: the engine fails closed
/// instead of guessing a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The selected tier does not exist in the catalog.
    #[error("Unknown tier: {0}")]
    UnknownTier(TierId),

    /// The selected add-on does not exist in the catalog.
    #[error("Unknown add-on: {0}")]
    UnknownAddOn(AddOnId),

    /// The add-on exists but the tier does not allow it.
    #[error("Add-on '{add_on}' is not available for tier '{tier}'")]
    AddOnNotAllowed { tier: TierId, add_on: AddOnId },

    /// The duration is not one of the catalog's allowed values.
    #[error("Unsupported duration: {months} months (allowed: {allowed:?})")]
    UnsupportedDuration { months: u32, allowed: Vec<u32> },

    /// The computed total does not fit in a cent amount.
    #[error("Quoted amount out of range")]
    AmountOutOfRange,

    /// The catalog definition itself is inconsistent.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Convenience type alias for pricing results.
pub type Result<T> = std::result::Result<T, CatalogError>;
