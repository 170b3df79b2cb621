//! Pricing for paid listings.
//!
//! A [`PricingCatalog`] describes the plan tiers, duration discount bands and
//! add-ons for one listing type. [`PricingEngine`] turns a
//! [`PricingSelection`] into a single authoritative [`PriceQuote`].
//!
//! Evaluation order is fixed:
//! 1. Base price (`tier price per month * months`); free tiers stop here
//! 2. Duration band discount
//! 3. Multiplicative add-on discounts
//! 4. Flat add-on fees
//! 5. Round half-up to the cent

pub mod catalog;
pub mod engine;
pub mod error;
pub mod money;
pub mod quote;
pub mod selection;

pub use catalog::{AddOn, AddOnId, AddOnKind, DurationBand, PricingCatalog, PricingTier, TierId};
pub use engine::PricingEngine;
pub use error::{CatalogError, Result};
pub use money::Money;
pub use quote::{FinalizedSelection, PriceQuote};
pub use selection::PricingSelection;
