//! Identifier types shared across the listing wizard crates.

pub mod types;

pub use types::{ListingId, PhotoId, SessionId};
