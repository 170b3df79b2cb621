//! Wizard configuration.

use serde::Deserialize;

use crate::photo::PhotoPolicy;
use crate::step::ListingKind;

/// Settings for one wizard session.
///
/// Deserializable so the host application can load it from its own config
/// source; the wizard itself never reads the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub photo_policy: PhotoPolicy,
}

impl WizardConfig {
    /// Defaults for a listing type.
    pub fn for_kind(kind: ListingKind) -> Self {
        Self {
            photo_policy: kind.photo_policy(),
        }
    }

    pub fn with_photo_policy(mut self, photo_policy: PhotoPolicy) -> Self {
        self.photo_policy = photo_policy;
        self
    }
}
