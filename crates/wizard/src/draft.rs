//! The draft aggregate owned by a wizard session.

use std::collections::BTreeMap;

use common::PhotoId;
use pricing::PricingSelection;
use serde::{Deserialize, Serialize};

use crate::photo::Photo;
use crate::state::PaymentState;

/// A single form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    /// Free text, including numeric strings such as `"1200"`.
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for whitespace-only text and empty lists.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Bool(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// A partial set of field values to merge into the draft.
pub type FieldPatch = BTreeMap<String, FieldValue>;

/// Everything entered during one wizard session.
///
/// Values are only ever added or overwritten; going back never clears them.
/// Nothing here is visible outside the session until publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    fields: BTreeMap<String, FieldValue>,
    photos: Vec<Photo>,
    pricing_selection: Option<PricingSelection>,
    payment_state: PaymentState,
    /// Gateway reference once payment has completed.
    payment_reference: Option<String>,
}

impl Draft {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a draft pre-populated from a template.
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Returns a field value by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns all fields.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns the attached photos in order.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Returns photos that have not been stored yet.
    pub fn pending_photos(&self) -> impl Iterator<Item = &Photo> {
        self.photos.iter().filter(|p| p.is_pending())
    }

    /// Returns the chosen plan, if any.
    pub fn pricing_selection(&self) -> Option<&PricingSelection> {
        self.pricing_selection.as_ref()
    }

    /// Returns the payment state.
    pub fn payment_state(&self) -> PaymentState {
        self.payment_state
    }

    /// Returns the gateway reference once payment has completed.
    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub(crate) fn merge(&mut self, patch: FieldPatch) {
        self.fields.extend(patch);
    }

    pub(crate) fn push_photo(&mut self, photo: Photo) {
        self.photos.push(photo);
    }

    pub(crate) fn remove_photo_at(&mut self, index: usize) -> Option<Photo> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub(crate) fn remove_photo(&mut self, id: PhotoId) -> Option<Photo> {
        let index = self.photos.iter().position(|p| p.id == id)?;
        Some(self.photos.remove(index))
    }

    /// Keeps the first `max` photos and returns the rest.
    pub(crate) fn truncate_photos(&mut self, max: usize) -> Vec<Photo> {
        self.photos.split_off(max.min(self.photos.len()))
    }

    pub(crate) fn photo_mut(&mut self, id: PhotoId) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn set_pricing_selection(&mut self, selection: PricingSelection) {
        self.pricing_selection = Some(selection);
    }

    pub(crate) fn set_payment(&mut self, state: PaymentState, reference: Option<String>) {
        self.payment_state = state;
        if reference.is_some() {
            self.payment_reference = reference;
        }
    }
}
