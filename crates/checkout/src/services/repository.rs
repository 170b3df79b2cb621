//! Listing repository trait and in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ListingId, SessionId};
use pricing::FinalizedSelection;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use wizard::{Draft, FieldValue, ListingKind};

use crate::error::RepositoryError;

/// Everything the repository needs to make a listing visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSubmission {
    pub session_id: SessionId,
    pub kind: ListingKind,
    pub fields: BTreeMap<String, FieldValue>,
    /// Storage handles, in display order.
    pub photos: Vec<String>,
    pub selection: FinalizedSelection,
    /// Gateway reference; `None` for free listings.
    pub payment_reference: Option<String>,
}

impl ListingSubmission {
    /// Builds a submission from a draft whose photos are all stored.
    pub fn from_draft(
        session_id: SessionId,
        kind: ListingKind,
        draft: &Draft,
        selection: FinalizedSelection,
    ) -> Self {
        Self {
            session_id,
            kind,
            fields: draft.fields().clone(),
            photos: draft
                .photos()
                .iter()
                .filter_map(|p| p.handle.clone())
                .collect(),
            selection,
            payment_reference: draft.payment_reference().map(str::to_string),
        }
    }
}

/// Trait for publishing finished listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn publish(&self, submission: &ListingSubmission) -> Result<ListingId, RepositoryError>;
}

#[derive(Debug, Default)]
struct InMemoryRepositoryState {
    listings: HashMap<ListingId, ListingSubmission>,
    next_id: u32,
    publish_attempts: usize,
    fail_on_publish: bool,
}

/// In-memory listing repository for testing.
///
/// Publishes can be held open with [`hold_publishes`](Self::hold_publishes)
/// to simulate a slow store.
#[derive(Debug, Clone)]
pub struct InMemoryListingRepository {
    state: Arc<RwLock<InMemoryRepositoryState>>,
    held: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryListingRepository {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            held: Arc::new(watch::Sender::new(false)),
        }
    }
}

impl InMemoryListingRepository {
    /// Creates a new in-memory listing repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to fail every publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Blocks publishes until [`release_publishes`](Self::release_publishes).
    pub fn hold_publishes(&self) {
        self.held.send_replace(true);
    }

    pub fn release_publishes(&self) {
        self.held.send_replace(false);
    }

    /// Returns the number of published listings.
    pub fn listing_count(&self) -> usize {
        self.state.read().unwrap().listings.len()
    }

    /// Returns the number of publish calls, including failed ones.
    pub fn publish_attempts(&self) -> usize {
        self.state.read().unwrap().publish_attempts
    }

    /// Returns a published listing by ID.
    pub fn get(&self, id: &ListingId) -> Option<ListingSubmission> {
        self.state.read().unwrap().listings.get(id).cloned()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn publish(&self, submission: &ListingSubmission) -> Result<ListingId, RepositoryError> {
        self.state.write().unwrap().publish_attempts += 1;

        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(RepositoryError::Unavailable(
                "Listing store unavailable".to_string(),
            ));
        }

        state.next_id += 1;
        let listing_id = ListingId::new(format!("LST-{:04}", state.next_id));
        state
            .listings
            .insert(listing_id.clone(), submission.clone());
        Ok(listing_id)
    }
}
