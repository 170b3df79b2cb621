//! Payment-gated publish for listing wizard sessions.
//!
//! The [`CheckoutOrchestrator`] runs the only side-effecting sequence of a
//! posting session:
//! 1. Re-validate every step and price the selection
//! 2. Charge the listing fee (skipped for free plans)
//! 3. Publish the listing and close the wizard
//!
//! A publish failure after a successful charge is a reconciliation case and
//! is raised through a [`ReconciliationSink`] instead of being retried
//! silently.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod uploader;

use std::sync::Arc;

use tokio::sync::Mutex;
use wizard::ListingWizard;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, PaymentError, ReconciliationError, RepositoryError, Severity};
pub use orchestrator::{CheckoutOrchestrator, PublishResult};
pub use services::{
    ChargeReceipt, ChargeRequest, InMemoryListingRepository, InMemoryPaymentGateway,
    InMemoryPhotoStorage, InMemoryReconciliationSink, ListingRepository, ListingSubmission,
    PaymentGateway, PhotoStorageService, ReconciliationAlert, ReconciliationSink,
};
pub use uploader::{PhotoUploader, UploadReport};

/// A wizard session shared between the UI and async collaborators.
pub type SharedWizard<V> = Arc<Mutex<ListingWizard<V>>>;

/// Wraps a wizard for use with the orchestrator and uploader.
pub fn share<V>(wizard: ListingWizard<V>) -> SharedWizard<V> {
    Arc::new(Mutex::new(wizard))
}
