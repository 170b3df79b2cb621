//! External collaborator traits and in-memory implementations.

pub mod alerts;
pub mod payment;
pub mod repository;
pub mod storage;

pub use alerts::{InMemoryReconciliationSink, ReconciliationAlert, ReconciliationSink};
pub use payment::{ChargeReceipt, ChargeRequest, InMemoryPaymentGateway, PaymentGateway};
pub use repository::{InMemoryListingRepository, ListingRepository, ListingSubmission};
pub use storage::{InMemoryPhotoStorage, PhotoStorageService};
