//! Checkout error types.

use common::SessionId;
use pricing::CatalogError;
use thiserror::Error;
use wizard::{ValidationError, WizardError};

/// Payment gateway failures. All are recoverable: the draft and wizard
/// position are kept and the user may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Payment was declined: {0}")]
    Declined(String),

    #[error("Payment timed out")]
    Timeout,

    #[error("Payment was cancelled")]
    Cancelled,

    /// A checkout for this session is already waiting on the gateway.
    #[error("A payment is already in flight for this session")]
    DuplicateInFlight,
}

impl PaymentError {
    /// Stable code for UI lookup and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Declined(_) => "declined",
            PaymentError::Timeout => "timeout",
            PaymentError::Cancelled => "cancelled",
            PaymentError::DuplicateInFlight => "duplicate-in-flight",
        }
    }
}

/// Listing repository failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Listing rejected: {0}")]
    Rejected(String),
}

/// Payment was captured but the listing was not published.
///
/// Money has moved. Someone has to finish the publish or refund the charge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Payment {payment_reference} ({amount_cents} cents) captured for session {session_id} but publish failed: {reason}"
)]
pub struct ReconciliationError {
    pub payment_reference: String,
    pub amount_cents: i64,
    pub session_id: SessionId,
    pub reason: String,
}

/// How an error must be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Show it and let the user fix or retry.
    Recoverable,
    /// Programmer or configuration error; retrying will not help.
    Fatal,
    /// Must reach operational alerting.
    RequiresReconciliation,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Recoverable => "recoverable",
            Severity::Fatal => "fatal",
            Severity::RequiresReconciliation => "requires-reconciliation",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A step no longer validates.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The selection could not be priced.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    /// The wizard refused a transition.
    #[error(transparent)]
    Wizard(WizardError),

    #[error("No listing plan selected")]
    MissingSelection,

    #[error("{0} photo(s) have not finished uploading")]
    PhotosPending(usize),

    /// Publish failed and no money moved.
    #[error("Publish failed: {0}")]
    PublishFailed(RepositoryError),
}

impl From<WizardError> for CheckoutError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(v) => CheckoutError::Validation(v),
            WizardError::PaymentInProgress | WizardError::CheckoutInProgress => {
                CheckoutError::Payment(PaymentError::DuplicateInFlight)
            }
            other => CheckoutError::Wizard(other),
        }
    }
}

impl CheckoutError {
    pub fn severity(&self) -> Severity {
        match self {
            CheckoutError::Validation(_)
            | CheckoutError::Payment(_)
            | CheckoutError::MissingSelection
            | CheckoutError::PhotosPending(_)
            | CheckoutError::PublishFailed(_) => Severity::Recoverable,
            CheckoutError::Catalog(_) | CheckoutError::Wizard(_) => Severity::Fatal,
            CheckoutError::Reconciliation(_) => Severity::RequiresReconciliation,
        }
    }

    /// Returns true if the user may simply try again.
    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
