//! Wizard error types.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::state::PaymentState;
use crate::step::StepId;

/// A step failed validation.
///
/// Expected and recoverable: the wizard stays where it is and the messages
/// are shown next to their fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Step '{step}' has {} invalid field(s)", .errors.len())]
pub struct ValidationError {
    pub step: StepId,
    /// Field name to message.
    pub errors: BTreeMap<String, String>,
}

/// Per-file photo rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File is too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    BadType(String),

    #[error("Photo limit reached (max {max})")]
    CountExceeded { max: usize },
}

impl UploadError {
    /// Stable code for UI lookup and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::TooLarge { .. } => "too-large",
            UploadError::BadType(_) => "bad-type",
            UploadError::CountExceeded { .. } => "count-exceeded",
        }
    }
}

/// Errors that can occur during wizard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// The current step did not validate.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The listing was already submitted; the session is closed.
    #[error("Listing has already been submitted")]
    AlreadySubmitted,

    /// A payment call is in flight; no transition is accepted until it settles.
    #[error("Payment is in progress")]
    PaymentInProgress,

    /// A checkout holds the session until it finishes or is abandoned.
    #[error("Checkout is in progress")]
    CheckoutInProgress,

    /// Pricing cannot change once payment has completed.
    #[error("Pricing is locked after payment")]
    PricingLocked,

    /// `jump_to` may only target the current or an earlier step.
    #[error("Cannot jump forward from step {current} to step {target}")]
    InvalidJump { current: usize, target: usize },

    #[error("Unknown step: {0}")]
    UnknownStep(StepId),

    /// The step sequence is empty or has duplicate IDs.
    #[error("Invalid step sequence: {0}")]
    InvalidSteps(String),

    #[error("Photo not found: {0}")]
    PhotoNotFound(String),

    /// Submission requires a completed payment.
    #[error("Payment has not completed (state: {0})")]
    PaymentNotCompleted(PaymentState),

    /// Payment state cannot make the requested move.
    #[error("Invalid payment transition: cannot {action} from {current}")]
    InvalidPaymentTransition {
        current: PaymentState,
        action: &'static str,
    },
}

/// Convenience type alias for wizard results.
pub type Result<T> = std::result::Result<T, WizardError>;
