//! Listing wizard state machine.
//!
//! A [`ListingWizard`] owns the [`Draft`] for one posting session and walks
//! a fixed sequence of [`Step`]s chosen by [`ListingKind`]:
//! - `advance` moves forward only when the current step validates
//! - `retreat` moves back unconditionally and keeps every entered value
//! - `jump_to` returns to the current or an earlier step for editing
//!
//! Validation is delegated to a [`ValidationAdapter`]. Payment state lives on
//! the draft and is the sole precondition for the terminal `Submitted` state.

pub mod config;
pub mod draft;
pub mod error;
pub mod machine;
pub mod photo;
pub mod state;
pub mod step;
pub mod validation;

pub use config::WizardConfig;
pub use draft::{Draft, FieldPatch, FieldValue};
pub use error::{UploadError, ValidationError, WizardError};
pub use machine::ListingWizard;
pub use photo::{AttachReport, Photo, PhotoFile, PhotoPolicy, RejectedPhoto};
pub use state::{PaymentState, WizardPosition};
pub use step::{ListingKind, Step, StepId};
pub use validation::{FieldRule, RuleValidator, ValidationAdapter, ValidationResult};
