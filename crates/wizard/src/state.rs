//! Wizard position and payment state machines.

use serde::{Deserialize, Serialize};

/// Where the wizard is.
///
/// ```text
/// Step(0) ◄──► Step(1) ◄──► ... ◄──► Step(n-1) ──► Submitted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardPosition {
    /// On the step with this 0-based index.
    Step(usize),

    /// Listing published (terminal state).
    Submitted,
}

impl WizardPosition {
    /// Returns the step index, or `None` once submitted.
    pub fn index(&self) -> Option<usize> {
        match self {
            WizardPosition::Step(index) => Some(*index),
            WizardPosition::Submitted => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WizardPosition::Submitted)
    }
}

impl Default for WizardPosition {
    fn default() -> Self {
        WizardPosition::Step(0)
    }
}

impl std::fmt::Display for WizardPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardPosition::Step(index) => write!(f, "Step({index})"),
            WizardPosition::Submitted => write!(f, "Submitted"),
        }
    }
}

/// Payment progress for a draft.
///
/// State transitions:
/// ```text
/// NotStarted ──┬──► InProgress ──┬──► Completed
///              │        ▲        └──► Failed ──┐
///              │        └──────────────────────┘
///              └──► Completed   (free tier, no gateway call)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentState {
    #[default]
    NotStarted,

    /// A gateway call is outstanding.
    InProgress,

    /// Payment confirmed or waived (terminal state).
    Completed,

    /// The last attempt failed; a retry is allowed.
    Failed,
}

impl PaymentState {
    /// Returns true if a new gateway request may be issued.
    pub fn can_begin(&self) -> bool {
        matches!(self, PaymentState::NotStarted | PaymentState::Failed)
    }

    /// Returns true while a gateway request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PaymentState::InProgress)
    }

    /// Returns true if the listing may be published.
    pub fn can_publish(&self) -> bool {
        matches!(self, PaymentState::Completed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::NotStarted => "NotStarted",
            PaymentState::InProgress => "InProgress",
            PaymentState::Completed => "Completed",
            PaymentState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
