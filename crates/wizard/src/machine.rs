//! The wizard state machine.

use std::collections::{BTreeMap, HashSet};

use common::{ListingId, PhotoId, SessionId};
use pricing::{CatalogError, PriceQuote, PricingEngine, PricingSelection};

use crate::config::WizardConfig;
use crate::draft::{Draft, FieldPatch};
use crate::error::{ValidationError, WizardError};
use crate::photo::{AttachReport, Photo, PhotoFile};
use crate::state::{PaymentState, WizardPosition};
use crate::step::{ListingKind, Step, StepId};
use crate::validation::ValidationAdapter;

/// Step sequence, current position and draft for one posting session.
///
/// The machine is linear. Forward moves validate the current step, backward
/// moves never do, and entered values survive any navigation. Once
/// submitted, every mutation is rejected.
#[derive(Debug)]
pub struct ListingWizard<V> {
    session_id: SessionId,
    kind: ListingKind,
    steps: Vec<Step>,
    position: WizardPosition,
    /// Highest step index reached, kept across jumps back for editing.
    furthest_reached: usize,
    draft: Draft,
    /// Messages from the last failed `advance`, keyed by field.
    field_errors: BTreeMap<String, String>,
    listing_id: Option<ListingId>,
    /// Set while a checkout owns the session.
    checkout_active: bool,
    validator: V,
    config: WizardConfig,
}

impl<V: ValidationAdapter> ListingWizard<V> {
    /// Opens a wizard with an empty draft and the listing type's step sequence.
    pub fn new(kind: ListingKind, validator: V, config: WizardConfig) -> Self {
        Self::build(kind, kind.steps(), Draft::new(), validator, config)
    }

    /// Opens a wizard with a pre-populated draft (a template, or an existing
    /// listing being edited). Starts at the first step.
    ///
    /// A draft captured while a payment was in flight comes back as `Failed`,
    /// since no call is outstanding in this session.
    ///
    /// Photos beyond the policy limit are dropped from the end and reported
    /// as `CountExceeded`; the report's `accepted` lists the photos kept.
    pub fn resume(
        kind: ListingKind,
        mut draft: Draft,
        validator: V,
        config: WizardConfig,
    ) -> (Self, AttachReport) {
        if draft.payment_state().is_in_flight() {
            tracing::warn!(%kind, "resumed draft had a payment in flight; marking failed");
            draft.set_payment(PaymentState::Failed, None);
        }

        let max = config.photo_policy.max_photos;
        let mut report = AttachReport::default();
        for photo in draft.truncate_photos(max) {
            let error = crate::UploadError::CountExceeded { max };
            metrics::counter!("photos_rejected_total", "reason" => error.code()).increment(1);
            report.reject(photo.file.file_name, error);
        }
        report.accepted = draft.photos().iter().map(|p| p.id).collect();
        if report.rejected_count() > 0 {
            tracing::warn!(
                %kind,
                dropped = report.rejected_count(),
                max,
                "resumed draft had too many photos; extra photos dropped"
            );
        }

        (Self::build(kind, kind.steps(), draft, validator, config), report)
    }

    /// Opens a wizard over a custom step sequence.
    ///
    /// Step indices are reassigned from the sequence order.
    pub fn with_steps(
        kind: ListingKind,
        steps: Vec<StepId>,
        validator: V,
        config: WizardConfig,
    ) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::InvalidSteps("no steps".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = steps.iter().find(|id| !seen.insert(*id)) {
            return Err(WizardError::InvalidSteps(format!("duplicate step '{dup}'")));
        }
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, id)| Step { id, index })
            .collect();
        Ok(Self::build(kind, steps, Draft::new(), validator, config))
    }

    fn build(
        kind: ListingKind,
        steps: Vec<Step>,
        draft: Draft,
        validator: V,
        config: WizardConfig,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            kind,
            steps,
            position: WizardPosition::default(),
            furthest_reached: 0,
            draft,
            field_errors: BTreeMap::new(),
            listing_id: None,
            checkout_active: false,
            validator,
            config,
        }
    }
}

// Query methods
impl<V: ValidationAdapter> ListingWizard<V> {
    /// Returns the session ID.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the listing type.
    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    /// Returns the step sequence.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the current position.
    pub fn position(&self) -> WizardPosition {
        self.position
    }

    /// Returns the current step index, or `None` once submitted.
    pub fn current_index(&self) -> Option<usize> {
        self.position.index()
    }

    /// Returns the current step, or `None` once submitted.
    pub fn current_step(&self) -> Option<&Step> {
        self.current_index().map(|i| &self.steps[i])
    }

    /// Returns true on the final step.
    pub fn is_last_step(&self) -> bool {
        self.current_index() == Some(self.last_index())
    }

    /// Returns the highest step index reached so far.
    pub fn furthest_reached(&self) -> usize {
        self.furthest_reached
    }

    /// Returns the draft.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Returns the messages from the last failed advance.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Returns true once the listing is published.
    pub fn is_submitted(&self) -> bool {
        self.position.is_terminal()
    }

    /// Returns true while a checkout holds the session.
    pub fn is_checkout_active(&self) -> bool {
        self.checkout_active
    }

    /// Returns the published listing ID once submitted.
    pub fn listing_id(&self) -> Option<&ListingId> {
        self.listing_id.as_ref()
    }

    /// Prices the current selection, or `None` if no plan is chosen yet.
    pub fn quote(&self, engine: &PricingEngine) -> Option<Result<PriceQuote, CatalogError>> {
        self.draft.pricing_selection().map(|s| engine.quote(s))
    }

    /// Re-runs validation for every step, returning the first failure.
    ///
    /// Steps revisited through `retreat` or `jump_to` may have been edited
    /// since they last passed, so nothing is assumed from earlier advances.
    pub fn validate_all(&self) -> Result<(), ValidationError> {
        for step in &self.steps {
            let result = self.validator.validate(step, &self.draft);
            if !result.is_ok() {
                return Err(ValidationError {
                    step: step.id.clone(),
                    errors: result.errors,
                });
            }
        }
        Ok(())
    }

    fn last_index(&self) -> usize {
        self.steps.len() - 1
    }
}

// Navigation
impl<V: ValidationAdapter> ListingWizard<V> {
    /// Validates the current step and moves forward on success.
    ///
    /// On the last step a successful advance stays put. On failure the
    /// position is unchanged and the per-field messages are returned.
    pub fn advance(&mut self) -> Result<usize, WizardError> {
        let index = self.ensure_on_step()?;
        let step = &self.steps[index];

        let result = self.validator.validate(step, &self.draft);
        if !result.is_ok() {
            metrics::counter!("wizard_validation_failures_total", "step" => step.id.as_str().to_string())
                .increment(1);
            tracing::debug!(step = %step.id, errors = result.errors.len(), "step validation failed");
            self.field_errors = result.errors.clone();
            return Err(ValidationError {
                step: step.id.clone(),
                errors: result.errors,
            }
            .into());
        }

        self.field_errors.clear();
        let next = (index + 1).min(self.last_index());
        self.position = WizardPosition::Step(next);
        self.furthest_reached = self.furthest_reached.max(next);
        tracing::debug!(from = index, to = next, "wizard advanced");
        Ok(next)
    }

    /// Moves back one step without validating. Stays on the first step.
    pub fn retreat(&mut self) -> Result<usize, WizardError> {
        let index = self.ensure_on_step()?;
        let previous = index.saturating_sub(1);
        self.position = WizardPosition::Step(previous);
        self.field_errors.clear();
        tracing::debug!(from = index, to = previous, "wizard retreated");
        Ok(previous)
    }

    /// Returns directly to the current or an earlier step for editing.
    ///
    /// Never moves forward, so unvisited steps cannot be skipped.
    pub fn jump_to(&mut self, step_id: &StepId) -> Result<usize, WizardError> {
        let current = self.ensure_on_step()?;
        let target = self
            .steps
            .iter()
            .position(|s| &s.id == step_id)
            .ok_or_else(|| WizardError::UnknownStep(step_id.clone()))?;

        if target > current {
            return Err(WizardError::InvalidJump { current, target });
        }

        self.position = WizardPosition::Step(target);
        self.field_errors.clear();
        tracing::debug!(from = current, to = target, "wizard jumped");
        Ok(target)
    }

    fn ensure_on_step(&self) -> Result<usize, WizardError> {
        self.ensure_mutable()?;
        self.current_index().ok_or(WizardError::AlreadySubmitted)
    }

    fn ensure_mutable(&self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.draft.payment_state().is_in_flight() {
            return Err(WizardError::PaymentInProgress);
        }
        if self.checkout_active {
            return Err(WizardError::CheckoutInProgress);
        }
        Ok(())
    }
}

// Draft mutation
impl<V: ValidationAdapter> ListingWizard<V> {
    /// Merges field values into the draft. Does not validate.
    pub fn update_draft(&mut self, patch: FieldPatch) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        self.draft.merge(patch);
        Ok(())
    }

    /// Sets the plan selection. Locked once payment has completed.
    pub fn set_pricing_selection(&mut self, selection: PricingSelection) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        if self.draft.payment_state().can_publish() {
            return Err(WizardError::PricingLocked);
        }
        self.draft.set_pricing_selection(selection);
        Ok(())
    }

    /// Attaches a batch of photos.
    ///
    /// Each file is checked for type and size. Valid files are accepted until
    /// the photo limit is reached; the rest are reported as `CountExceeded`.
    pub fn attach_photos(&mut self, files: Vec<PhotoFile>) -> Result<AttachReport, WizardError> {
        self.ensure_mutable()?;
        let policy = &self.config.photo_policy;
        let mut report = AttachReport::default();

        for file in files {
            let check = policy.check(&file).and_then(|()| {
                if self.draft.photos().len() >= policy.max_photos {
                    Err(crate::UploadError::CountExceeded {
                        max: policy.max_photos,
                    })
                } else {
                    Ok(())
                }
            });

            match check {
                Ok(()) => {
                    let photo = Photo::new(file);
                    report.accepted.push(photo.id);
                    self.draft.push_photo(photo);
                }
                Err(error) => {
                    metrics::counter!("photos_rejected_total", "reason" => error.code())
                        .increment(1);
                    report.reject(file.file_name, error);
                }
            }
        }

        tracing::debug!(
            accepted = report.accepted_count(),
            rejected = report.rejected_count(),
            "photos attached"
        );
        Ok(report)
    }

    /// Removes the photo at `index`.
    pub fn remove_photo(&mut self, index: usize) -> Result<Photo, WizardError> {
        self.ensure_mutable()?;
        self.draft
            .remove_photo_at(index)
            .ok_or_else(|| WizardError::PhotoNotFound(format!("index {index}")))
    }

    /// Records the storage handle for an uploaded photo.
    pub fn record_photo_handle(
        &mut self,
        id: PhotoId,
        handle: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        let photo = self
            .draft
            .photo_mut(id)
            .ok_or_else(|| WizardError::PhotoNotFound(id.to_string()))?;
        photo.handle = Some(handle.into());
        Ok(())
    }

    /// Drops a photo that storage refused.
    pub fn discard_photo(&mut self, id: PhotoId) -> Result<Photo, WizardError> {
        self.ensure_mutable()?;
        self.draft
            .remove_photo(id)
            .ok_or_else(|| WizardError::PhotoNotFound(id.to_string()))
    }
}

// Payment and submission
impl<V: ValidationAdapter> ListingWizard<V> {
    /// Marks a gateway request as outstanding.
    ///
    /// Fails with `PaymentInProgress` if one already is, which is how
    /// duplicate submits are turned away.
    pub fn begin_payment(&mut self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        let current = self.draft.payment_state();
        if current.is_in_flight() {
            return Err(WizardError::PaymentInProgress);
        }
        if !current.can_begin() {
            return Err(WizardError::InvalidPaymentTransition {
                current,
                action: "begin payment",
            });
        }
        self.draft.set_payment(PaymentState::InProgress, None);
        Ok(())
    }

    /// Records gateway success.
    pub fn complete_payment(&mut self, reference: impl Into<String>) -> Result<(), WizardError> {
        self.settle_payment(PaymentState::Completed, Some(reference.into()), "complete payment")
    }

    /// Records gateway failure or timeout. A retry is allowed afterwards.
    pub fn fail_payment(&mut self) -> Result<(), WizardError> {
        self.settle_payment(PaymentState::Failed, None, "fail payment")
    }

    fn settle_payment(
        &mut self,
        next: PaymentState,
        reference: Option<String>,
        action: &'static str,
    ) -> Result<(), WizardError> {
        let current = self.draft.payment_state();
        if !current.is_in_flight() {
            return Err(WizardError::InvalidPaymentTransition { current, action });
        }
        self.draft.set_payment(next, reference);
        Ok(())
    }

    /// Marks payment complete without a gateway call. Only a zero quote
    /// qualifies.
    pub fn waive_payment(&mut self, quote: &PriceQuote) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        let current = self.draft.payment_state();
        if !quote.is_free() || !current.can_begin() {
            return Err(WizardError::InvalidPaymentTransition {
                current,
                action: "waive payment",
            });
        }
        self.draft.set_payment(PaymentState::Completed, None);
        Ok(())
    }

    /// Enters the terminal `Submitted` state after a successful publish.
    ///
    /// Payment must be `Completed`; this is the only way out of the step
    /// sequence.
    pub fn complete_submission(&mut self, listing_id: ListingId) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        let payment = self.draft.payment_state();
        if !payment.can_publish() {
            return Err(WizardError::PaymentNotCompleted(payment));
        }
        tracing::info!(session_id = %self.session_id, %listing_id, "listing submitted");
        self.position = WizardPosition::Submitted;
        self.listing_id = Some(listing_id);
        self.checkout_active = false;
        self.field_errors.clear();
        Ok(())
    }
}

// Checkout hold
impl<V: ValidationAdapter> ListingWizard<V> {
    /// Claims the session for a checkout.
    ///
    /// Until `end_checkout` or `abandon_checkout`, navigation and draft
    /// mutation fail with `CheckoutInProgress`, so the submission that gets
    /// published is the draft that was validated and priced.
    pub fn begin_checkout(&mut self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.checkout_active {
            return Err(WizardError::CheckoutInProgress);
        }
        self.checkout_active = true;
        Ok(())
    }

    /// Releases the session after a checkout returns, whatever its outcome.
    pub fn end_checkout(&mut self) {
        self.checkout_active = false;
    }

    /// Recovers a session whose checkout never returned.
    ///
    /// An outstanding payment is marked `Failed` and the hold is released, so
    /// the user can edit and retry. A settled payment is left as it is.
    pub fn abandon_checkout(&mut self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.draft.payment_state().is_in_flight() {
            tracing::warn!(session_id = %self.session_id, "abandoning in-flight payment");
            self.draft.set_payment(PaymentState::Failed, None);
        }
        self.checkout_active = false;
        Ok(())
    }
}
