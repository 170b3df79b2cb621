//! Checkout orchestrator: validate, charge, publish.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{ListingId, SessionId};
use pricing::{FinalizedSelection, PriceQuote, PricingEngine};
use wizard::{ListingKind, ListingWizard, PaymentState, ValidationAdapter, WizardError};

use crate::SharedWizard;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, PaymentError, ReconciliationError};
use crate::services::alerts::{ReconciliationAlert, ReconciliationSink};
use crate::services::payment::{ChargeReceipt, ChargeRequest, PaymentGateway};
use crate::services::repository::{ListingRepository, ListingSubmission};

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub listing_id: ListingId,
    pub quote: PriceQuote,
    pub selection: FinalizedSelection,
    /// Gateway reference; `None` for free listings.
    pub payment_reference: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl PublishResult {
    pub fn is_free(&self) -> bool {
        self.quote.is_free()
    }
}

/// What `prepare` decided, captured under the wizard lock.
struct Prepared {
    session_id: SessionId,
    quote: PriceQuote,
    selection: FinalizedSelection,
    charge: Option<ChargeRequest>,
}

/// Removes a session from the in-flight set when checkout ends, however it
/// ends.
struct InFlightGuard<'a> {
    sessions: &'a Mutex<HashSet<SessionId>>,
    session_id: SessionId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

/// Orchestrates checkout for wizard sessions.
///
/// Holds one pricing engine per listing type. A session that is already in
/// checkout is turned away with [`PaymentError::DuplicateInFlight`]; calls
/// are never queued. The wizard lock is released around every gateway and
/// repository await.
pub struct CheckoutOrchestrator<G, R, A>
where
    G: PaymentGateway,
    R: ListingRepository,
    A: ReconciliationSink,
{
    job_engine: PricingEngine,
    salon_engine: PricingEngine,
    gateway: G,
    repository: R,
    alerts: A,
    config: CheckoutConfig,
    in_flight: Mutex<HashSet<SessionId>>,
}

impl<G, R, A> CheckoutOrchestrator<G, R, A>
where
    G: PaymentGateway,
    R: ListingRepository,
    A: ReconciliationSink,
{
    /// Creates an orchestrator with the built-in catalogs.
    pub fn new(gateway: G, repository: R, alerts: A, config: CheckoutConfig) -> Self {
        Self {
            job_engine: PricingEngine::new(ListingKind::Job.catalog()),
            salon_engine: PricingEngine::new(ListingKind::Salon.catalog()),
            gateway,
            repository,
            alerts,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replaces the pricing engine used for one listing type.
    pub fn with_engine(mut self, kind: ListingKind, engine: PricingEngine) -> Self {
        match kind {
            ListingKind::Job => self.job_engine = engine,
            ListingKind::Salon => self.salon_engine = engine,
        }
        self
    }

    pub fn engine_for(&self, kind: ListingKind) -> &PricingEngine {
        match kind {
            ListingKind::Job => &self.job_engine,
            ListingKind::Salon => &self.salon_engine,
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Validates, charges and publishes the session's listing.
    ///
    /// On success the wizard is `Submitted`. Payment failures leave it on the
    /// payment step with payment `Failed`, ready for a retry. If publish fails
    /// after a charge, a reconciliation alert is raised and the wizard stays
    /// unsubmitted with payment `Completed`; calling `checkout` again retries
    /// only the publish.
    ///
    /// The wizard is held for checkout until this returns, so edits made
    /// while the gateway or repository is awaited are rejected. If the
    /// future is dropped instead, the hold stays until
    /// [`ListingWizard::abandon_checkout`] is called.
    #[tracing::instrument(skip(self, wizard), fields(session_id = tracing::field::Empty))]
    pub async fn checkout<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
    ) -> Result<PublishResult, CheckoutError> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        let result = self.run(wizard).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    async fn run<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
    ) -> Result<PublishResult, CheckoutError> {
        let (prepared, _guard) = {
            let mut w = wizard.lock().await;
            tracing::Span::current().record("session_id", tracing::field::display(w.session_id()));
            let guard = self.enter(w.session_id())?;
            (self.prepare(&mut w)?, guard)
        };

        let result = self.pay_and_publish(wizard, prepared).await;
        wizard.lock().await.end_checkout();
        result
    }

    async fn pay_and_publish<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
        prepared: Prepared,
    ) -> Result<PublishResult, CheckoutError> {
        let payment_reference = match &prepared.charge {
            Some(request) => Some(self.pay(wizard, request).await?.reference),
            None => wizard.lock().await.draft().payment_reference().map(str::to_string),
        };

        self.publish(wizard, prepared, payment_reference).await
    }

    /// Marks the session as in checkout.
    fn enter(&self, session_id: SessionId) -> Result<InFlightGuard<'_>, CheckoutError> {
        let mut sessions = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !sessions.insert(session_id) {
            metrics::counter!("checkout_duplicate_rejected_total").increment(1);
            tracing::warn!(%session_id, "duplicate checkout rejected while in flight");
            return Err(PaymentError::DuplicateInFlight.into());
        }
        Ok(InFlightGuard {
            sessions: &self.in_flight,
            session_id,
        })
    }

    /// Checks preconditions, prices the selection, moves payment state and
    /// takes the checkout hold.
    fn prepare<V: ValidationAdapter>(
        &self,
        w: &mut ListingWizard<V>,
    ) -> Result<Prepared, CheckoutError> {
        if w.is_submitted() {
            return Err(WizardError::AlreadySubmitted.into());
        }
        if w.draft().payment_state().is_in_flight() || w.is_checkout_active() {
            metrics::counter!("checkout_duplicate_rejected_total").increment(1);
            return Err(PaymentError::DuplicateInFlight.into());
        }

        let pending = w.draft().pending_photos().count();
        if pending > 0 {
            return Err(CheckoutError::PhotosPending(pending));
        }

        w.validate_all()?;

        let selection = w
            .draft()
            .pricing_selection()
            .ok_or(CheckoutError::MissingSelection)?
            .clone();
        let quote = self.engine_for(w.kind()).quote(&selection)?;
        let finalized = FinalizedSelection::new(&selection, &quote);

        let charge = match w.draft().payment_state() {
            PaymentState::Completed => {
                tracing::info!("payment already completed; retrying publish only");
                None
            }
            _ if quote.is_free() => {
                w.waive_payment(&quote)?;
                tracing::debug!("free plan; payment skipped");
                None
            }
            _ => {
                w.begin_payment()?;
                Some(ChargeRequest {
                    session_id: w.session_id(),
                    kind: w.kind(),
                    currency: self.config.currency.clone(),
                    selection: finalized.clone(),
                })
            }
        };
        w.begin_checkout()?;

        Ok(Prepared {
            session_id: w.session_id(),
            quote,
            selection: finalized,
            charge,
        })
    }

    /// Calls the gateway without holding the wizard lock and records the result.
    async fn pay<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, CheckoutError> {
        let outcome = tokio::time::timeout(self.config.payment_timeout(), self.gateway.charge(request))
            .await
            .unwrap_or(Err(PaymentError::Timeout));

        let mut w = wizard.lock().await;
        match outcome {
            Ok(receipt) => {
                w.complete_payment(receipt.reference.clone())?;
                tracing::info!(
                    reference = %receipt.reference,
                    amount_cents = receipt.amount_cents,
                    "payment completed"
                );
                Ok(receipt)
            }
            Err(error) => {
                w.fail_payment()?;
                metrics::counter!("payment_failures_total", "reason" => error.code()).increment(1);
                tracing::warn!(reason = error.code(), %error, "payment failed");
                Err(error.into())
            }
        }
    }

    /// Publishes the listing and closes the wizard.
    async fn publish<V: ValidationAdapter>(
        &self,
        wizard: &SharedWizard<V>,
        prepared: Prepared,
        payment_reference: Option<String>,
    ) -> Result<PublishResult, CheckoutError> {
        let submission = {
            let w = wizard.lock().await;
            ListingSubmission::from_draft(
                prepared.session_id,
                w.kind(),
                w.draft(),
                prepared.selection.clone(),
            )
        };

        let listing_id = match self.repository.publish(&submission).await {
            Ok(id) => id,
            Err(err) => {
                let Some(payment_reference) = payment_reference else {
                    tracing::warn!(error = %err, "publish failed for free listing");
                    return Err(CheckoutError::PublishFailed(err));
                };
                let error = ReconciliationError {
                    payment_reference,
                    amount_cents: prepared.quote.amount_cents(),
                    session_id: prepared.session_id,
                    reason: err.to_string(),
                };
                metrics::counter!("reconciliation_required_total").increment(1);
                tracing::error!(
                    alert = "reconciliation",
                    reference = %error.payment_reference,
                    amount_cents = error.amount_cents,
                    reason = %error.reason,
                    "payment captured but listing not published"
                );
                self.alerts.raise(ReconciliationAlert::new(error.clone())).await;
                return Err(error.into());
            }
        };

        wizard.lock().await.complete_submission(listing_id.clone())?;
        metrics::counter!("listings_published_total").increment(1);
        tracing::info!(%listing_id, amount_cents = prepared.quote.amount_cents(), "listing published");

        Ok(PublishResult {
            listing_id,
            quote: prepared.quote,
            selection: prepared.selection,
            payment_reference,
            published_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        InMemoryListingRepository, InMemoryPaymentGateway, InMemoryReconciliationSink,
    };
    use pricing::PricingSelection;
    use wizard::{Draft, Step, ValidationResult, WizardConfig};

    type AlwaysValid = fn(&Step, &Draft) -> ValidationResult;

    fn always_valid(_: &Step, _: &Draft) -> ValidationResult {
        ValidationResult::ok()
    }

    fn orchestrator() -> CheckoutOrchestrator<
        InMemoryPaymentGateway,
        InMemoryListingRepository,
        InMemoryReconciliationSink,
    > {
        CheckoutOrchestrator::new(
            InMemoryPaymentGateway::new(),
            InMemoryListingRepository::new(),
            InMemoryReconciliationSink::new(),
            CheckoutConfig::default(),
        )
    }

    fn wizard_with(selection: Option<PricingSelection>) -> SharedWizard<AlwaysValid> {
        let mut w = ListingWizard::new(
            ListingKind::Job,
            always_valid as AlwaysValid,
            WizardConfig::default(),
        );
        if let Some(selection) = selection {
            w.set_pricing_selection(selection).unwrap();
        }
        crate::share(w)
    }

    #[tokio::test]
    async fn test_missing_selection() {
        let result = orchestrator().checkout(&wizard_with(None)).await;
        assert_eq!(result.unwrap_err(), CheckoutError::MissingSelection);
    }

    #[tokio::test]
    async fn test_unknown_tier_fails_closed() {
        let o = orchestrator();
        let wizard = wizard_with(Some(PricingSelection::new("platinum", 1)));

        let err = o.checkout(&wizard).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Catalog(_)));
        assert_eq!(wizard.lock().await.draft().payment_state(), PaymentState::NotStarted);
    }

    #[tokio::test]
    async fn test_session_released_after_failure() {
        let o = orchestrator();
        let wizard = wizard_with(None);
        o.checkout(&wizard).await.unwrap_err();
        o.checkout(&wizard).await.unwrap_err();
        assert!(o.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_hold_released_after_failure() {
        let o = orchestrator();
        let wizard = wizard_with(Some(PricingSelection::new("standard", 1)));
        o.gateway.set_fail_with(Some(PaymentError::Cancelled));

        o.checkout(&wizard).await.unwrap_err();

        let w = wizard.lock().await;
        assert!(!w.is_checkout_active());
        assert_eq!(w.draft().payment_state(), PaymentState::Failed);
    }

    #[tokio::test]
    async fn test_held_session_is_turned_away() {
        let o = orchestrator();
        let wizard = wizard_with(Some(PricingSelection::new("standard", 1)));
        wizard.lock().await.begin_checkout().unwrap();

        let err = o.checkout(&wizard).await.unwrap_err();

        assert_eq!(err, CheckoutError::Payment(PaymentError::DuplicateInFlight));
        assert_eq!(o.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_salon_engine_selected_by_kind() {
        let o = orchestrator();
        assert!(o.engine_for(ListingKind::Salon).catalog().tier(&"gold".into()).is_some());
        assert!(o.engine_for(ListingKind::Job).catalog().tier(&"gold".into()).is_none());
    }
}
