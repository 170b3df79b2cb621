//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::SessionId;
use pricing::FinalizedSelection;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use wizard::ListingKind;

use crate::error::PaymentError;

/// A single charge sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub session_id: SessionId,
    pub kind: ListingKind,
    pub currency: String,
    /// Plan and amount in gateway wire shape.
    pub selection: FinalizedSelection,
}

impl ChargeRequest {
    pub fn amount_cents(&self) -> i64 {
        self.selection.amount_cents
    }
}

/// Result of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    /// Gateway reference, needed for any refund or reconciliation.
    pub reference: String,
    pub amount_cents: i64,
    pub charged_at: DateTime<Utc>,
}

/// Trait for charging a listing fee.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: HashMap<String, ChargeRequest>,
    next_id: u32,
    call_count: usize,
    fail_with: Option<PaymentError>,
}

/// In-memory payment gateway for testing.
///
/// Charges can be held open with [`hold_charges`](Self::hold_charges) to
/// simulate a slow gateway.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
    held: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            held: Arc::new(watch::Sender::new(false)),
        }
    }
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every charge fail with `error` until reset with `None`.
    pub fn set_fail_with(&self, error: Option<PaymentError>) {
        self.state.write().unwrap().fail_with = error;
    }

    /// Blocks charges until [`release_charges`](Self::release_charges).
    pub fn hold_charges(&self) {
        self.held.send_replace(true);
    }

    pub fn release_charges(&self) {
        self.held.send_replace(false);
    }

    /// Number of `charge` calls received, including failed and held ones.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().call_count
    }

    /// Number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    pub fn has_charge(&self, reference: &str) -> bool {
        self.state.read().unwrap().charges.contains_key(reference)
    }

    /// Sum of all successful charges, in cents.
    pub fn total_charged_cents(&self) -> i64 {
        self.state
            .read()
            .unwrap()
            .charges
            .values()
            .map(ChargeRequest::amount_cents)
            .sum()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, PaymentError> {
        self.state.write().unwrap().call_count += 1;

        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let mut state = self.state.write().unwrap();
        if let Some(error) = state.fail_with.clone() {
            return Err(error);
        }

        state.next_id += 1;
        let reference = format!("PAY-{:04}", state.next_id);
        state.charges.insert(reference.clone(), request.clone());

        Ok(ChargeReceipt {
            reference,
            amount_cents: request.amount_cents(),
            charged_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(amount_cents: i64) -> ChargeRequest {
        ChargeRequest {
            session_id: SessionId::new(),
            kind: ListingKind::Job,
            currency: "USD".to_string(),
            selection: FinalizedSelection {
                tier: "standard".to_string(),
                duration_months: 1,
                add_ons: vec![],
                amount_cents,
            },
        }
    }

    #[tokio::test]
    async fn test_charge_records_payment() {
        let gateway = InMemoryPaymentGateway::new();

        let receipt = gateway.charge(&request(4999)).await.unwrap();

        assert_eq!(receipt.reference, "PAY-0001");
        assert_eq!(receipt.amount_cents, 4999);
        assert!(gateway.has_charge("PAY-0001"));
        assert_eq!(gateway.total_charged_cents(), 4999);
    }

    #[tokio::test]
    async fn test_fail_with() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_with(Some(PaymentError::Declined("insufficient funds".into())));

        let result = gateway.charge(&request(4999)).await;

        assert!(matches!(result, Err(PaymentError::Declined(_))));
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_held_charge_completes_after_release() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.hold_charges();

        let req = request(100);
        let pending = gateway.charge(&req);
        tokio::pin!(pending);

        let early = tokio::time::timeout(Duration::from_millis(20), &mut pending).await;
        assert!(early.is_err());
        assert_eq!(gateway.call_count(), 1);

        gateway.release_charges();
        let receipt = pending.await.unwrap();
        assert_eq!(receipt.amount_cents, 100);
    }
}
