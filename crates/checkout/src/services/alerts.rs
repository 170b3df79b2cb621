//! Operational alerting for captured-but-unpublished payments.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ReconciliationError;

/// A reconciliation case handed to operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationAlert {
    pub error: ReconciliationError,
    pub raised_at: DateTime<Utc>,
}

impl ReconciliationAlert {
    pub fn new(error: ReconciliationError) -> Self {
        Self {
            error,
            raised_at: Utc::now(),
        }
    }
}

/// Receives reconciliation alerts. Implementations page someone or enqueue
/// a reconciliation job.
#[async_trait]
pub trait ReconciliationSink: Send + Sync {
    async fn raise(&self, alert: ReconciliationAlert);
}

/// In-memory sink for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReconciliationSink {
    alerts: Arc<RwLock<Vec<ReconciliationAlert>>>,
}

impl InMemoryReconciliationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.read().unwrap().len()
    }

    pub fn alerts(&self) -> Vec<ReconciliationAlert> {
        self.alerts.read().unwrap().clone()
    }
}

#[async_trait]
impl ReconciliationSink for InMemoryReconciliationSink {
    async fn raise(&self, alert: ReconciliationAlert) {
        self.alerts.write().unwrap().push(alert);
    }
}
