//! Checkout configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings for the checkout orchestrator.
///
/// Loaded by the host application; the core never reads the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Upper bound on a single gateway call, in milliseconds.
    pub payment_timeout_ms: u64,
    /// ISO 4217 code sent with every charge.
    pub currency: String,
}

impl CheckoutConfig {
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_ms)
    }

    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_timeout_ms: 30_000,
            currency: "USD".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CheckoutConfig::default();
        assert_eq!(config.payment_timeout(), Duration::from_secs(30));
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_with_payment_timeout() {
        let config = CheckoutConfig::default().with_payment_timeout(Duration::from_millis(250));
        assert_eq!(config.payment_timeout_ms, 250);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: CheckoutConfig = serde_json::from_str(r#"{"currency": "CAD"}"#).unwrap();
        assert_eq!(config.currency, "CAD");
        assert_eq!(config.payment_timeout_ms, 30_000);
    }
}
