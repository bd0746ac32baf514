//! # Ledger Configuration
//!
//! Policy flags and the admin-PIN shared secret.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FORECOURT_ALLOW_NEGATIVE_BALANCE=1                                 │
//! │     FORECOURT_CAS_RETRIES=5                                            │
//! │     FORECOURT_ADMIN_PIN=4711                                           │
//! │                                                                         │
//! │  2. Builder methods on LedgerConfig                                    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     negative balances forbidden, 3 CAS retries, no PIN                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default bound on optimistic-concurrency retries.
pub const DEFAULT_CAS_RETRIES: u32 = 3;

/// Runtime configuration for the ledger coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Whether a debit may drive an account balance below zero.
    /// When false (the default), such debits fail with
    /// `InsufficientFunds`.
    pub allow_negative_balance: bool,

    /// Bound on optimistic-concurrency retries before an operation
    /// surfaces `ConcurrentModification`.
    pub cas_max_retries: u32,

    /// Shared secret the order-entry UI must present before recording
    /// fuel nozzle sales. `None` disables the gate.
    pub admin_pin: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            allow_negative_balance: false,
            cas_max_retries: DEFAULT_CAS_RETRIES,
            admin_pin: None,
        }
    }
}

impl LedgerConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows debits to drive balances negative.
    pub fn allow_negative_balance(mut self, allow: bool) -> Self {
        self.allow_negative_balance = allow;
        self
    }

    /// Sets the optimistic-concurrency retry bound.
    pub fn cas_max_retries(mut self, retries: u32) -> Self {
        self.cas_max_retries = retries.max(1);
        self
    }

    /// Sets the admin PIN shared secret.
    pub fn admin_pin(mut self, pin: impl Into<String>) -> Self {
        self.admin_pin = Some(pin.into());
        self
    }

    /// Applies `FORECOURT_*` environment overrides on top of the current
    /// values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("FORECOURT_ALLOW_NEGATIVE_BALANCE") {
            match raw.as_str() {
                "1" | "true" | "yes" => self.allow_negative_balance = true,
                "0" | "false" | "no" => self.allow_negative_balance = false,
                other => warn!(value = %other, "Ignoring bad FORECOURT_ALLOW_NEGATIVE_BALANCE"),
            }
        }
        if let Ok(raw) = std::env::var("FORECOURT_CAS_RETRIES") {
            match raw.parse::<u32>() {
                Ok(n) if n >= 1 => self.cas_max_retries = n,
                _ => warn!(value = %raw, "Ignoring bad FORECOURT_CAS_RETRIES"),
            }
        }
        if let Ok(pin) = std::env::var("FORECOURT_ADMIN_PIN") {
            if !pin.is_empty() {
                self.admin_pin = Some(pin);
            }
        }
        self
    }

    /// Checks a presented PIN against the configured shared secret.
    ///
    /// The order-entry UI calls this before submitting a fuel nozzle sale.
    /// The coordinator trusts the caller to have performed this check and
    /// does not re-verify. When no PIN is configured the gate is open.
    pub fn verify_admin_pin(&self, presented: &str) -> bool {
        match &self.admin_pin {
            Some(pin) => pin == presented,
            None => true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert!(!config.allow_negative_balance);
        assert_eq!(config.cas_max_retries, DEFAULT_CAS_RETRIES);
        assert!(config.admin_pin.is_none());
    }

    #[test]
    fn test_builder() {
        let config = LedgerConfig::new()
            .allow_negative_balance(true)
            .cas_max_retries(5)
            .admin_pin("4711");

        assert!(config.allow_negative_balance);
        assert_eq!(config.cas_max_retries, 5);
        assert_eq!(config.admin_pin.as_deref(), Some("4711"));
    }

    #[test]
    fn test_retry_bound_is_at_least_one() {
        let config = LedgerConfig::new().cas_max_retries(0);
        assert_eq!(config.cas_max_retries, 1);
    }

    #[test]
    fn test_pin_gate() {
        let open = LedgerConfig::default();
        assert!(open.verify_admin_pin("anything"));

        let gated = LedgerConfig::new().admin_pin("4711");
        assert!(gated.verify_admin_pin("4711"));
        assert!(!gated.verify_admin_pin("0000"));
    }
}
