use serde::{Deserialize, Serialize};
use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use std::time::Duration;

/// Default transaction confirmation timeout in milliseconds
pub const DEFAULT_TRANSACTION_TIMEOUT_MS: u64 = 30_000;

/// How `send_transaction()` waits for the transaction to land
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStrategy {
    /// Return as soon as the node accepts the transaction
    None,
    /// Poll `getSignatureStatuses` at the configured RPC poll interval
    #[default]
    Poll,
    /// Wait for a `signatureSubscribe` notification. Without an explicit URL
    /// the websocket endpoint is derived from the RPC URL.
    Subscribe {
        #[serde(default)]
        websocket_url: Option<String>,
    },
}

/// Transaction configuration for sending transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Skip preflight transaction checks
    #[serde(default)]
    pub skip_preflight: bool,

    /// Commitment for preflight and confirmation
    #[serde(default = "default_commitment")]
    pub commitment: CommitmentLevel,

    /// Retries the node itself performs; `None` leaves the node default
    #[serde(default)]
    pub max_retries: Option<usize>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub confirmation: ConfirmationStrategy,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            commitment: default_commitment(),
            max_retries: None,
            timeout_ms: DEFAULT_TRANSACTION_TIMEOUT_MS,
            confirmation: ConfirmationStrategy::default(),
        }
    }
}

impl SendOptions {
    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_commitment() -> CommitmentLevel {
    CommitmentLevel::Confirmed
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TRANSACTION_TIMEOUT_MS
}
