use solana_client::client_error::ClientError;
use solana_client::nonblocking::pubsub_client::PubsubClientError;
use solana_signer::SignerError;
use std::time::Duration;

/// Errors that can occur during transaction building and sending
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Connection not initialized. Call set_rpc() first.")]
    ConnectionNotInitialized,

    #[error("RPC Error: {0}")]
    RpcError(#[from] ClientError),

    #[error("Pubsub Error: {0}")]
    PubsubError(#[from] PubsubClientError),

    /// Never returned from the build pipeline; the compute unit estimator
    /// falls back to the maximum allotment instead.
    #[error("Simulation Failed: {0}")]
    SimulationFailed(String),

    /// Never returned from the build pipeline; the tip degrades to zero.
    #[error("Tip Fetch Failed: {0}")]
    TipFetchFailed(String),

    #[error("Invalid Transaction: {0}")]
    InvalidTransaction(String),

    #[error("Signing Error: {0}")]
    SigningError(#[from] SignerError),

    #[error("Confirmation Timeout ({0:?})")]
    ConfirmationTimeout(Duration),

    #[error("Transaction Failed: {0}")]
    TransactionFailed(String),

    #[error("Invalid Configuration: {0}")]
    ConfigError(String),
}

impl TransactionError {
    /// Whether the error came from the remote node rather than local state.
    pub fn is_rpc_error(&self) -> bool {
        matches!(self, Self::RpcError(_) | Self::PubsubError(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConfirmationTimeout(_))
    }
}

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TransactionError>;
