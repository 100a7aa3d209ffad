use crate::error::Result;
use serde::{Deserialize, Serialize};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_hash::Hash;
use std::str::FromStr;
use std::time::Duration;

const MAINNET_HASH: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";
const DEVNET_HASH: &str = "EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG";
const ECLIPSE_HASH: &str = "EAQLJCV2mh23BsK2P9oYpV5CHVLDNHTxYss3URrNmg3s";
const ECLIPSE_TESTNET_HASH: &str = "CX4huckiV9QNAkKNVKi5Tj8nxzBive5kQimd94viMKsU";

/// Default RPC request timeout in milliseconds
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 30_000;

/// Default interval between signature status polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Network the RPC endpoint serves, identified by its genesis hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainId {
    Mainnet,
    Devnet,
    Eclipse,
    EclipseTestnet,
    Unknown(Hash),
}

impl ChainId {
    /// Get the underlying hash
    pub fn hash(&self) -> Hash {
        let known = match self {
            Self::Mainnet => MAINNET_HASH,
            Self::Devnet => DEVNET_HASH,
            Self::Eclipse => ECLIPSE_HASH,
            Self::EclipseTestnet => ECLIPSE_TESTNET_HASH,
            Self::Unknown(hash) => return *hash,
        };
        Hash::from_str(known).unwrap_or_default()
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "solana",
            Self::Devnet => "solana-devnet",
            Self::Eclipse => "eclipse",
            Self::EclipseTestnet => "eclipse-testnet",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<Hash> for ChainId {
    fn from(hash: Hash) -> Self {
        [
            Self::Mainnet,
            Self::Devnet,
            Self::Eclipse,
            Self::EclipseTestnet,
        ]
        .into_iter()
        .find(|chain| chain.hash() == hash)
        .unwrap_or(Self::Unknown(hash))
    }
}

/// Endpoint capabilities and submission behavior supplied with `set_rpc()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcOptions {
    /// The endpoint accepts a `percentile` parameter on `getRecentPrioritizationFees`
    #[serde(default)]
    pub supports_priority_fee_percentile: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Resend the raw transaction on every status poll
    #[serde(default)]
    pub resend_on_poll: bool,
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            supports_priority_fee_percentile: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            resend_on_poll: false,
            timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_rpc_timeout_ms() -> u64 {
    DEFAULT_RPC_TIMEOUT_MS
}

/// RPC configuration for connecting to Solana nodes
#[derive(Debug, Clone, PartialEq)]
pub struct RpcConfig {
    pub url: String,
    pub supports_priority_fee_percentile: bool,
    pub chain_id: Option<ChainId>,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub resend_on_poll: bool,
}

impl RpcConfig {
    /// Connect to `url` and detect the network from its genesis hash
    pub async fn new(url: impl Into<String>, options: RpcOptions) -> Result<Self> {
        let url = url.into();
        let client = RpcClient::new_with_timeout(url, Duration::from_millis(options.timeout_ms));
        Self::detect(&client, options).await
    }

    /// Detect the network through an existing client
    pub async fn detect(client: &RpcClient, options: RpcOptions) -> Result<Self> {
        let genesis_hash = client.get_genesis_hash().await?;
        Ok(Self::with_chain_id(
            client.url(),
            options,
            Some(ChainId::from(genesis_hash)),
        ))
    }

    /// Build a config without contacting the endpoint
    pub fn with_chain_id(
        url: impl Into<String>,
        options: RpcOptions,
        chain_id: Option<ChainId>,
    ) -> Self {
        Self {
            url: url.into(),
            supports_priority_fee_percentile: options.supports_priority_fee_percentile,
            chain_id,
            timeout_ms: options.timeout_ms,
            poll_interval_ms: options.poll_interval_ms,
            resend_on_poll: options.resend_on_poll,
        }
    }

    pub fn client(&self) -> RpcClient {
        RpcClient::new_with_timeout_and_commitment(
            self.url.clone(),
            Duration::from_millis(self.timeout_ms),
            CommitmentConfig::confirmed(),
        )
    }

    pub fn chain_name(&self) -> &'static str {
        match &self.chain_id {
            Some(chain_id) => chain_id.name(),
            None => "unknown",
        }
    }

    /// Check if the RPC is connected to Solana mainnet
    pub fn is_mainnet(&self) -> bool {
        self.chain_id
            .as_ref()
            .is_some_and(|chain_id| chain_id.is_mainnet())
    }

    /// Websocket endpoint derived from the HTTP endpoint
    pub fn websocket_url(&self) -> String {
        if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        }
    }
}
