use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use solana_client::nonblocking::rpc_client::RpcClient;
use tracing::{debug, warn};

use crate::compute_config::{ComputeConfig, ComputeUnitLimitStrategy};
use crate::error::{Result, TransactionError};
use crate::fee_config::{FeeConfig, FeeStrategy};
use crate::jito::JitoTipCache;
use crate::rpc_config::{RpcConfig, RpcOptions};

/// Global configuration state
/// The `GlobalConfig` contains:
/// - `Option<RpcConfig>` - Must be explicitly set with `set_rpc()` before building transactions
/// - `Option<Arc<RpcClient>>` - Created when RPC is set, for reuse across transactions
/// - `FeeConfig` and `ComputeConfig` - Configured with defaults but can be customized
/// - `Arc<JitoTipCache>` - The process-wide tip quote cache
static GLOBAL_CONFIG: OnceLock<RwLock<GlobalConfig>> = OnceLock::new();

// Initialize the global config
pub(crate) fn get_global_config() -> &'static RwLock<GlobalConfig> {
    GLOBAL_CONFIG.get_or_init(|| RwLock::new(GlobalConfig::default()))
}

fn read_global_config() -> Result<RwLockReadGuard<'static, GlobalConfig>> {
    get_global_config()
        .read()
        .map_err(|e| TransactionError::ConfigError(format!("Lock error: {e}")))
}

fn write_global_config() -> Result<RwLockWriteGuard<'static, GlobalConfig>> {
    get_global_config()
        .write()
        .map_err(|e| TransactionError::ConfigError(format!("Lock error: {e}")))
}

/// Configuration for transaction building and sending
///
/// The global instance is modified through `set_rpc()`, `set_priority_fee_strategy()`,
/// etc. Every pipeline operation also has a `*_with_config` variant that takes an
/// explicit `GlobalConfig`, so tests and multi-endpoint applications can bypass
/// the global state.
///
/// `rpc_config` and `rpc_client` are `None` until explicitly set. Building or
/// sending without them fails with `ConnectionNotInitialized`.
#[derive(Clone, Default)]
pub struct GlobalConfig {
    /// RPC configuration (None until explicitly set)
    pub rpc_config: Option<RpcConfig>,
    /// Shared RPC client (created when RPC config is set)
    pub rpc_client: Option<Arc<RpcClient>>,
    pub fee_config: FeeConfig,
    pub compute_config: ComputeConfig,
    pub tip_cache: Arc<JitoTipCache>,
}

impl GlobalConfig {
    /// A configuration bound to `rpc_client`, with default fee settings
    pub fn with_rpc(rpc_client: Arc<RpcClient>, rpc_config: RpcConfig) -> Self {
        Self {
            rpc_config: Some(rpc_config),
            rpc_client: Some(rpc_client),
            ..Self::default()
        }
    }

    pub fn rpc_client(&self) -> Result<Arc<RpcClient>> {
        self.rpc_client
            .clone()
            .ok_or(TransactionError::ConnectionNotInitialized)
    }

    pub fn rpc_config(&self) -> Result<&RpcConfig> {
        self.rpc_config
            .as_ref()
            .ok_or(TransactionError::ConnectionNotInitialized)
    }
}

/// Set the RPC configuration globally
///
/// Connects to `url` to detect the network. Replaces any previous RPC
/// configuration wholesale.
pub async fn set_rpc(url: &str, options: RpcOptions) -> Result<()> {
    let rpc_config = RpcConfig::new(url, options).await?;
    let rpc_client = Arc::new(rpc_config.client());
    install_rpc(rpc_client, rpc_config)
}

/// Set the RPC configuration globally from an existing client
pub async fn set_rpc_client(rpc_client: RpcClient, options: RpcOptions) -> Result<()> {
    let rpc_config = RpcConfig::detect(&rpc_client, options).await?;
    install_rpc(Arc::new(rpc_client), rpc_config)
}

fn install_rpc(rpc_client: Arc<RpcClient>, rpc_config: RpcConfig) -> Result<()> {
    debug!(url = %rpc_config.url, chain = rpc_config.chain_name(), "rpc configured");
    let mut config = write_global_config()?;
    warn_if_jito_off_mainnet(&config.fee_config.jito, Some(&rpc_config));
    config.rpc_config = Some(rpc_config);
    config.rpc_client = Some(rpc_client);
    Ok(())
}

/// Set the priority fee strategy globally
pub fn set_priority_fee_strategy(strategy: FeeStrategy) -> Result<()> {
    write_global_config()?.fee_config.priority_fee = strategy;
    Ok(())
}

/// Set the Jito tip strategy globally
pub fn set_jito_fee_strategy(strategy: FeeStrategy) -> Result<()> {
    let mut config = write_global_config()?;
    warn_if_jito_off_mainnet(&strategy, config.rpc_config.as_ref());
    config.fee_config.jito = strategy;
    Ok(())
}

/// Jito only runs on mainnet; returns whether a warning was logged
fn warn_if_jito_off_mainnet(jito: &FeeStrategy, rpc_config: Option<&RpcConfig>) -> bool {
    match rpc_config {
        Some(rpc_config) if *jito != FeeStrategy::Disabled && !rpc_config.is_mainnet() => {
            warn!(chain = rpc_config.chain_name(), "jito tips are only useful on solana mainnet");
            true
        }
        _ => false,
    }
}

/// Set the compute unit margin multiplier globally
///
/// The multiplier must be finite and at least 1.0 so the requested limit never
/// falls below the estimate.
pub fn set_compute_unit_margin_multiplier(multiplier: f64) -> Result<()> {
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(TransactionError::ConfigError(format!(
            "compute unit margin multiplier must be >= 1.0, got {multiplier}"
        )));
    }
    write_global_config()?.fee_config.compute_unit_margin_multiplier = multiplier;
    Ok(())
}

/// Set the Jito block engine URL globally
pub fn set_jito_block_engine_url(url: impl Into<String>) -> Result<()> {
    write_global_config()?.fee_config.jito_block_engine_url = url.into();
    Ok(())
}

/// Set the compute unit limit strategy globally
pub fn set_compute_unit_limit_strategy(strategy: ComputeUnitLimitStrategy) -> Result<()> {
    write_global_config()?.compute_config.unit_limit = strategy;
    Ok(())
}

/// Helper function to get RPC client from global config
pub fn get_rpc_client() -> Result<Arc<RpcClient>> {
    read_global_config()?.rpc_client()
}

/// Copy of the current global configuration.
///
/// The tip cache and RPC client are shared with the global instance.
pub fn get_global_config_snapshot() -> Result<GlobalConfig> {
    Ok(read_global_config()?.clone())
}

/// Resets the configuration to its default values, keeping the tip cache.
pub fn reset_configuration() -> Result<()> {
    let mut config = write_global_config()?;
    *config = GlobalConfig {
        tip_cache: config.tip_cache.clone(),
        ..GlobalConfig::default()
    };
    Ok(())
}
