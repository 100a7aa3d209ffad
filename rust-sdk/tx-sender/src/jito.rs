use crate::error::{Result, TransactionError};
use crate::fee_config::{FeeStrategy, Percentile};
use crate::message::TransactionDraft;
use rand::seq::SliceRandom;
use serde::Deserialize;
use solana_instruction::Instruction;
use solana_pubkey::{pubkey, Pubkey};
use solana_system_interface::instruction::transfer;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// How long a tip-floor quote is reused before refetching
pub const TIP_QUOTE_TTL_MS: u64 = 60_000;

const TIP_FLOOR_PATH: &str = "/api/v1/bundles/tip_floor";
const TIP_FLOOR_TIMEOUT: Duration = Duration::from_secs(5);
const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

// Jito tip receiver addresses
pub const JITO_TIP_ADDRESSES: [Pubkey; 8] = [
    pubkey!("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5"),
    pubkey!("HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe"),
    pubkey!("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY"),
    pubkey!("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49"),
    pubkey!("DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh"),
    pubkey!("ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt"),
    pubkey!("DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL"),
    pubkey!("3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT"),
];

/// Source of wall-clock time for the tip quote cache
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Represents a single entry in the Jito tip data response.
/// Values are denominated in SOL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JitoTipData {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub landed_tips_25th_percentile: Option<f64>,
    #[serde(default)]
    pub landed_tips_50th_percentile: Option<f64>,
    #[serde(default)]
    pub landed_tips_75th_percentile: Option<f64>,
    #[serde(default)]
    pub landed_tips_95th_percentile: Option<f64>,
    #[serde(default)]
    pub landed_tips_99th_percentile: Option<f64>,
    #[serde(default)]
    pub ema_landed_tips_50th_percentile: Option<f64>,
}

impl JitoTipData {
    /// Tip in lamports for `percentile`, or 0 when the field is missing
    pub fn lamports(&self, percentile: Percentile) -> u64 {
        let value = match percentile {
            Percentile::P25 => self.landed_tips_25th_percentile,
            Percentile::P50 => self.landed_tips_50th_percentile,
            Percentile::P50Ema => self.ema_landed_tips_50th_percentile,
            Percentile::P75 => self.landed_tips_75th_percentile,
            Percentile::P95 => self.landed_tips_95th_percentile,
            Percentile::P99 => self.landed_tips_99th_percentile,
        };
        match value {
            Some(sol) if sol.is_finite() && sol > 0.0 => (sol * LAMPORTS_PER_SOL).round() as u64,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedTipQuote {
    block_engine_url: String,
    quote: JitoTipData,
    fetched_at_millis: u64,
}

/// Process-wide cache of the latest tip-floor quote.
///
/// A read within [`TIP_QUOTE_TTL_MS`] of the last successful fetch from the
/// same block engine never touches the network. Failed fetches are not cached.
pub struct JitoTipCache {
    entry: Mutex<Option<CachedTipQuote>>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
}

impl fmt::Debug for JitoTipCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitoTipCache").finish_non_exhaustive()
    }
}

impl Default for JitoTipCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl JitoTipCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: Mutex::new(None),
            clock,
            http: reqwest::Client::new(),
        }
    }

    /// Return the cached quote, refetching when it is stale or missing.
    ///
    /// The lock is held across the fetch so concurrent callers wait for
    /// a single request instead of racing.
    pub async fn get_tip_quote(&self, block_engine_url: &str) -> Result<JitoTipData> {
        let mut entry = self.entry.lock().await;
        let now = self.clock.now_millis();

        if let Some(cached) = entry.as_ref() {
            let fresh = now.saturating_sub(cached.fetched_at_millis) < TIP_QUOTE_TTL_MS;
            if fresh && cached.block_engine_url == block_engine_url {
                return Ok(cached.quote.clone());
            }
        }

        let quote = self.fetch_tip_quote(block_engine_url).await?;
        *entry = Some(CachedTipQuote {
            block_engine_url: block_engine_url.to_string(),
            quote: quote.clone(),
            fetched_at_millis: now,
        });
        Ok(quote)
    }

    async fn fetch_tip_quote(&self, block_engine_url: &str) -> Result<JitoTipData> {
        let url = format!(
            "{}{}",
            block_engine_url.trim_end_matches('/'),
            TIP_FLOOR_PATH
        );
        debug!(%url, "fetching jito tip floor");

        let response = self
            .http
            .get(&url)
            .timeout(TIP_FLOOR_TIMEOUT)
            .send()
            .await
            .map_err(|e| TransactionError::TipFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransactionError::TipFetchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let tip_data: Vec<JitoTipData> = response
            .json()
            .await
            .map_err(|e| TransactionError::TipFetchFailed(e.to_string()))?;

        Ok(tip_data.into_iter().next().unwrap_or_default())
    }
}

/// Create a Jito tip instruction to a randomly chosen tip account
pub fn create_tip_instruction(lamports: u64, payer: &Pubkey) -> Instruction {
    let tip_account = JITO_TIP_ADDRESSES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(JITO_TIP_ADDRESSES[0]);
    transfer(payer, &tip_account, lamports)
}

/// Calculate the tip in lamports for `strategy`.
///
/// Quote failures degrade to a zero tip.
pub async fn calculate_jito_tip(
    strategy: &FeeStrategy,
    block_engine_url: &str,
    cache: &JitoTipCache,
) -> u64 {
    match strategy {
        FeeStrategy::Disabled => 0,
        FeeStrategy::Exact(lamports) => *lamports,
        FeeStrategy::Dynamic {
            percentile,
            max_lamports,
        } => {
            let tip = match cache.get_tip_quote(block_engine_url).await {
                Ok(quote) => quote.lamports(*percentile),
                Err(err) => {
                    warn!(error = %err, "jito tip unavailable, continuing without tip");
                    0
                }
            };
            max_lamports.map_or(tip, |max| tip.min(max))
        }
    }
}

/// Prepend a tip transfer when `lamports` is nonzero
pub fn add_jito_tip_instruction(draft: TransactionDraft, lamports: u64) -> TransactionDraft {
    if lamports == 0 {
        return draft;
    }
    let payer = *draft.payer();
    draft.prepend_instruction(create_tip_instruction(lamports, &payer))
}
