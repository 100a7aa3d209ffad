use serde::{Deserialize, Serialize};

/// Default Jito block engine used for tip-floor quotes
pub const DEFAULT_JITO_BLOCK_ENGINE_URL: &str = "https://bundles.jito.wtf";

/// Default multiplier applied to the estimated compute units
pub const DEFAULT_COMPUTE_UNIT_MARGIN_MULTIPLIER: f64 = 1.1;

/// Percentile of recent fees (or landed tips) to target.
///
/// Shared by the priority fee and Jito tip estimators. `P50Ema` is only
/// backed by data on the tip side; the priority fee estimator treats it as `P50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Percentile {
    P25,
    P50,
    P50Ema, // 50th percentile exponential moving average
    P75,
    P95,
    P99,
}

impl Percentile {
    pub fn as_value(&self) -> u8 {
        match self {
            Self::P25 => 25,
            Self::P50 | Self::P50Ema => 50,
            Self::P75 => 75,
            Self::P95 => 95,
            Self::P99 => 99,
        }
    }

    /// Select this percentile from values sorted in ascending order.
    ///
    /// The median averages the two middle values when the length is even.
    /// Other percentiles take the value at `floor(len * p / 100)`, clamped to
    /// the last element. Returns 0 for an empty slice.
    pub fn select(&self, sorted: &[u64]) -> u64 {
        if sorted.is_empty() {
            return 0;
        }
        let len = sorted.len();
        if self.as_value() == 50 {
            let mid = len / 2;
            if len % 2 == 0 {
                // Average without overflowing on large fees
                let (low, high) = (sorted[mid - 1], sorted[mid]);
                return low / 2 + high / 2 + (low % 2 + high % 2) / 2;
            }
            return sorted[mid];
        }
        let index = len * self.as_value() as usize / 100;
        sorted[index.min(len - 1)]
    }
}

/// Drop zero entries, sort ascending and select `percentile`.
pub fn select_nonzero_percentile(
    values: impl IntoIterator<Item = u64>,
    percentile: Percentile,
) -> u64 {
    let mut non_zero: Vec<u64> = values.into_iter().filter(|value| *value > 0).collect();
    non_zero.sort_unstable();
    percentile.select(&non_zero)
}

/// How a fee (priority fee or Jito tip) is determined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStrategy {
    /// Estimate from recent network data, optionally capped at `max_lamports`
    /// for the whole transaction.
    Dynamic {
        percentile: Percentile,
        #[serde(default)]
        max_lamports: Option<u64>,
    },
    /// Pay exactly this many lamports.
    Exact(u64),
    #[default]
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    #[serde(default)]
    pub priority_fee: FeeStrategy,
    #[serde(default)]
    pub jito: FeeStrategy,
    #[serde(default = "default_compute_unit_margin_multiplier")]
    pub compute_unit_margin_multiplier: f64,
    #[serde(default = "default_jito_block_engine_url")]
    pub jito_block_engine_url: String,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            priority_fee: FeeStrategy::Disabled,
            jito: FeeStrategy::Disabled,
            compute_unit_margin_multiplier: DEFAULT_COMPUTE_UNIT_MARGIN_MULTIPLIER,
            jito_block_engine_url: DEFAULT_JITO_BLOCK_ENGINE_URL.to_string(),
        }
    }
}

fn default_compute_unit_margin_multiplier() -> f64 {
    DEFAULT_COMPUTE_UNIT_MARGIN_MULTIPLIER
}

fn default_jito_block_engine_url() -> String {
    DEFAULT_JITO_BLOCK_ENGINE_URL.to_string()
}
