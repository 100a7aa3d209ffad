use serde::{Deserialize, Serialize};

/// Network maximum compute units per transaction
pub const MAX_COMPUTE_UNITS: u32 = 1_400_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeUnitLimitStrategy {
    /// Simulate the transaction and apply the margin multiplier
    #[default]
    Dynamic,
    /// Use this limit as-is, skipping simulation
    Exact(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    #[serde(default)]
    pub unit_limit: ComputeUnitLimitStrategy,
}
