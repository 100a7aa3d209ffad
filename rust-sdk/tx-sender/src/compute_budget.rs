use crate::compute_config::{ComputeConfig, ComputeUnitLimitStrategy, MAX_COMPUTE_UNITS};
use crate::error::Result;
use crate::fee_config::{select_nonzero_percentile, FeeStrategy, Percentile};
use crate::message::TransactionDraft;
use crate::rpc;
use crate::rpc_config::RpcConfig;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Micro-lamports per lamport, the unit of the compute unit price
pub const MICRO_LAMPORTS_PER_LAMPORT: u64 = 1_000_000;

/// Most accounts `getRecentPrioritizationFees` accepts in one request
pub const MAX_PRIORITY_FEE_ACCOUNTS: usize = 128;

/// Estimate the compute units `draft` consumes.
///
/// The draft must not yet contain compute budget instructions. A failed
/// simulation never fails the build: the network maximum is used instead.
pub async fn estimate_compute_units(
    rpc_client: &RpcClient,
    draft: &TransactionDraft,
    compute_config: &ComputeConfig,
) -> u32 {
    if let ComputeUnitLimitStrategy::Exact(units) = compute_config.unit_limit {
        return units;
    }

    let simulated = match draft.to_unsigned_transaction() {
        Ok(transaction) => rpc::simulate_units_consumed(rpc_client, &transaction).await,
        Err(err) => Err(err),
    };

    match simulated {
        Ok(units) => {
            debug!(units, "simulated compute units");
            u32::try_from(units).unwrap_or(MAX_COMPUTE_UNITS)
        }
        Err(err) => {
            warn!(
                error = %err,
                fallback = MAX_COMPUTE_UNITS,
                "compute unit simulation failed, using network maximum"
            );
            MAX_COMPUTE_UNITS
        }
    }
}

/// `ceil(units * margin)`, ignoring rounding error just above a whole number
pub fn compute_unit_limit_with_margin(units: u32, margin: f64) -> u32 {
    let scaled = f64::from(units) * margin.max(1.0);
    let nearest = scaled.round();
    // 200_000 * 1.1 evaluates to 220_000.00000000003
    let limit = if scaled > nearest && scaled - nearest <= nearest * 1e-12 {
        nearest
    } else {
        scaled.ceil()
    };
    if limit >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        limit as u32
    }
}

/// The limit to request: exact limits are used as-is, estimates get the margin
pub fn compute_unit_limit(units: u32, margin: f64, compute_config: &ComputeConfig) -> u32 {
    match compute_config.unit_limit {
        ComputeUnitLimitStrategy::Exact(units) => units,
        ComputeUnitLimitStrategy::Dynamic => compute_unit_limit_with_margin(units, margin),
    }
}

/// Convert a whole-transaction fee into a price per compute unit
pub fn lamports_to_micro_lamports_per_unit(lamports: u64, compute_units: u32) -> u64 {
    let micro_lamports = u128::from(lamports) * u128::from(MICRO_LAMPORTS_PER_LAMPORT);
    let price = micro_lamports / u128::from(compute_units.max(1));
    u64::try_from(price).unwrap_or(u64::MAX)
}

/// Calculate the compute unit price in micro-lamports.
///
/// `compute_units` must already be estimated: exact fees and caps are spread
/// over it.
pub async fn calculate_priority_fee(
    rpc_client: &RpcClient,
    rpc_config: &RpcConfig,
    strategy: &FeeStrategy,
    writable_accounts: &[Pubkey],
    compute_units: u32,
) -> Result<u64> {
    match strategy {
        FeeStrategy::Disabled => Ok(0),
        FeeStrategy::Exact(lamports) => {
            Ok(lamports_to_micro_lamports_per_unit(*lamports, compute_units))
        }
        FeeStrategy::Dynamic {
            percentile,
            max_lamports,
        } => {
            let fee = calculate_dynamic_priority_fee(
                rpc_client,
                rpc_config,
                writable_accounts,
                *percentile,
            )
            .await?;
            let capped = match max_lamports {
                Some(max) => fee.min(lamports_to_micro_lamports_per_unit(*max, compute_units)),
                None => fee,
            };
            debug!(fee, capped, "dynamic priority fee");
            Ok(capped)
        }
    }
}

/// Calculate dynamic priority fee based on recent fees
async fn calculate_dynamic_priority_fee(
    rpc_client: &RpcClient,
    rpc_config: &RpcConfig,
    writable_accounts: &[Pubkey],
    percentile: Percentile,
) -> Result<u64> {
    if rpc_config.supports_priority_fee_percentile {
        rpc::get_recent_prioritization_fee_percentile(rpc_client, writable_accounts, percentile)
            .await
    } else {
        let recent_fees = rpc::get_recent_prioritization_fees(rpc_client, writable_accounts).await?;
        Ok(select_nonzero_percentile(recent_fees, percentile))
    }
}

/// Writable accounts of `instructions`, deduplicated and ordered
pub fn get_writable_accounts(instructions: &[Instruction]) -> Vec<Pubkey> {
    instructions
        .iter()
        .flat_map(|ix| ix.accounts.iter())
        .filter(|meta| meta.is_writable)
        .map(|meta| meta.pubkey)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_PRIORITY_FEE_ACCOUNTS)
        .collect()
}

/// Prepend the compute unit price (when nonzero) and then the limit, so the
/// limit ends up first.
pub fn add_compute_budget_instructions(
    draft: TransactionDraft,
    compute_unit_limit: u32,
    compute_unit_price: u64,
) -> TransactionDraft {
    let draft = if compute_unit_price > 0 {
        draft.prepend_instruction(ComputeBudgetInstruction::set_compute_unit_price(
            compute_unit_price,
        ))
    } else {
        draft
    };
    draft.prepend_instruction(ComputeBudgetInstruction::set_compute_unit_limit(
        compute_unit_limit,
    ))
}
