use crate::error::{Result, TransactionError};
use crate::fee_config::Percentile;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_client::rpc_request::RpcRequest;
use solana_client::rpc_response::RpcPrioritizationFee;
use solana_commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

/// Outcome of a single signature status lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Unknown to the node or below the requested commitment
    Pending,
    Confirmed,
    /// Landed with an execution error
    Failed(String),
}

/// Latest blockhash and its last valid block height at `confirmed` commitment
pub async fn get_latest_blockhash(rpc_client: &RpcClient) -> Result<(Hash, u64)> {
    let (blockhash, last_valid_block_height) = rpc_client
        .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
        .await?;
    Ok((blockhash, last_valid_block_height))
}

/// Simulate `transaction` and return the compute units it consumed.
///
/// Signatures are not verified and the blockhash is replaced by the node, so
/// an unsigned transaction can be simulated.
pub async fn simulate_units_consumed(
    rpc_client: &RpcClient,
    transaction: &VersionedTransaction,
) -> Result<u64> {
    let config = RpcSimulateTransactionConfig {
        sig_verify: false,
        replace_recent_blockhash: true,
        commitment: Some(CommitmentConfig::confirmed()),
        ..RpcSimulateTransactionConfig::default()
    };
    let response = rpc_client
        .simulate_transaction_with_config(transaction, config)
        .await
        .map_err(|e| TransactionError::SimulationFailed(e.to_string()))?;

    if let Some(err) = response.value.err {
        return Err(TransactionError::SimulationFailed(format!("{err:?}")));
    }

    response.value.units_consumed.ok_or_else(|| {
        TransactionError::SimulationFailed("node did not report units consumed".to_string())
    })
}

/// Raw per-slot prioritization fees for transactions locking `writable_accounts`
pub async fn get_recent_prioritization_fees(
    rpc_client: &RpcClient,
    writable_accounts: &[Pubkey],
) -> Result<Vec<u64>> {
    let fees = rpc_client
        .get_recent_prioritization_fees(writable_accounts)
        .await?;
    Ok(fees.into_iter().map(|fee| fee.prioritization_fee).collect())
}

/// Prioritization fee computed by the node at `percentile`.
///
/// Uses the `percentile` extension of `getRecentPrioritizationFees` (expressed
/// in hundredths of a percent). The node answers per slot; the most recent
/// slot's value is returned, or 0 when the node has no data.
pub async fn get_recent_prioritization_fee_percentile(
    rpc_client: &RpcClient,
    writable_accounts: &[Pubkey],
    percentile: Percentile,
) -> Result<u64> {
    let params = json!([{
        "lockedWritableAccounts": writable_accounts
            .iter()
            .map(|account| account.to_string())
            .collect::<Vec<_>>(),
        "percentile": u16::from(percentile.as_value()) * 100,
    }]);
    let fees: Vec<RpcPrioritizationFee> = rpc_client
        .send(
            RpcRequest::Custom {
                method: "getRecentPrioritizationFees",
            },
            params,
        )
        .await?;

    Ok(fees
        .into_iter()
        .max_by_key(|fee| fee.slot)
        .map(|fee| fee.prioritization_fee)
        .unwrap_or(0))
}

/// Submit `transaction` as base64 wire bytes
pub async fn send_raw_transaction(
    rpc_client: &RpcClient,
    transaction: &VersionedTransaction,
    skip_preflight: bool,
    preflight_commitment: CommitmentLevel,
    max_retries: Option<usize>,
) -> Result<Signature> {
    // The client encodes base64 unless told otherwise
    let config = RpcSendTransactionConfig {
        skip_preflight,
        preflight_commitment: Some(preflight_commitment),
        max_retries,
        ..RpcSendTransactionConfig::default()
    };
    let signature = rpc_client
        .send_transaction_with_config(transaction, config)
        .await?;
    Ok(signature)
}

pub async fn get_signature_status(
    rpc_client: &RpcClient,
    signature: &Signature,
    commitment: CommitmentConfig,
) -> Result<SignatureStatus> {
    let response = rpc_client.get_signature_statuses(&[*signature]).await?;
    let Some(status) = response.value.into_iter().next().flatten() else {
        return Ok(SignatureStatus::Pending);
    };

    if let Some(err) = &status.err {
        return Ok(SignatureStatus::Failed(format!("{err:?}")));
    }
    if status.satisfies_commitment(commitment) {
        Ok(SignatureStatus::Confirmed)
    } else {
        Ok(SignatureStatus::Pending)
    }
}
