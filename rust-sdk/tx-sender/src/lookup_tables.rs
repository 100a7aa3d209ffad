use crate::error::Result;
use futures::future::try_join_all;
use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_message::AddressLookupTableAccount;
use solana_pubkey::Pubkey;
use tracing::{debug, warn};

/// Fetch the given address lookup tables concurrently.
///
/// Tables that do not exist are skipped so callers may pass speculative
/// addresses. Accounts that exist but do not decode as a lookup table are
/// skipped with a warning. The result keeps the order of `addresses`.
pub async fn fetch_lookup_tables(
    rpc_client: &RpcClient,
    addresses: &[Pubkey],
) -> Result<Vec<AddressLookupTableAccount>> {
    if addresses.is_empty() {
        return Ok(Vec::new());
    }

    let responses = try_join_all(addresses.iter().map(|address| {
        rpc_client.get_account_with_commitment(address, CommitmentConfig::confirmed())
    }))
    .await?;

    let mut tables = Vec::with_capacity(addresses.len());
    for (address, response) in addresses.iter().zip(responses) {
        let Some(account) = response.value else {
            debug!(%address, "lookup table not found, skipping");
            continue;
        };
        match AddressLookupTable::deserialize(&account.data) {
            Ok(table) => tables.push(AddressLookupTableAccount {
                key: *address,
                addresses: table.addresses.to_vec(),
            }),
            Err(err) => warn!(%address, error = %err, "account is not a lookup table, skipping"),
        }
    }

    Ok(tables)
}
