mod compute_budget;
mod compute_config;
mod config;
mod confirmation;
mod error;
mod fee_config;
mod jito;
mod lookup_tables;
mod message;
mod rpc;
mod rpc_config;
mod signer;
mod tx_config;

#[cfg(test)]
mod tests;

// Re-export public types with wildcards
pub use compute_budget::*;
pub use compute_config::*;
pub use config::*;
pub use confirmation::*;
pub use error::*;
pub use fee_config::*;
pub use jito::*;
pub use lookup_tables::*;
pub use message::*;
pub use rpc::*;
pub use rpc_config::*;
pub use signer::*;
pub use tx_config::*;

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use tracing::{debug, instrument};

/// Build a signed transaction using the global configuration
///
/// See [`build_transaction_with_config`].
pub async fn build_transaction(
    instructions: Vec<Instruction>,
    signers: &[TransactionSigner<'_>],
    lookup_table_addresses: &[Pubkey],
) -> Result<VersionedTransaction> {
    let config = get_global_config_snapshot()?;
    build_transaction_with_config(instructions, signers, lookup_table_addresses, &config).await
}

/// Build a transaction with compute budget, priority fee and Jito tip
///
/// The first signer pays. The resulting instruction order is
/// `[compute unit limit, compute unit price?, jito tip?, ...instructions]`.
/// Signers without signing material leave their slot empty, so the result
/// may be partially signed.
#[instrument(skip_all, fields(instructions = instructions.len(), signers = signers.len()))]
pub async fn build_transaction_with_config(
    instructions: Vec<Instruction>,
    signers: &[TransactionSigner<'_>],
    lookup_table_addresses: &[Pubkey],
    config: &GlobalConfig,
) -> Result<VersionedTransaction> {
    let payer = signers
        .first()
        .ok_or_else(|| {
            TransactionError::InvalidTransaction("At least one signer is required".to_string())
        })?
        .pubkey();
    let rpc_client = config.rpc_client()?;
    let rpc_config = config.rpc_config()?;
    let fee_config = &config.fee_config;

    let ((recent_blockhash, last_valid_block_height), lookup_tables) = tokio::try_join!(
        rpc::get_latest_blockhash(&rpc_client),
        lookup_tables::fetch_lookup_tables(&rpc_client, lookup_table_addresses),
    )?;
    debug!(%recent_blockhash, last_valid_block_height, tables = lookup_tables.len(), "fetched");

    let writable_accounts = compute_budget::get_writable_accounts(&instructions);
    let draft = TransactionDraft::new(payer, instructions, recent_blockhash)
        .with_last_valid_block_height(last_valid_block_height)
        .with_lookup_tables(lookup_tables);

    let estimated_units =
        compute_budget::estimate_compute_units(&rpc_client, &draft, &config.compute_config).await;
    let compute_unit_price = compute_budget::calculate_priority_fee(
        &rpc_client,
        rpc_config,
        &fee_config.priority_fee,
        &writable_accounts,
        estimated_units,
    )
    .await?;
    let tip = jito::calculate_jito_tip(
        &fee_config.jito,
        &fee_config.jito_block_engine_url,
        &config.tip_cache,
    )
    .await;
    let compute_unit_limit = compute_budget::compute_unit_limit(
        estimated_units,
        fee_config.compute_unit_margin_multiplier,
        &config.compute_config,
    );
    debug!(
        estimated_units,
        compute_unit_limit, compute_unit_price, tip, "transaction fees"
    );

    // Each prepend lands in front of the previous one
    let draft = jito::add_jito_tip_instruction(draft, tip);
    let draft = compute_budget::add_compute_budget_instructions(
        draft,
        compute_unit_limit,
        compute_unit_price,
    );

    signer::sign_with_available_signers(draft.compile()?, signers)
}

/// Send a fully signed transaction using the global configuration
pub async fn send_transaction(
    transaction: &VersionedTransaction,
    options: Option<SendOptions>,
) -> Result<Signature> {
    let config = get_global_config_snapshot()?;
    send_transaction_with_config(transaction, &options.unwrap_or_default(), &config).await
}

/// Send a fully signed transaction and wait per `options.confirmation`
///
/// Partially signed transactions are rejected before anything is sent.
#[instrument(skip_all, fields(signature = tracing::field::Empty))]
pub async fn send_transaction_with_config(
    transaction: &VersionedTransaction,
    options: &SendOptions,
    config: &GlobalConfig,
) -> Result<Signature> {
    if !signer::is_fully_signed(transaction) {
        return Err(TransactionError::InvalidTransaction(
            "Transaction is missing signatures".to_string(),
        ));
    }
    let rpc_client = config.rpc_client()?;
    let rpc_config = config.rpc_config()?;

    let signature = rpc::send_raw_transaction(
        &rpc_client,
        transaction,
        options.skip_preflight,
        options.commitment,
        options.max_retries,
    )
    .await?;
    tracing::Span::current().record("signature", tracing::field::display(&signature));
    debug!("transaction sent");

    match &options.confirmation {
        ConfirmationStrategy::None => {}
        ConfirmationStrategy::Poll => {
            confirmation::poll_for_confirmation(
                &rpc_client,
                rpc_config,
                transaction,
                &signature,
                options,
            )
            .await?;
        }
        ConfirmationStrategy::Subscribe { websocket_url } => {
            let websocket_url = websocket_url
                .clone()
                .unwrap_or_else(|| rpc_config.websocket_url());
            confirmation::subscribe_for_confirmation(
                &rpc_client,
                &websocket_url,
                &signature,
                options,
            )
            .await?;
        }
    }

    debug!(commitment = ?options.commitment, "transaction confirmed");
    Ok(signature)
}

/// Build, sign and send a transaction using the global configuration
///
/// Every signer must hold signing material, otherwise the send is rejected.
pub async fn build_and_send_transaction(
    instructions: Vec<Instruction>,
    signers: &[TransactionSigner<'_>],
    lookup_table_addresses: &[Pubkey],
    options: Option<SendOptions>,
) -> Result<Signature> {
    let config = get_global_config_snapshot()?;
    build_and_send_transaction_with_config(
        instructions,
        signers,
        lookup_table_addresses,
        &options.unwrap_or_default(),
        &config,
    )
    .await
}

pub async fn build_and_send_transaction_with_config(
    instructions: Vec<Instruction>,
    signers: &[TransactionSigner<'_>],
    lookup_table_addresses: &[Pubkey],
    options: &SendOptions,
    config: &GlobalConfig,
) -> Result<Signature> {
    let transaction =
        build_transaction_with_config(instructions, signers, lookup_table_addresses, config)
            .await?;
    send_transaction_with_config(&transaction, options, config).await
}
