use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_tx_pipeline::{
    build_transaction, fetch_lookup_tables, get_rpc_client, is_fully_signed, send_transaction,
    set_compute_unit_margin_multiplier, set_priority_fee_strategy, set_rpc, FeeStrategy,
    RpcOptions, SendOptions, TransactionSigner,
};
use std::env;
use std::error::Error;
use std::str::FromStr;

mod util;

/// Build a v0 transaction that references address lookup tables.
///
/// Usage: `cargo run --example with_lookup_tables <rpc_url> <table> [table...]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    util::init_tracing();

    let mut args = env::args().skip(1);
    let rpc_url = args
        .next()
        .unwrap_or_else(|| "https://api.mainnet-beta.solana.com".to_string());
    let table_addresses = args
        .map(|arg| Pubkey::from_str(&arg))
        .collect::<Result<Vec<_>, _>>()?;

    let payer = util::load_keypair_from_config()?;
    set_rpc(
        &rpc_url,
        RpcOptions {
            resend_on_poll: true,
            ..RpcOptions::default()
        },
    )
    .await?;
    set_priority_fee_strategy(FeeStrategy::Exact(5_000))?;
    set_compute_unit_margin_multiplier(1.2)?;

    let rpc_client = get_rpc_client()?;
    for table in fetch_lookup_tables(&rpc_client, &table_addresses).await? {
        println!("Table {} holds {} addresses", table.key, table.addresses.len());
    }

    let memo = util::create_memo_instruction(&payer.pubkey(), "hello from a v0 transaction");
    let transaction = build_transaction(
        vec![memo],
        &[TransactionSigner::from(&payer)],
        &table_addresses,
    )
    .await?;

    let lookups = transaction
        .message
        .address_table_lookups()
        .map_or(0, |lookups| lookups.len());
    println!(
        "Built transaction with {} static accounts and {} table lookups",
        transaction.message.static_account_keys().len(),
        lookups
    );
    if !is_fully_signed(&transaction) {
        return Err("payer must be the only required signer".into());
    }

    let signature = send_transaction(&transaction, Some(SendOptions::default())).await?;
    println!("Transaction confirmed: {}", signature);
    Ok(())
}
