use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_system_interface::instruction::transfer;
use solana_tx_pipeline::{
    build_and_send_transaction, get_global_config_snapshot, set_jito_fee_strategy,
    set_priority_fee_strategy, set_rpc, ConfirmationStrategy, FeeStrategy, Percentile,
    RpcOptions, SendOptions, TransactionSigner,
};
use std::env;
use std::error::Error;
use std::time::Instant;

mod util;

/// Send 0.001 SOL to yourself with a dynamic priority fee.
///
/// Usage: `cargo run --example priority_fee_transfer [rpc_url]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    util::init_tracing();

    let payer = util::load_keypair_from_config()?;
    let rpc_url = env::args()
        .nth(1)
        .unwrap_or_else(|| "https://api.devnet.solana.com".to_string());

    set_rpc(&rpc_url, RpcOptions::default()).await?;
    let config = get_global_config_snapshot()?;
    let rpc_config = config.rpc_config()?;
    println!("Connected to {} ({})", rpc_url, rpc_config.chain_name());

    let balance = config.rpc_client()?.get_balance(&payer.pubkey()).await?;
    println!("Payer {} holds {} lamports", payer.pubkey(), balance);
    if balance == 0 {
        println!("Fund the payer before running this example");
        return Ok(());
    }

    set_priority_fee_strategy(FeeStrategy::Dynamic {
        percentile: Percentile::P75,
        max_lamports: Some(100_000),
    })?;
    if rpc_config.is_mainnet() {
        set_jito_fee_strategy(FeeStrategy::Dynamic {
            percentile: Percentile::P50Ema,
            max_lamports: Some(50_000),
        })?;
    }

    let recipient: Pubkey = payer.pubkey();
    let instructions = vec![
        transfer(&payer.pubkey(), &recipient, 1_000_000),
        util::create_memo_instruction(&payer.pubkey(), "priority fee transfer"),
    ];
    let options = SendOptions {
        confirmation: ConfirmationStrategy::Subscribe {
            websocket_url: None,
        },
        ..SendOptions::default()
    };

    let start = Instant::now();
    let signature = build_and_send_transaction(
        instructions,
        &[TransactionSigner::from(&payer)],
        &[],
        Some(options),
    )
    .await?;

    println!(
        "Transaction {} confirmed in {:?}",
        signature,
        start.elapsed()
    );
    Ok(())
}
