#![allow(dead_code)]
use solana_cli_config::Config;
use solana_instruction::{AccountMeta, Instruction};
use solana_keypair::{read_keypair_file, Keypair};
use solana_pubkey::{pubkey, Pubkey};
use std::error::Error;
use tracing_subscriber::EnvFilter;

pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Log pipeline decisions, `RUST_LOG=solana_tx_pipeline=debug` for details
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Load the keypair configured for the Solana CLI
pub fn load_keypair_from_config() -> Result<Keypair, Box<dyn Error>> {
    let config_file = solana_cli_config::CONFIG_FILE
        .as_ref()
        .ok_or("Failed to find Solana CLI config file")?;
    let cli_config = Config::load(config_file)?;

    let keypair_path = cli_config.keypair_path;
    println!("Loading keypair from CLI config: {}", keypair_path);
    let keypair = read_keypair_file(&keypair_path)
        .map_err(|e| format!("Failed to read keypair at {}: {}", keypair_path, e))?;

    Ok(keypair)
}

pub fn create_memo_instruction(signer: &Pubkey, memo: &str) -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![AccountMeta::new_readonly(*signer, true)],
        data: memo.as_bytes().to_vec(),
    }
}
