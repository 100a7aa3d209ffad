use super::rpc::{mock_blockhash, MockRpc, MockState};
use crate::jito::tests::TIP_FLOOR_BODY;
use crate::{
    build_transaction, build_transaction_with_config, get_global_config_snapshot,
    is_fully_signed, reset_configuration, set_priority_fee_strategy, set_rpc_client, ChainId,
    ComputeUnitLimitStrategy, FeeStrategy, GlobalConfig, Percentile, RpcOptions,
    TransactionError, TransactionSigner, JITO_TIP_ADDRESSES,
};
use serial_test::serial;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_system_interface::instruction::transfer;
use solana_transaction::versioned::VersionedTransaction;

type InstructionParts = (Pubkey, Vec<Pubkey>, Vec<u8>);

fn parts(instruction: &Instruction) -> InstructionParts {
    (
        instruction.program_id,
        instruction.accounts.iter().map(|meta| meta.pubkey).collect(),
        instruction.data.clone(),
    )
}

// Only valid for messages without lookup tables
fn decompile(transaction: &VersionedTransaction) -> Vec<InstructionParts> {
    let keys = transaction.message.static_account_keys();
    transaction
        .message
        .instructions()
        .iter()
        .map(|ix| {
            (
                keys[ix.program_id_index as usize],
                ix.accounts.iter().map(|i| keys[*i as usize]).collect(),
                ix.data.clone(),
            )
        })
        .collect()
}

async fn tip_floor_server(status: usize, hits: usize) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/bundles/tip_floor")
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(TIP_FLOOR_BODY)
        .expect(hits)
        .create_async()
        .await;
    (server, mock)
}

async fn build(
    config: &GlobalConfig,
    payer: &Keypair,
    instructions: Vec<Instruction>,
) -> VersionedTransaction {
    build_transaction_with_config(instructions, &[TransactionSigner::from(payer)], &[], config)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_build_transaction_instruction_order() {
    let (server, tip_mock) = tip_floor_server(200, 1).await;
    let mock = MockRpc::new(MockState::default());
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.priority_fee = FeeStrategy::Exact(1_000);
    config.fee_config.jito = FeeStrategy::Dynamic {
        percentile: Percentile::P50,
        max_lamports: None,
    };
    config.fee_config.jito_block_engine_url = server.url();

    let payer = Keypair::new();
    let caller = transfer(&payer.pubkey(), &Pubkey::new_unique(), 5_000);
    let transaction = build(&config, &payer, vec![caller.clone()]).await;

    let instructions = decompile(&transaction);
    assert_eq!(instructions.len(), 4);
    assert_eq!(
        instructions[0],
        parts(&ComputeBudgetInstruction::set_compute_unit_limit(220_000))
    );
    // 1_000 lamports over 200_000 units
    assert_eq!(
        instructions[1],
        parts(&ComputeBudgetInstruction::set_compute_unit_price(5_000))
    );
    let tip_account = instructions[2].1[1];
    assert!(JITO_TIP_ADDRESSES.contains(&tip_account));
    assert_eq!(
        instructions[2],
        parts(&transfer(&payer.pubkey(), &tip_account, 20_000))
    );
    assert_eq!(instructions[3], parts(&caller));

    assert!(is_fully_signed(&transaction));
    assert_eq!(transaction.message.recent_blockhash(), &mock_blockhash());
    tip_mock.assert_async().await;
}

#[tokio::test]
async fn test_caller_instructions_are_kept_in_order() {
    let mock = MockRpc::new(MockState::default());
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.priority_fee = FeeStrategy::Exact(400);

    let payer = Keypair::new();
    let callers: Vec<Instruction> = (1..=3)
        .map(|lamports| transfer(&payer.pubkey(), &Pubkey::new_unique(), lamports))
        .collect();
    let transaction = build(&config, &payer, callers.clone()).await;

    let instructions = decompile(&transaction);
    assert_eq!(instructions.len(), 2 + callers.len());
    let tail: Vec<InstructionParts> = callers.iter().map(parts).collect();
    assert_eq!(&instructions[2..], tail.as_slice());
}

#[tokio::test]
async fn test_simulation_failure_uses_network_maximum() {
    let mock = MockRpc::new(MockState {
        units_consumed: None,
        ..MockState::default()
    });
    let config = mock.config(RpcOptions::default());

    let payer = Keypair::new();
    let caller = transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
    let transaction = build(&config, &payer, vec![caller.clone()]).await;

    // ceil(1_400_000 * 1.1), no price instruction when fees are disabled
    assert_eq!(
        decompile(&transaction),
        vec![
            parts(&ComputeBudgetInstruction::set_compute_unit_limit(1_540_000)),
            parts(&caller),
        ]
    );
    assert_eq!(mock.snapshot().called("simulateTransaction"), 1);
}

#[tokio::test]
async fn test_exact_compute_unit_limit_skips_simulation() {
    let mock = MockRpc::new(MockState::default());
    let mut config = mock.config(RpcOptions::default());
    config.compute_config.unit_limit = ComputeUnitLimitStrategy::Exact(50_000);

    let payer = Keypair::new();
    let caller = transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
    let transaction = build(&config, &payer, vec![caller]).await;

    assert_eq!(
        decompile(&transaction)[0],
        parts(&ComputeBudgetInstruction::set_compute_unit_limit(50_000))
    );
    assert_eq!(mock.snapshot().called("simulateTransaction"), 0);
}

#[tokio::test]
async fn test_dynamic_priority_fee_from_percentile_rpc() {
    let mock = MockRpc::new(MockState {
        percentile_fees: vec![(10, 3_000), (12, 7_000), (11, 5_000)],
        ..MockState::default()
    });
    let mut config = mock.config(RpcOptions {
        supports_priority_fee_percentile: true,
        ..RpcOptions::default()
    });
    config.fee_config.priority_fee = FeeStrategy::Dynamic {
        percentile: Percentile::P75,
        max_lamports: None,
    };

    let payer = Keypair::new();
    let recipient = Pubkey::new_unique();
    let transaction = build(&config, &payer, vec![transfer(&payer.pubkey(), &recipient, 1)]).await;

    // Latest slot wins
    assert_eq!(
        decompile(&transaction)[1],
        parts(&ComputeBudgetInstruction::set_compute_unit_price(7_000))
    );

    let state = mock.snapshot();
    assert_eq!(state.called("getRecentPrioritizationFees"), 1);
    let params = &state.fee_params[0];
    assert_eq!(params["percentile"], 7_500);
    let accounts = params["lockedWritableAccounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(accounts.contains(&payer.pubkey().to_string().into()));
    assert!(accounts.contains(&recipient.to_string().into()));
}

#[tokio::test]
async fn test_dynamic_priority_fee_ignores_zero_fees() {
    let mock = MockRpc::new(MockState {
        recent_fees: vec![(1, 0), (2, 0), (3, 100), (4, 300), (5, 200)],
        ..MockState::default()
    });
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.priority_fee = FeeStrategy::Dynamic {
        percentile: Percentile::P50,
        max_lamports: None,
    };

    let payer = Keypair::new();
    let transaction = build(
        &config,
        &payer,
        vec![transfer(&payer.pubkey(), &Pubkey::new_unique(), 1)],
    )
    .await;

    assert_eq!(
        decompile(&transaction)[1],
        parts(&ComputeBudgetInstruction::set_compute_unit_price(200))
    );
}

#[tokio::test]
async fn test_dynamic_priority_fee_is_capped() {
    let mock = MockRpc::new(MockState {
        recent_fees: vec![(1, 1_000_000)],
        ..MockState::default()
    });
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.priority_fee = FeeStrategy::Dynamic {
        percentile: Percentile::P99,
        max_lamports: Some(1),
    };

    let payer = Keypair::new();
    let transaction = build(
        &config,
        &payer,
        vec![transfer(&payer.pubkey(), &Pubkey::new_unique(), 1)],
    )
    .await;

    // 1 lamport spread over 200_000 units
    assert_eq!(
        decompile(&transaction)[1],
        parts(&ComputeBudgetInstruction::set_compute_unit_price(5))
    );
}

#[tokio::test]
async fn test_tip_failure_builds_without_tip() {
    let (server, tip_mock) = tip_floor_server(503, 1).await;
    let mock = MockRpc::new(MockState::default());
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.jito = FeeStrategy::Dynamic {
        percentile: Percentile::P50,
        max_lamports: None,
    };
    config.fee_config.jito_block_engine_url = server.url();

    let payer = Keypair::new();
    let caller = transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
    let transaction = build(&config, &payer, vec![caller.clone()]).await;

    assert_eq!(
        decompile(&transaction),
        vec![
            parts(&ComputeBudgetInstruction::set_compute_unit_limit(220_000)),
            parts(&caller),
        ]
    );
    tip_mock.assert_async().await;
}

#[tokio::test]
async fn test_tip_quote_is_shared_between_builds() {
    let (server, tip_mock) = tip_floor_server(200, 1).await;
    let mock = MockRpc::new(MockState::default());
    let mut config = mock.config(RpcOptions::default());
    config.fee_config.jito = FeeStrategy::Dynamic {
        percentile: Percentile::P99,
        max_lamports: Some(50_000),
    };
    config.fee_config.jito_block_engine_url = server.url();

    let payer = Keypair::new();
    for _ in 0..2 {
        let transaction = build(
            &config,
            &payer,
            vec![transfer(&payer.pubkey(), &Pubkey::new_unique(), 1)],
        )
        .await;
        let tip = &decompile(&transaction)[1];
        assert_eq!(tip, &parts(&transfer(&payer.pubkey(), &tip.1[1], 50_000)));
    }
    tip_mock.assert_async().await;
}

#[tokio::test]
async fn test_lookup_tables_compress_accounts() {
    let mock = MockRpc::new(MockState::default());
    let config = mock.config(RpcOptions::default());
    let payer = Keypair::new();
    let recipient = Pubkey::new_unique();
    let table = Pubkey::new_unique();
    let missing_table = Pubkey::new_unique();
    mock.add_lookup_table(table, &[Pubkey::new_unique(), recipient]);

    let transaction = build_transaction_with_config(
        vec![transfer(&payer.pubkey(), &recipient, 1)],
        &[TransactionSigner::from(&payer)],
        &[table, missing_table],
        &config,
    )
    .await
    .unwrap();

    assert!(!transaction
        .message
        .static_account_keys()
        .contains(&recipient));
    let lookups = transaction.message.address_table_lookups().unwrap();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].account_key, table);
    assert_eq!(lookups[0].writable_indexes, vec![1]);
    assert_eq!(transaction.message.instructions().len(), 2);
    assert_eq!(mock.snapshot().called("getAccountInfo"), 2);
}

#[tokio::test]
async fn test_build_requires_a_signer() {
    let mock = MockRpc::new(MockState::default());
    let config = mock.config(RpcOptions::default());

    let result = build_transaction_with_config(
        vec![transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 1)],
        &[],
        &[],
        &config,
    )
    .await;

    assert!(matches!(result, Err(TransactionError::InvalidTransaction(_))));
    assert!(mock.snapshot().methods.is_empty());
}

#[tokio::test]
async fn test_build_without_rpc_fails() {
    let payer = Keypair::new();
    let result = build_transaction_with_config(
        vec![transfer(&payer.pubkey(), &Pubkey::new_unique(), 1)],
        &[TransactionSigner::from(&payer)],
        &[],
        &GlobalConfig::default(),
    )
    .await;

    assert!(matches!(
        result,
        Err(TransactionError::ConnectionNotInitialized)
    ));
}

#[tokio::test]
async fn test_partially_signed_build() {
    let mock = MockRpc::new(MockState::default());
    let config = mock.config(RpcOptions::default());
    let payer = Keypair::new();
    let cosigner = Pubkey::new_unique();
    let caller = transfer(&cosigner, &payer.pubkey(), 1);

    let transaction = build_transaction_with_config(
        vec![caller],
        &[TransactionSigner::from(&payer), TransactionSigner::from(cosigner)],
        &[],
        &config,
    )
    .await
    .unwrap();

    assert_eq!(transaction.signatures.len(), 2);
    assert_ne!(transaction.signatures[0], Signature::default());
    assert_eq!(transaction.signatures[1], Signature::default());
    assert!(!is_fully_signed(&transaction));
}

#[tokio::test]
#[serial]
async fn test_build_transaction_with_global_config() {
    reset_configuration().unwrap();
    let mock = MockRpc::new(MockState::default());
    set_rpc_client(mock.client(), RpcOptions::default())
        .await
        .unwrap();

    let rpc_config = get_global_config_snapshot()
        .unwrap()
        .rpc_config
        .unwrap();
    assert_eq!(rpc_config.chain_id, Some(ChainId::Mainnet));
    assert_eq!(rpc_config.url, "MockRpcSender");

    let payer = Keypair::new();
    let caller = transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
    let mut builds = Vec::new();
    for _ in 0..2 {
        // Setting the same strategy again changes nothing
        set_priority_fee_strategy(FeeStrategy::Exact(1_000)).unwrap();
        let transaction = build_transaction(
            vec![caller.clone()],
            &[TransactionSigner::from(&payer)],
            &[],
        )
        .await
        .unwrap();
        assert!(is_fully_signed(&transaction));
        builds.push(decompile(&transaction));
    }

    assert_eq!(builds[0], builds[1]);
    assert_eq!(builds[0].len(), 3);
    assert_eq!(mock.snapshot().called("getGenesisHash"), 1);
    reset_configuration().unwrap();
}
