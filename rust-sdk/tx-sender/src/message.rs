use crate::error::{Result, TransactionError};
use solana_hash::Hash;
use solana_instruction::Instruction;
use solana_message::{v0, AddressLookupTableAccount, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

/// A transaction message under construction.
///
/// Every stage of the pipeline takes a draft by value and returns a new one;
/// nothing mutates a draft in place. Instructions are only ever added at the
/// front, so the caller's instructions keep their relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    payer: Pubkey,
    instructions: Vec<Instruction>,
    recent_blockhash: Hash,
    last_valid_block_height: Option<u64>,
    lookup_tables: Vec<AddressLookupTableAccount>,
}

impl TransactionDraft {
    pub fn new(payer: Pubkey, instructions: Vec<Instruction>, recent_blockhash: Hash) -> Self {
        Self {
            payer,
            instructions,
            recent_blockhash,
            last_valid_block_height: None,
            lookup_tables: Vec::new(),
        }
    }

    pub fn with_last_valid_block_height(self, last_valid_block_height: u64) -> Self {
        Self {
            last_valid_block_height: Some(last_valid_block_height),
            ..self
        }
    }

    /// Compress account references found in `lookup_tables` when compiling
    pub fn with_lookup_tables(self, lookup_tables: Vec<AddressLookupTableAccount>) -> Self {
        Self {
            lookup_tables,
            ..self
        }
    }

    pub fn prepend_instruction(self, instruction: Instruction) -> Self {
        self.prepend_instructions(vec![instruction])
    }

    /// Insert `instructions` ahead of the existing ones, preserving their order
    pub fn prepend_instructions(self, mut instructions: Vec<Instruction>) -> Self {
        instructions.extend(self.instructions);
        Self {
            instructions,
            ..self
        }
    }

    pub fn payer(&self) -> &Pubkey {
        &self.payer
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn recent_blockhash(&self) -> &Hash {
        &self.recent_blockhash
    }

    pub fn last_valid_block_height(&self) -> Option<u64> {
        self.last_valid_block_height
    }

    pub fn lookup_tables(&self) -> &[AddressLookupTableAccount] {
        &self.lookup_tables
    }

    /// Compile into a v0 message, rewriting lookup-table addresses to indexes
    pub fn compile(&self) -> Result<VersionedMessage> {
        let message = v0::Message::try_compile(
            &self.payer,
            &self.instructions,
            &self.lookup_tables,
            self.recent_blockhash,
        )
        .map_err(|e| TransactionError::InvalidTransaction(e.to_string()))?;
        Ok(VersionedMessage::V0(message))
    }

    /// Compile into a transaction with every signature slot left empty
    pub fn to_unsigned_transaction(&self) -> Result<VersionedTransaction> {
        let message = self.compile()?;
        let required = message.header().num_required_signatures as usize;
        Ok(VersionedTransaction {
            signatures: vec![Signature::default(); required],
            message,
        })
    }
}
