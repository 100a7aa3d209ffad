use crate::error::{Result, TransactionError};
use solana_message::VersionedMessage;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use std::fmt;

/// A transaction signer capability.
///
/// `Keypair` holds signing material and always fills its slot. `AddressOnly`
/// only reserves a slot for a wallet that will countersign later, which
/// leaves the transaction partially signed.
#[derive(Clone, Copy)]
pub enum TransactionSigner<'a> {
    Keypair(&'a dyn Signer),
    AddressOnly(Pubkey),
}

impl fmt::Debug for TransactionSigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keypair(signer) => f.debug_tuple("Keypair").field(&signer.pubkey()).finish(),
            Self::AddressOnly(pubkey) => f.debug_tuple("AddressOnly").field(pubkey).finish(),
        }
    }
}

impl<'a, T: Signer + 'a> From<&'a T> for TransactionSigner<'a> {
    fn from(signer: &'a T) -> Self {
        Self::Keypair(signer)
    }
}

impl From<Pubkey> for TransactionSigner<'_> {
    fn from(pubkey: Pubkey) -> Self {
        Self::AddressOnly(pubkey)
    }
}

impl TransactionSigner<'_> {
    pub fn pubkey(&self) -> Pubkey {
        match self {
            Self::Keypair(signer) => signer.pubkey(),
            Self::AddressOnly(pubkey) => *pubkey,
        }
    }

    /// Produce zero or one signature over `message`
    pub fn try_sign(&self, message: &[u8]) -> Result<Option<Signature>> {
        match self {
            Self::Keypair(signer) => Ok(Some(signer.try_sign_message(message)?)),
            Self::AddressOnly(_) => Ok(None),
        }
    }
}

/// Sign `message` with every signer able to, leaving other slots empty.
///
/// Each signer must correspond to one of the message's required signers.
pub fn sign_with_available_signers(
    message: VersionedMessage,
    signers: &[TransactionSigner<'_>],
) -> Result<VersionedTransaction> {
    let required = message.header().num_required_signatures as usize;
    let signer_keys: Vec<Pubkey> = message
        .static_account_keys()
        .iter()
        .take(required)
        .copied()
        .collect();
    let message_bytes = message.serialize();
    let mut signatures = vec![Signature::default(); required];

    for signer in signers {
        let pubkey = signer.pubkey();
        let position = signer_keys
            .iter()
            .position(|key| *key == pubkey)
            .ok_or_else(|| {
                TransactionError::InvalidTransaction(format!(
                    "{pubkey} is not a required signer"
                ))
            })?;
        if let Some(signature) = signer.try_sign(&message_bytes)? {
            signatures[position] = signature;
        }
    }

    Ok(VersionedTransaction {
        signatures,
        message,
    })
}

/// True when every required signature slot is filled
pub fn is_fully_signed(transaction: &VersionedTransaction) -> bool {
    let required = transaction.message.header().num_required_signatures as usize;
    transaction.signatures.len() == required
        && transaction
            .signatures
            .iter()
            .all(|signature| *signature != Signature::default())
}
