use headgate_core::error::{HeadgateError, InvalidTxError};
use headgate_core::transaction::{Action, Transaction};
use headgate_core::types::Nonce;
use headgate_crypto::{address_from_pubkey, tx_id_from_body, verify_signature};
use headgate_state::ChainStore;

use crate::reader::ChainReader;

/// Checks that need nothing but the transaction itself.
///
/// In order:
/// 1. TxId integrity (recomputed from body)
/// 2. Signer address derives from the embedded public key
/// 3. Dilithium2 signature over the body
/// 4. Payload decodes into known actions
pub fn validate_intrinsic(tx: &Transaction) -> Result<Vec<Action>, HeadgateError> {
    // ── 1. TxId integrity ────────────────────────────────────────────────────
    let body_bytes = tx.body_bytes()?;
    if tx_id_from_body(&body_bytes) != tx.id {
        return Err(InvalidTxError::TxIdMismatch.into());
    }

    // ── 2. Signer binding ────────────────────────────────────────────────────
    if address_from_pubkey(&tx.public_key.0) != tx.signer {
        return Err(InvalidTxError::SignerMismatch.into());
    }

    // ── 3. Signature ─────────────────────────────────────────────────────────
    verify_signature(&tx.public_key, &body_bytes, &tx.signature)
        .map_err(|_| InvalidTxError::InvalidSignature)?;

    // ── 4. Actions ───────────────────────────────────────────────────────────
    tx.actions()
        .map_err(|e| InvalidTxError::UnknownAction(e.to_string()).into())
}

/// Checks against the chain and the staging pool.
///
/// In order:
/// 1. Genesis hash, when the transaction names one
/// 2. Not already committed
/// 3. Nonce not below the signer's committed next nonce
/// 4. No other staged transaction holds the nonce
/// 5. Nonce at most `nonce_window` past the next expected nonce
pub fn validate_against_chain(
    tx: &Transaction,
    reader: &ChainReader,
    nonce_window: u64,
) -> Result<(), HeadgateError> {
    let store = reader.store();

    if let (Some(named), Some(genesis)) = (tx.genesis_hash, store.genesis_hash()?) {
        if named != genesis {
            return Err(InvalidTxError::GenesisMismatch {
                expected: genesis.to_hex(),
                got: named.to_hex(),
            }
            .into());
        }
    }

    let committed = ensure_not_committed(tx, store)?;

    let pool = reader.pool();
    if pool
        .holder_of(&tx.signer, tx.nonce)
        .is_some_and(|holder| holder != tx.id)
    {
        return Err(InvalidTxError::NonceAlreadyStaged(tx.nonce).into());
    }

    let max = pool
        .next_nonce(&tx.signer, committed)
        .saturating_add(nonce_window);
    if tx.nonce > max {
        return Err(InvalidTxError::NonceTooFarAhead { max, got: tx.nonce }.into());
    }

    Ok(())
}

/// Neither the transaction nor its nonce is in a committed block.
/// Returns the signer's committed next nonce.
pub fn ensure_not_committed(tx: &Transaction, store: &dyn ChainStore) -> Result<Nonce, HeadgateError> {
    if store.is_committed(&tx.id)? {
        return Err(InvalidTxError::AlreadyCommitted(tx.id).into());
    }

    let committed = store.next_nonce(&tx.signer)?;
    if tx.nonce < committed {
        return Err(InvalidTxError::NonceAlreadyUsed {
            expected: committed,
            got: tx.nonce,
        }
        .into());
    }
    Ok(committed)
}
