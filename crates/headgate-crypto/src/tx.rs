use headgate_core::error::HeadgateError;
use headgate_core::transaction::{encode_actions, Action, Transaction};
use headgate_core::types::{BlockHash, DilithiumSignature, Nonce, Timestamp, TxId};

use crate::hash::tx_id_from_body;
use crate::keypair::KeyPair;

/// Fields a client chooses before signing.
#[derive(Clone, Debug)]
pub struct UnsignedTx {
    pub nonce: Nonce,
    pub genesis_hash: Option<BlockHash>,
    pub timestamp: Timestamp,
    pub actions: Vec<Action>,
}

/// Build, hash and sign a transaction the way a client does before submitting it.
pub fn sign_transaction(kp: &KeyPair, unsigned: UnsignedTx) -> Result<Transaction, HeadgateError> {
    let mut tx = Transaction {
        id: TxId::from_bytes([0u8; 32]), // placeholder
        nonce: unsigned.nonce,
        signer: kp.address,
        public_key: kp.public_key.clone(),
        genesis_hash: unsigned.genesis_hash,
        timestamp: unsigned.timestamp,
        payload: encode_actions(&unsigned.actions)?,
        signature: DilithiumSignature(vec![]),
    };
    let body_bytes = tx.body_bytes()?;
    tx.id = tx_id_from_body(&body_bytes);
    tx.signature = kp
        .sign(&body_bytes)
        .map_err(|e| HeadgateError::Other(format!("signing failed: {e}")))?;
    Ok(tx)
}
