use serde::{Deserialize, Serialize};

use crate::codec;
use crate::currency::FungibleAssetValue;
use crate::error::HeadgateError;
use crate::types::{Address, BlockHash, DilithiumPublicKey, DilithiumSignature, Nonce, Timestamp, TxId};
use crate::value::Value;

// ── Action ────────────────────────────────────────────────────────────────────

/// The known action types a transaction payload may carry.
///
/// Execution happens in block production; the gateway only checks that a
/// payload decodes into these.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    /// Move `amount` from the signer to `recipient`.
    TransferAsset {
        recipient: Address,
        amount: FungibleAssetValue,
    },

    /// Replace the signer's state value.
    SetState { value: Value },

    /// Consumes a nonce and nothing else.
    Noop,
}

/// Encode a list of actions into a transaction payload.
pub fn encode_actions(actions: &[Action]) -> Result<Vec<u8>, HeadgateError> {
    codec::encode(actions)
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A signed transaction as submitted by a client.
///
/// `id` is BLAKE3 of the canonical encoding of every field except `id` and
/// `signature`; the signature covers the same bytes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxId,

    /// Per-signer sequence number (replay protection).
    pub nonce: Nonce,

    /// The account authorizing this transaction.
    pub signer: Address,

    /// Key whose derived address must equal `signer`.
    pub public_key: DilithiumPublicKey,

    /// Genesis block of the chain this transaction targets. `None` skips the check.
    pub genesis_hash: Option<BlockHash>,

    pub timestamp: Timestamp,

    /// Encoded `Vec<Action>`.
    pub payload: Vec<u8>,

    pub signature: DilithiumSignature,
}

/// The body bytes that are hashed to produce `id` and covered by the signature.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub nonce: Nonce,
    pub signer: &'a Address,
    pub public_key: &'a DilithiumPublicKey,
    pub genesis_hash: &'a Option<BlockHash>,
    pub timestamp: Timestamp,
    pub payload: &'a [u8],
}

impl Transaction {
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            nonce: self.nonce,
            signer: &self.signer,
            public_key: &self.public_key,
            genesis_hash: &self.genesis_hash,
            timestamp: self.timestamp,
            payload: &self.payload,
        }
    }

    /// Serialize the body to canonical bytes.
    pub fn body_bytes(&self) -> Result<Vec<u8>, HeadgateError> {
        codec::encode(&self.body())
    }

    /// Decode the payload into known actions.
    pub fn actions(&self) -> Result<Vec<Action>, HeadgateError> {
        codec::decode(&self.payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, HeadgateError> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HeadgateError> {
        codec::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;

    fn sample() -> Transaction {
        Transaction {
            id: TxId::from_bytes([0; 32]),
            nonce: 3,
            signer: Address::from_bytes([1; 20]),
            public_key: DilithiumPublicKey(vec![9; 8]),
            genesis_hash: None,
            timestamp: 1_700_000_000,
            payload: encode_actions(&[Action::TransferAsset {
                recipient: Address::from_bytes([2; 20]),
                amount: FungibleAssetValue::new(Currency::new("GOLD", 2), 10),
            }])
            .unwrap(),
            signature: DilithiumSignature(vec![]),
        }
    }

    #[test]
    fn body_excludes_id_and_signature() {
        let a = sample();
        let mut b = a.clone();
        b.id = TxId::from_bytes([5; 32]);
        b.signature = DilithiumSignature(vec![1, 2, 3]);
        assert_eq!(a.body_bytes().unwrap(), b.body_bytes().unwrap());

        b.nonce += 1;
        assert_ne!(a.body_bytes().unwrap(), b.body_bytes().unwrap());
    }

    #[test]
    fn unknown_payload_fails_to_decode_actions() {
        let mut tx = sample();
        tx.payload = vec![0xff; 9];
        assert!(tx.actions().is_err());
    }

    #[test]
    fn truncated_transaction_is_a_decode_error() {
        let bytes = sample().encode().unwrap();
        let err = Transaction::decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, HeadgateError::Decode(_)));
    }
}
