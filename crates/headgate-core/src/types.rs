use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ADDRESS_LEN, HASH_LEN};
use crate::error::HeadgateError;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Transaction sequence number per signer (monotonically increasing).
pub type Nonce = u64;

/// Copy `bytes` into a fixed-size array, failing with a decode error that
/// names `what` when the length is wrong.
fn fixed<const N: usize>(what: &str, bytes: &[u8]) -> Result<[u8; N], HeadgateError> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        HeadgateError::Decode(format!(
            "{what} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

fn fixed_hex<const N: usize>(what: &str, s: &str) -> Result<[u8; N], HeadgateError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes =
        hex::decode(s).map_err(|e| HeadgateError::Decode(format!("invalid {what} hex: {e}")))?;
    fixed(what, &bytes)
}

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte account identifier: the first 20 bytes of BLAKE3(public_key).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn from_bytes(b: [u8; ADDRESS_LEN]) -> Self {
        Self(b)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, HeadgateError> {
        fixed("address", bytes).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex address; a leading `0x` is accepted.
    pub fn from_hex(s: &str) -> Result<Self, HeadgateError> {
        fixed_hex("address", s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}…)", &self.to_hex()[..8])
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the canonical serialized tx body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; HASH_LEN]);

impl TxId {
    pub fn from_bytes(b: [u8; HASH_LEN]) -> Self {
        Self(b)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, HeadgateError> {
        fixed("transaction id", bytes).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, HeadgateError> {
        fixed_hex("transaction id", s).map(Self)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── BlockHash ────────────────────────────────────────────────────────────────

/// 32-byte block identifier. State and balance reads are evaluated at one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; HASH_LEN]);

impl BlockHash {
    pub fn from_bytes(b: [u8; HASH_LEN]) -> Self {
        Self(b)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, HeadgateError> {
        fixed("block hash", bytes).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, HeadgateError> {
        fixed_hex("block hash", s).map(Self)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}…)", &self.to_hex()[..16])
    }
}

// ── DilithiumPublicKey ────────────────────────────────────────────────────────

/// Dilithium2 public key (1312 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey(pub Vec<u8>);

impl fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumPublicKey({}b)", self.0.len())
    }
}

/// Dilithium2 signature (2420 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumSignature(pub Vec<u8>);

impl fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumSignature({}b)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_accepts_prefix() {
        let addr = Address::from_bytes([0xab; ADDRESS_LEN]);
        let parsed = Address::from_hex(&format!("0x{}", addr.to_hex())).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn short_address_is_a_decode_error() {
        let err = Address::from_slice(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, HeadgateError::Decode(_)));
    }

    #[test]
    fn tx_id_rejects_bad_hex() {
        assert!(matches!(
            TxId::from_hex("zz"),
            Err(HeadgateError::Decode(_))
        ));
    }
}
