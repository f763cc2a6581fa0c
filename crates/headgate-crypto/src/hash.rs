use headgate_core::constants::ADDRESS_LEN;
use headgate_core::types::{Address, TxId};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive an Address from raw public key bytes: the first 20 bytes of BLAKE3.
pub fn address_from_pubkey(pubkey_bytes: &[u8]) -> Address {
    let digest = blake3_hash(pubkey_bytes);
    let mut addr = [0u8; ADDRESS_LEN];
    addr.copy_from_slice(&digest[..ADDRESS_LEN]);
    Address::from_bytes(addr)
}

/// Derive a TxId from the canonical transaction body bytes using BLAKE3.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(blake3_hash(body_bytes))
}
