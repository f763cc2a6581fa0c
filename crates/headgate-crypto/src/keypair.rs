use headgate_core::types::{Address, DilithiumPublicKey, DilithiumSignature};
use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::dilithium::SignatureError;
use crate::hash::address_from_pubkey;

/// A Dilithium2 keypair with its derived Address.
///
/// The node never holds client keys; this exists for genesis tooling and
/// tests that need to produce signed transactions.
pub struct KeyPair {
    pub address: Address,
    pub public_key: DilithiumPublicKey,
    secret_key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    /// Generate a fresh Dilithium2 keypair.
    pub fn generate() -> Self {
        let (pk, sk) = dilithium2::keypair();
        Self::from_raw(pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
    }

    /// Restore a KeyPair from raw bytes.
    pub fn from_raw(pk_bytes: Vec<u8>, sk_bytes: Vec<u8>) -> Self {
        Self {
            address: address_from_pubkey(&pk_bytes),
            public_key: DilithiumPublicKey(pk_bytes),
            secret_key: Zeroizing::new(sk_bytes),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, SignatureError> {
        crate::dilithium::sign(&self.secret_key, message)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ address: {:?} }}", self.address)
    }
}
