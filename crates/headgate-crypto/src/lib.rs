pub mod dilithium;
pub mod hash;
pub mod keypair;
pub mod tx;

pub use dilithium::{verify_signature, SignatureError};
pub use hash::{address_from_pubkey, blake3_hash, tx_id_from_body};
pub use keypair::KeyPair;
pub use tx::{sign_transaction, UnsignedTx};
