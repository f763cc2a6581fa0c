use thiserror::Error;

use crate::types::{Nonce, TxId};

/// Reasons a decoded transaction is refused by intake validation.
///
/// These are expected outcomes: the gateway reports them to the client as a
/// soft `false`, never as a call failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTxError {
    #[error("transaction id does not match its body")]
    TxIdMismatch,

    #[error("signer address does not match the embedded public key")]
    SignerMismatch,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("genesis hash mismatch: chain is {expected}, transaction names {got}")]
    GenesisMismatch { expected: String, got: String },

    #[error("action payload does not decode into known actions: {0}")]
    UnknownAction(String),

    #[error("transaction {0} is already committed")]
    AlreadyCommitted(TxId),

    #[error("nonce {got} already used: next committed nonce is {expected}")]
    NonceAlreadyUsed { expected: Nonce, got: Nonce },

    #[error("nonce {0} is already held by another staged transaction")]
    NonceAlreadyStaged(Nonce),

    #[error("nonce {got} too far ahead: at most {max} accepted")]
    NonceTooFarAhead { max: Nonce, got: Nonce },
}

#[derive(Debug, Error)]
pub enum HeadgateError {
    // ── Client input ─────────────────────────────────────────────────────────
    /// Malformed wire payload. Fails the call rather than returning `false`.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid transaction: {0}")]
    InvalidTx(#[from] InvalidTxError),

    #[error("unknown session {0}")]
    UnknownSession(u64),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Collaborators ────────────────────────────────────────────────────────
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("block {0} does not extend the current tip")]
    NotOnTip(String),

    #[error("configuration error: {0}")]
    Config(String),

    // ── General ──────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}
