//! Binary wire codec shared by the gateway, the store and clients.
//!
//! Fixed-width little-endian bincode, size-capped at `MAX_WIRE_BYTES`, with
//! trailing bytes rejected so one value has exactly one accepted encoding.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::MAX_WIRE_BYTES;
use crate::error::HeadgateError;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_WIRE_BYTES)
        .reject_trailing_bytes()
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HeadgateError> {
    options()
        .serialize(value)
        .map_err(|e| HeadgateError::Serialization(e.to_string()))
}

/// Decode untrusted bytes. Every failure is a `Decode` error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HeadgateError> {
    options()
        .deserialize(bytes)
        .map_err(|e| HeadgateError::Decode(e.to_string()))
}
