use serde::{Deserialize, Serialize};

/// Initial allocations and states written into block #0.
///
/// Loaded from JSON; addresses are hex, amounts are decimal strings so that
/// 128-bit values survive JSON tooling.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Genesis block timestamp (Unix seconds, UTC).
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub allocations: Vec<GenesisAllocation>,
    #[serde(default)]
    pub states: Vec<GenesisState>,
}

/// A starting balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub address: String,
    pub ticker: String,
    pub decimal_places: u8,
    /// Hex addresses allowed to mint; omitted means unrestricted.
    #[serde(default)]
    pub minters: Option<Vec<String>>,
    /// Raw amount in the smallest unit.
    pub amount: String,
}

/// A starting state value, written as plain JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisState {
    pub address: String,
    pub value: serde_json::Value,
}
