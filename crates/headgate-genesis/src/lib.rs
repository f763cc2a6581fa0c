//! headgate-genesis
//!
//! Builds block #0 from `GenesisParams` and commits it to an empty chain
//! through `ChainWriter`. Genesis carries no transactions: it is the only place where
//! balances and states appear without one.

pub mod params;

pub use params::{GenesisAllocation, GenesisParams, GenesisState};

use std::collections::BTreeMap;

use headgate_core::constants::MAX_VALUE_DEPTH;
use headgate_core::currency::{Currency, FungibleAssetValue};
use headgate_core::error::HeadgateError;
use headgate_core::types::Address;
use headgate_core::value::Value;
use headgate_state::{BlockCommit, BlockHeader, ChainWriter};
use tracing::info;

fn config(msg: String) -> HeadgateError {
    HeadgateError::Config(msg)
}

/// Convert a JSON document into a state value.
///
/// Numbers must be integers; objects become dictionaries. Nesting is capped
/// at `MAX_VALUE_DEPTH` so the stored value decodes again.
pub fn value_from_json(json: &serde_json::Value) -> Result<Value, HeadgateError> {
    convert(json, 0)
}

fn convert(json: &serde_json::Value, depth: usize) -> Result<Value, HeadgateError> {
    if depth > MAX_VALUE_DEPTH {
        return Err(config(format!("genesis state nested deeper than {MAX_VALUE_DEPTH}")));
    }
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            let i = n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .ok_or_else(|| config(format!("non-integer number in genesis state: {n}")))?;
            Value::Integer(i)
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(
                items
                    .iter()
                    .map(|item| convert(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            )
        }
        serde_json::Value::Object(map) => {
            let mut dict = BTreeMap::new();
            for (k, v) in map {
                dict.insert(k.clone(), convert(v, depth + 1)?);
            }
            Value::Dictionary(dict)
        }
    })
}

fn allocation_balance(
    alloc: &GenesisAllocation,
) -> Result<(Address, FungibleAssetValue), HeadgateError> {
    let address = Address::from_hex(&alloc.address)
        .map_err(|e| config(format!("allocation address: {e}")))?;
    let mut currency = Currency::new(alloc.ticker.clone(), alloc.decimal_places);
    if let Some(minters) = &alloc.minters {
        let parsed = minters
            .iter()
            .map(|m| Address::from_hex(m))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| config(format!("minter address: {e}")))?;
        currency = currency.with_minters(parsed);
    }
    let amount: i128 = alloc
        .amount
        .parse()
        .map_err(|e| config(format!("allocation amount {:?}: {e}", alloc.amount)))?;
    Ok((address, FungibleAssetValue::new(currency, amount)))
}

/// Build the genesis block without touching storage.
pub fn genesis_commit(params: &GenesisParams) -> Result<BlockCommit, HeadgateError> {
    let header = BlockHeader::new(0, None, params.timestamp, vec![])?;
    let mut commit = BlockCommit::new(header);

    for alloc in &params.allocations {
        let (address, balance) = allocation_balance(alloc)?;
        commit = commit.with_balance(address, balance);
    }
    for state in &params.states {
        let address = Address::from_hex(&state.address)
            .map_err(|e| config(format!("state address: {e}")))?;
        commit = commit.with_state(address, value_from_json(&state.value)?);
    }
    Ok(commit)
}

/// Commit genesis to an empty chain and return the genesis header.
pub fn apply_genesis(
    writer: &ChainWriter,
    params: &GenesisParams,
) -> Result<BlockHeader, HeadgateError> {
    info!("applying genesis block");
    let commit = genesis_commit(params)?;
    writer.commit(&commit)?;
    info!(
        hash = %commit.header.hash,
        allocations = commit.balances.len(),
        states = commit.states.len(),
        "genesis applied"
    );
    Ok(commit.header)
}
