use headgate_core::codec;
use headgate_core::currency::FungibleAssetValue;
use headgate_core::error::HeadgateError;
use headgate_core::types::{Address, BlockHash, Nonce, Timestamp, TxId};
use headgate_core::value::Value;
use serde::{Deserialize, Serialize};

/// Stored header of an appended block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    pub hash: BlockHash,
    /// `None` only for genesis.
    pub parent: Option<BlockHash>,
    pub timestamp: Timestamp,
    pub tx_ids: Vec<TxId>,
}

#[derive(Serialize)]
struct HeaderPreimage<'a> {
    index: u64,
    parent: &'a Option<BlockHash>,
    timestamp: Timestamp,
    tx_ids: &'a [TxId],
}

impl BlockHeader {
    /// Build a header whose hash is BLAKE3 of the other fields.
    pub fn new(
        index: u64,
        parent: Option<BlockHash>,
        timestamp: Timestamp,
        tx_ids: Vec<TxId>,
    ) -> Result<Self, HeadgateError> {
        let preimage = codec::encode(&HeaderPreimage {
            index,
            parent: &parent,
            timestamp,
            tx_ids: &tx_ids,
        })?;
        Ok(Self {
            index,
            hash: BlockHash::from_bytes(*blake3::hash(&preimage).as_bytes()),
            parent,
            timestamp,
            tx_ids,
        })
    }

    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }
}

/// A transaction as recorded by block production.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTx {
    pub id: TxId,
    pub signer: Address,
    pub nonce: Nonce,
}

/// Everything block production hands the store for one block: the header,
/// the state values and absolute balances it changed, and the transactions
/// it included.
#[derive(Clone, Debug)]
pub struct BlockCommit {
    pub header: BlockHeader,
    pub states: Vec<(Address, Value)>,
    pub balances: Vec<(Address, FungibleAssetValue)>,
    pub transactions: Vec<CommittedTx>,
}

impl BlockCommit {
    pub fn new(header: BlockHeader) -> Self {
        Self {
            header,
            states: Vec::new(),
            balances: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn with_state(mut self, address: Address, value: Value) -> Self {
        self.states.push((address, value));
        self
    }

    pub fn with_balance(mut self, address: Address, balance: FungibleAssetValue) -> Self {
        self.balances.push((address, balance));
        self
    }

    pub fn with_transaction(mut self, tx: CommittedTx) -> Self {
        self.transactions.push(tx);
        self
    }
}
