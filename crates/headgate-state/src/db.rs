use std::path::Path;

use headgate_core::codec;
use headgate_core::currency::{Currency, CurrencyId};
use headgate_core::error::HeadgateError;
use headgate_core::types::{Address, BlockHash, Nonce, TxId};
use headgate_core::value::Value;
use tracing::{debug, info};

use crate::block::{BlockCommit, BlockHeader};
use crate::store::ChainStore;

const META_TIP: &str = "tip";
const META_GENESIS: &str = "genesis";

fn storage(e: sled::Error) -> HeadgateError {
    HeadgateError::Storage(e.to_string())
}

/// Stored bytes that fail to decode are a storage fault, not client input.
fn corrupt(e: HeadgateError) -> HeadgateError {
    HeadgateError::Storage(format!("corrupt entry: {e}"))
}

fn state_prefix(address: &Address) -> Vec<u8> {
    address.as_bytes().to_vec()
}

fn balance_prefix(address: &Address, currency: &CurrencyId) -> Vec<u8> {
    [address.as_bytes().as_slice(), currency.0.as_slice()].concat()
}

/// `prefix ‖ BE(index)`, so a prefix's entries sort by block index.
fn at_index(prefix: &[u8], index: u64) -> Vec<u8> {
    [prefix, index.to_be_bytes().as_slice()].concat()
}

/// Persistent chain database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   blocks        — BlockHash bytes                  → encoded BlockHeader
///   block_index   — u64 BE index                     → BlockHash bytes
///   states        — Address ‖ u64 BE index              → encoded Value
///   balances      — Address ‖ CurrencyId ‖ u64 BE index → i128 LE
///   committed_txs — TxId bytes                       → BlockHash bytes
///   nonces        — Address bytes                    → u64 BE next nonce
///   meta          — utf8 key bytes                   → raw bytes
///
/// `states` and `balances` hold only what each block changed, keyed by the
/// block's index. `append_block` only extends the tip, so the chain is linear
/// and the value in effect at block *i* is the last entry at or below *i*.
pub struct StateDb {
    db: sled::Db,
    blocks: sled::Tree,
    block_index: sled::Tree,
    states: sled::Tree,
    balances: sled::Tree,
    committed_txs: sled::Tree,
    nonces: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the chain database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HeadgateError> {
        Self::from_db(sled::open(path).map_err(storage)?)
    }

    /// An in-memory database removed on drop.
    pub fn temporary() -> Result<Self, HeadgateError> {
        Self::from_db(sled::Config::new().temporary(true).open().map_err(storage)?)
    }

    fn from_db(db: sled::Db) -> Result<Self, HeadgateError> {
        let blocks        = db.open_tree("blocks").map_err(storage)?;
        let block_index   = db.open_tree("block_index").map_err(storage)?;
        let states        = db.open_tree("states").map_err(storage)?;
        let balances      = db.open_tree("balances").map_err(storage)?;
        let committed_txs = db.open_tree("committed_txs").map_err(storage)?;
        let nonces        = db.open_tree("nonces").map_err(storage)?;
        let meta          = db.open_tree("meta").map_err(storage)?;
        Ok(Self { db, blocks, block_index, states, balances, committed_txs, nonces, meta })
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Append a block on top of the current tip.
    ///
    /// The first block appended must be a genesis block (index 0, no parent).
    /// Every later block must name the tip as its parent. The tip pointer is
    /// written last, so readers never see a tip whose data is incomplete.
    pub fn append_block(&self, commit: &BlockCommit) -> Result<(), HeadgateError> {
        let header = &commit.header;
        match self.tip()? {
            None if header.is_genesis() && header.index == 0 => {}
            Some(tip) if header.parent == Some(tip.hash) && header.index == tip.index + 1 => {}
            _ => return Err(HeadgateError::NotOnTip(header.hash.to_hex())),
        }

        let at = header.hash;
        for (address, value) in &commit.states {
            self.states
                .insert(at_index(&state_prefix(address), header.index), value.encode()?)
                .map_err(storage)?;
        }
        for (address, balance) in &commit.balances {
            let cid = balance.currency.id()?;
            self.balances
                .insert(
                    at_index(&balance_prefix(address, &cid), header.index),
                    balance.raw_value.to_le_bytes().to_vec(),
                )
                .map_err(storage)?;
        }
        for tx in &commit.transactions {
            self.committed_txs
                .insert(tx.id.as_bytes(), at.as_bytes().as_slice())
                .map_err(storage)?;
            let next = tx.nonce.saturating_add(1);
            if self.next_nonce(&tx.signer)? < next {
                self.nonces
                    .insert(tx.signer.as_bytes(), next.to_be_bytes().to_vec())
                    .map_err(storage)?;
            }
        }

        self.blocks
            .insert(at.as_bytes(), codec::encode(header)?)
            .map_err(storage)?;
        self.block_index
            .insert(header.index.to_be_bytes(), at.as_bytes().as_slice())
            .map_err(storage)?;
        if header.is_genesis() {
            self.meta.insert(META_GENESIS, at.as_bytes().as_slice()).map_err(storage)?;
        }
        self.meta.insert(META_TIP, at.as_bytes().as_slice()).map_err(storage)?;

        debug!(index = header.index, hash = %at, txs = commit.transactions.len(), "block appended");
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), HeadgateError> {
        self.db.flush().map_err(storage)?;
        info!("chain database flushed");
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    fn meta_hash(&self, key: &str) -> Result<Option<BlockHash>, HeadgateError> {
        match self.meta.get(key).map_err(storage)? {
            Some(bytes) => Ok(Some(BlockHash::from_slice(&bytes).map_err(corrupt)?)),
            None => Ok(None),
        }
    }

    /// The latest entry under `prefix` written at or below block `at`.
    fn latest_at(
        &self,
        tree: &sled::Tree,
        prefix: &[u8],
        at: &BlockHash,
    ) -> Result<Option<sled::IVec>, HeadgateError> {
        let index = self
            .block(at)?
            .ok_or_else(|| HeadgateError::Storage(format!("unknown block {at}")))?
            .index;
        match tree.range(at_index(prefix, 0)..=at_index(prefix, index)).next_back() {
            Some(entry) => Ok(Some(entry.map_err(storage)?.1)),
            None => Ok(None),
        }
    }
}

impl ChainStore for StateDb {
    fn genesis_hash(&self) -> Result<Option<BlockHash>, HeadgateError> {
        self.meta_hash(META_GENESIS)
    }

    fn tip(&self) -> Result<Option<BlockHeader>, HeadgateError> {
        match self.meta_hash(META_TIP)? {
            Some(hash) => self.block(&hash),
            None => Ok(None),
        }
    }

    fn block(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, HeadgateError> {
        match self.blocks.get(hash.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes).map_err(corrupt)?)),
            None => Ok(None),
        }
    }

    fn block_hash_at(&self, index: u64) -> Result<Option<BlockHash>, HeadgateError> {
        match self.block_index.get(index.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(BlockHash::from_slice(&bytes).map_err(corrupt)?)),
            None => Ok(None),
        }
    }

    fn state_at(&self, at: &BlockHash, address: &Address) -> Result<Option<Value>, HeadgateError> {
        match self.latest_at(&self.states, &state_prefix(address), at)? {
            Some(bytes) => Ok(Some(Value::decode(&bytes).map_err(corrupt)?)),
            None => Ok(None),
        }
    }

    fn balance_at(
        &self,
        at: &BlockHash,
        address: &Address,
        currency: &Currency,
    ) -> Result<i128, HeadgateError> {
        let prefix = balance_prefix(address, &currency.id()?);
        match self.latest_at(&self.balances, &prefix, at)? {
            Some(bytes) => {
                let raw = <[u8; 16]>::try_from(bytes.as_ref())
                    .map_err(|_| HeadgateError::Storage("corrupt balance entry".into()))?;
                Ok(i128::from_le_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn next_nonce(&self, address: &Address) -> Result<Nonce, HeadgateError> {
        match self.nonces.get(address.as_bytes()).map_err(storage)? {
            Some(bytes) => {
                let raw = <[u8; 8]>::try_from(bytes.as_ref())
                    .map_err(|_| HeadgateError::Storage("corrupt nonce entry".into()))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn is_committed(&self, id: &TxId) -> Result<bool, HeadgateError> {
        self.committed_txs.contains_key(id.as_bytes()).map_err(storage)
    }
}
