use std::sync::Arc;

use headgate_core::currency::{Currency, FungibleAssetValue};
use headgate_core::error::HeadgateError;
use headgate_core::types::{Address, BlockHash, Nonce, TxId};
use headgate_core::value::Value;
use headgate_state::{ChainStore, RenderCheckpoint, StagedPool};

/// Where reads are currently pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    pub checkpoint: Option<BlockHash>,
    pub checkpoint_index: Option<u64>,
    pub tip: Option<BlockHash>,
    pub tip_index: Option<u64>,
}

/// Read-only view over the chain store, staging pool and render checkpoint.
pub struct ChainReader {
    store: Arc<dyn ChainStore>,
    pool: Arc<StagedPool>,
    checkpoint: Arc<RenderCheckpoint>,
}

impl ChainReader {
    pub fn new(
        store: Arc<dyn ChainStore>,
        pool: Arc<StagedPool>,
        checkpoint: Arc<RenderCheckpoint>,
    ) -> Self {
        Self {
            store,
            pool,
            checkpoint,
        }
    }

    pub fn store(&self) -> &dyn ChainStore {
        self.store.as_ref()
    }

    pub fn pool(&self) -> &StagedPool {
        &self.pool
    }

    /// State at the checkpoint. Absent addresses read as `Value::Null`.
    pub fn state(&self, address: &Address) -> Result<Value, HeadgateError> {
        let Some(at) = self.checkpoint.resolve(self.store())? else {
            return Ok(Value::ABSENT);
        };
        Ok(self.store.state_at(&at, address)?.into())
    }

    /// Balance at the checkpoint, echoing back the queried currency.
    pub fn balance(
        &self,
        address: &Address,
        currency: Currency,
    ) -> Result<FungibleAssetValue, HeadgateError> {
        let Some(at) = self.checkpoint.resolve(self.store())? else {
            return Ok(FungibleAssetValue::zero(currency));
        };
        let raw = self.store.balance_at(&at, address, &currency)?;
        Ok(FungibleAssetValue::new(currency, raw))
    }

    /// Next nonce a new transaction from `address` should use, counting
    /// contiguous staged nonces.
    pub fn next_tx_nonce(&self, address: &Address) -> Result<Nonce, HeadgateError> {
        let committed = self.store.next_nonce(address)?;
        Ok(self.pool.next_nonce(address, committed))
    }

    pub fn is_staged(&self, id: &TxId) -> bool {
        self.pool.contains(id)
    }

    pub fn staged_ids(&self) -> Vec<TxId> {
        self.pool.ids()
    }

    pub fn checkpoint_info(&self) -> Result<CheckpointInfo, HeadgateError> {
        let tip = self.store.tip()?;
        let checkpoint = self.checkpoint.current();
        let checkpoint_index = match &checkpoint {
            Some(hash) => self.store.block(hash)?.map(|h| h.index),
            None => None,
        };
        Ok(CheckpointInfo {
            checkpoint,
            checkpoint_index,
            tip: tip.as_ref().map(|h| h.hash),
            tip_index: tip.map(|h| h.index),
        })
    }
}
