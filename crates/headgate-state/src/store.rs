use headgate_core::currency::Currency;
use headgate_core::error::HeadgateError;
use headgate_core::types::{Address, BlockHash, Nonce, TxId};
use headgate_core::value::Value;

use crate::block::BlockHeader;

/// Read access to the node's authoritative chain.
///
/// `state_at` and `balance_at` resolve against the chain as of block `at`,
/// so callers can pin a read to a checkpoint behind the tip.
pub trait ChainStore: Send + Sync {
    fn genesis_hash(&self) -> Result<Option<BlockHash>, HeadgateError>;

    fn tip(&self) -> Result<Option<BlockHeader>, HeadgateError>;

    fn block(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, HeadgateError>;

    /// Hash of the canonical block at `index`.
    fn block_hash_at(&self, index: u64) -> Result<Option<BlockHash>, HeadgateError>;

    fn state_at(&self, at: &BlockHash, address: &Address) -> Result<Option<Value>, HeadgateError>;

    /// Raw amount held at `at`; zero if the address never held `currency`.
    fn balance_at(
        &self,
        at: &BlockHash,
        address: &Address,
        currency: &Currency,
    ) -> Result<i128, HeadgateError>;

    /// Smallest nonce not used by any committed transaction from `address`.
    fn next_nonce(&self, address: &Address) -> Result<Nonce, HeadgateError>;

    fn is_committed(&self, id: &TxId) -> Result<bool, HeadgateError>;
}
