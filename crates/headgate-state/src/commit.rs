use std::sync::Arc;

use headgate_core::error::HeadgateError;
use headgate_core::types::BlockHash;
use tracing::{debug, info};

use crate::block::BlockCommit;
use crate::checkpoint::RenderCheckpoint;
use crate::db::StateDb;
use crate::pool::StagedPool;
use crate::store::ChainStore;

/// The one way blocks enter the node.
///
/// Appending a block, pruning what it made obsolete from the staging pool and
/// advancing the read checkpoint happen together, in that order. A staged
/// transaction that slips in after the prune is caught by intake's own
/// post-insert commit check.
pub struct ChainWriter {
    db: Arc<StateDb>,
    pool: Arc<StagedPool>,
    checkpoint: Arc<RenderCheckpoint>,
}

impl ChainWriter {
    pub fn new(db: Arc<StateDb>, pool: Arc<StagedPool>, checkpoint: Arc<RenderCheckpoint>) -> Self {
        Self { db, pool, checkpoint }
    }

    pub fn db(&self) -> &Arc<StateDb> {
        &self.db
    }

    /// Append `commit` on top of the tip. Returns the new checkpoint, or
    /// `None` while the chain is shorter than the render delay.
    pub fn commit(&self, commit: &BlockCommit) -> Result<Option<BlockHash>, HeadgateError> {
        self.db.append_block(commit)?;
        let pruned = self.pool.on_block_committed(commit);
        let checkpoint = self.checkpoint.on_tip_changed(self.db.as_ref(), &commit.header)?;
        info!(
            index = commit.header.index,
            hash = %commit.header.hash,
            txs = commit.transactions.len(),
            pruned,
            "block committed"
        );
        Ok(checkpoint)
    }

    /// Pin the checkpoint to an existing tip, e.g. after a restart.
    pub fn resume(&self) -> Result<Option<BlockHash>, HeadgateError> {
        match self.db.tip()? {
            Some(tip) => {
                debug!(index = tip.index, hash = %tip.hash, "resuming at tip");
                self.checkpoint.on_tip_changed(self.db.as_ref(), &tip)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockHeader, CommittedTx};
    use headgate_core::transaction::Transaction;
    use headgate_core::types::{Address, DilithiumPublicKey, DilithiumSignature, TxId};

    fn staged(signer: u8, nonce: u64, tag: u8) -> Transaction {
        Transaction {
            id: TxId::from_bytes([tag; 32]),
            nonce,
            signer: Address::from_bytes([signer; 20]),
            public_key: DilithiumPublicKey(vec![]),
            genesis_hash: None,
            timestamp: 0,
            payload: vec![],
            signature: DilithiumSignature(vec![]),
        }
    }

    fn writer(render_delay: u64) -> ChainWriter {
        ChainWriter::new(
            Arc::new(StateDb::temporary().unwrap()),
            Arc::new(StagedPool::new()),
            Arc::new(RenderCheckpoint::new(render_delay)),
        )
    }

    #[test]
    fn commit_prunes_pool_and_advances_checkpoint() {
        let w = writer(0);
        let g = BlockHeader::new(0, None, 0, vec![]).unwrap();
        assert_eq!(w.commit(&BlockCommit::new(g.clone())).unwrap(), Some(g.hash));

        let tx = staged(1, 0, 7);
        w.pool.insert(tx.clone());
        let b1 = BlockHeader::new(1, Some(g.hash), 1, vec![tx.id]).unwrap();
        let checkpoint = w
            .commit(&BlockCommit::new(b1.clone()).with_transaction(CommittedTx {
                id: tx.id,
                signer: tx.signer,
                nonce: tx.nonce,
            }))
            .unwrap();

        assert_eq!(checkpoint, Some(b1.hash));
        assert_eq!(w.checkpoint.current(), Some(b1.hash));
        assert!(!w.pool.contains(&tx.id));
        assert!(w.db.is_committed(&tx.id).unwrap());
    }

    #[test]
    fn rejected_block_leaves_pool_and_checkpoint_alone() {
        let w = writer(0);
        let tx = staged(1, 0, 7);
        w.pool.insert(tx.clone());

        // Not a genesis block, so the empty chain refuses it.
        let orphan = BlockHeader::new(1, Some(BlockHash::from_bytes([3; 32])), 1, vec![tx.id]).unwrap();
        let err = w
            .commit(&BlockCommit::new(orphan).with_transaction(CommittedTx {
                id: tx.id,
                signer: tx.signer,
                nonce: tx.nonce,
            }))
            .unwrap_err();

        assert!(matches!(err, HeadgateError::NotOnTip(_)));
        assert!(w.pool.contains(&tx.id));
        assert_eq!(w.checkpoint.current(), None);
    }

    #[test]
    fn resume_pins_checkpoint_behind_existing_tip() {
        let db = Arc::new(StateDb::temporary().unwrap());
        let mut parent: Option<BlockHeader> = None;
        for i in 0..4 {
            let header = BlockHeader::new(i, parent.as_ref().map(|p| p.hash), i as i64, vec![]).unwrap();
            db.append_block(&BlockCommit::new(header.clone())).unwrap();
            parent = Some(header);
        }

        let w = ChainWriter::new(db.clone(), Arc::new(StagedPool::new()), Arc::new(RenderCheckpoint::new(2)));
        let pinned = w.resume().unwrap();
        assert_eq!(pinned, db.block_hash_at(1).unwrap());
    }
}
