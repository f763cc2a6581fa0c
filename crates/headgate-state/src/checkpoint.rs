use headgate_core::error::HeadgateError;
use headgate_core::types::BlockHash;
use parking_lot::RwLock;
use tracing::debug;

use crate::block::BlockHeader;
use crate::store::ChainStore;

/// The block state reads are evaluated at: the last block whose side effects
/// the node has rendered, which trails the tip by `render_delay` blocks.
///
/// Until anything is rendered, readers fall back to the tip.
pub struct RenderCheckpoint {
    render_delay: u64,
    rendered: RwLock<Option<BlockHash>>,
}

impl RenderCheckpoint {
    pub fn new(render_delay: u64) -> Self {
        Self {
            render_delay,
            rendered: RwLock::new(None),
        }
    }

    pub fn render_delay(&self) -> u64 {
        self.render_delay
    }

    /// Last rendered block, if any.
    pub fn current(&self) -> Option<BlockHash> {
        *self.rendered.read()
    }

    /// Record a block reported directly by the renderer.
    pub fn set_rendered(&self, hash: BlockHash) {
        *self.rendered.write() = Some(hash);
        debug!(%hash, "checkpoint advanced");
    }

    /// Advance after the tip moved to `tip`: render the canonical block
    /// `render_delay` below it. Returns the new checkpoint, or `None` when
    /// the chain is still shorter than the delay.
    pub fn on_tip_changed(
        &self,
        store: &dyn ChainStore,
        tip: &BlockHeader,
    ) -> Result<Option<BlockHash>, HeadgateError> {
        let Some(index) = tip.index.checked_sub(self.render_delay) else {
            return Ok(None);
        };
        let hash = store.block_hash_at(index)?.ok_or_else(|| {
            HeadgateError::Storage(format!("no canonical block at index {index}"))
        })?;
        self.set_rendered(hash);
        Ok(Some(hash))
    }

    /// The block a read should use: the checkpoint, else the tip, else
    /// `None` for an empty chain. Call once per read.
    pub fn resolve(&self, store: &dyn ChainStore) -> Result<Option<BlockHash>, HeadgateError> {
        if let Some(hash) = self.current() {
            return Ok(Some(hash));
        }
        Ok(store.tip()?.map(|h| h.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockCommit;
    use crate::db::StateDb;

    fn chain(len: u64) -> (StateDb, Vec<BlockHeader>) {
        let db = StateDb::temporary().unwrap();
        let mut headers: Vec<BlockHeader> = Vec::new();
        for i in 0..len {
            let parent = headers.last().map(|h| h.hash);
            let header = BlockHeader::new(i, parent, i as i64, vec![]).unwrap();
            db.append_block(&BlockCommit::new(header.clone())).unwrap();
            headers.push(header);
        }
        (db, headers)
    }

    #[test]
    fn falls_back_to_tip_until_rendered() {
        let (db, headers) = chain(3);
        let cp = RenderCheckpoint::new(1);
        assert_eq!(cp.resolve(&db).unwrap(), Some(headers[2].hash));
    }

    #[test]
    fn trails_tip_by_render_delay() {
        let (db, headers) = chain(4);
        let cp = RenderCheckpoint::new(2);
        let rendered = cp.on_tip_changed(&db, &headers[3]).unwrap();
        assert_eq!(rendered, Some(headers[1].hash));
        assert_eq!(cp.resolve(&db).unwrap(), Some(headers[1].hash));
    }

    #[test]
    fn short_chain_renders_nothing() {
        let (db, headers) = chain(2);
        let cp = RenderCheckpoint::new(5);
        assert_eq!(cp.on_tip_changed(&db, &headers[1]).unwrap(), None);
        assert_eq!(cp.current(), None);
    }

    #[test]
    fn empty_chain_resolves_to_none() {
        let db = StateDb::temporary().unwrap();
        assert_eq!(RenderCheckpoint::new(0).resolve(&db).unwrap(), None);
    }
}
