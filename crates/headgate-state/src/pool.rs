use std::collections::{BTreeMap, HashMap};

use headgate_core::transaction::Transaction;
use headgate_core::types::{Address, Nonce, TxId};
use parking_lot::RwLock;
use tracing::debug;

use crate::block::BlockCommit;

/// Result of offering a transaction to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// Newly inserted.
    Staged,
    /// The same transaction id is already staged; nothing changed.
    AlreadyStaged,
    /// Another staged transaction from the signer holds this nonce.
    NonceTaken { holder: TxId },
}

#[derive(Default)]
struct PoolInner {
    by_id: HashMap<TxId, Transaction>,
    by_signer: HashMap<Address, BTreeMap<Nonce, TxId>>,
}

impl PoolInner {
    fn remove(&mut self, id: &TxId) -> Option<Transaction> {
        let tx = self.by_id.remove(id)?;
        if let Some(nonces) = self.by_signer.get_mut(&tx.signer) {
            nonces.remove(&tx.nonce);
            if nonces.is_empty() {
                self.by_signer.remove(&tx.signer);
            }
        }
        Some(tx)
    }
}

/// Validated transactions waiting for block production.
///
/// Holds at most one transaction per id and one per `(signer, nonce)`. Every
/// check-and-insert happens under a single write lock.
#[derive(Default)]
pub struct StagedPool {
    inner: RwLock<PoolInner>,
}

impl StagedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tx: Transaction) -> StageOutcome {
        let mut inner = self.inner.write();
        if inner.by_id.contains_key(&tx.id) {
            return StageOutcome::AlreadyStaged;
        }
        let nonces = inner.by_signer.entry(tx.signer).or_default();
        if let Some(holder) = nonces.get(&tx.nonce) {
            return StageOutcome::NonceTaken { holder: *holder };
        }
        nonces.insert(tx.nonce, tx.id);
        debug!(id = %tx.id, nonce = tx.nonce, signer = %tx.signer, "transaction staged");
        inner.by_id.insert(tx.id, tx);
        StageOutcome::Staged
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    /// Snapshot of every staged id.
    pub fn ids(&self) -> Vec<TxId> {
        self.inner.read().by_id.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The staged transaction from `signer` holding `nonce`, if any.
    pub fn holder_of(&self, signer: &Address, nonce: Nonce) -> Option<TxId> {
        self.inner
            .read()
            .by_signer
            .get(signer)
            .and_then(|nonces| nonces.get(&nonce).copied())
    }

    /// Starting from the signer's committed next nonce, skip every nonce
    /// already held by a contiguous run of staged transactions.
    pub fn next_nonce(&self, signer: &Address, committed: Nonce) -> Nonce {
        let inner = self.inner.read();
        let Some(nonces) = inner.by_signer.get(signer) else {
            return committed;
        };
        let mut next = committed;
        for nonce in nonces.range(committed..).map(|(n, _)| *n) {
            if nonce != next {
                break;
            }
            next += 1;
        }
        next
    }

    pub fn remove(&self, ids: &[TxId]) -> usize {
        let mut inner = self.inner.write();
        ids.iter().filter(|id| inner.remove(id).is_some()).count()
    }

    /// Drop what a freshly appended block made obsolete: the transactions it
    /// included and any staged transaction whose nonce it consumed.
    pub fn on_block_committed(&self, commit: &BlockCommit) -> usize {
        let mut inner = self.inner.write();
        let mut removed = 0;
        for committed in &commit.transactions {
            if inner.remove(&committed.id).is_some() {
                removed += 1;
            }
            let stale: Vec<TxId> = inner
                .by_signer
                .get(&committed.signer)
                .map(|nonces| nonces.range(..=committed.nonce).map(|(_, id)| *id).collect())
                .unwrap_or_default();
            for id in stale {
                if inner.remove(&id).is_some() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            debug!(removed, block = %commit.header.hash, "pruned staged transactions");
        }
        removed
    }
}
