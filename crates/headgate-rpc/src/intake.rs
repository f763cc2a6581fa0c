use std::sync::Arc;

use headgate_core::constants::DEFAULT_NONCE_WINDOW;
use headgate_core::error::{HeadgateError, InvalidTxError};
use headgate_core::transaction::Transaction;
use headgate_state::StageOutcome;
use tracing::{debug, warn};

use crate::broadcast::Broadcaster;
use crate::reader::ChainReader;
use crate::validation::{ensure_not_committed, validate_against_chain, validate_intrinsic};

#[derive(Debug, Clone, Copy)]
pub struct IntakePolicy {
    /// How far past the next expected nonce a transaction may run.
    pub nonce_window: u64,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            nonce_window: DEFAULT_NONCE_WINDOW,
        }
    }
}

/// Decode → validate → stage → announce.
pub struct TxIntake {
    reader: Arc<ChainReader>,
    broadcaster: Arc<dyn Broadcaster>,
    policy: IntakePolicy,
}

impl TxIntake {
    pub fn new(
        reader: Arc<ChainReader>,
        broadcaster: Arc<dyn Broadcaster>,
        policy: IntakePolicy,
    ) -> Self {
        Self {
            reader,
            broadcaster,
            policy,
        }
    }

    /// Accept a wire-encoded transaction.
    ///
    /// `Ok(false)` means validation refused it and nothing changed.
    /// Undecodable bytes and infrastructure failures are errors.
    pub fn put_transaction(&self, tx_bytes: &[u8]) -> Result<bool, HeadgateError> {
        let tx = Transaction::decode(tx_bytes)?;
        match self.admit(tx) {
            Err(HeadgateError::InvalidTx(reason)) => {
                warn!(error = %reason, "transaction rejected");
                Ok(false)
            }
            other => other,
        }
    }

    fn admit(&self, tx: Transaction) -> Result<bool, HeadgateError> {
        let actions = validate_intrinsic(&tx)?;

        // Re-submitting a staged transaction succeeds without a second announcement.
        if self.reader.is_staged(&tx.id) {
            debug!(tx_id = %tx.id, "transaction already staged");
            return Ok(true);
        }

        validate_against_chain(&tx, &self.reader, self.policy.nonce_window)?;

        debug!(
            nonce = tx.nonce,
            tx_id = %tx.id,
            signer = %tx.signer,
            actions = actions.len(),
            "putTransaction"
        );

        match self.reader.pool().insert(tx.clone()) {
            StageOutcome::Staged => {}
            StageOutcome::AlreadyStaged => return Ok(true),
            StageOutcome::NonceTaken { holder } => {
                debug!(tx_id = %tx.id, %holder, "lost nonce race");
                return Err(InvalidTxError::NonceAlreadyStaged(tx.nonce).into());
            }
        }

        // A block may have landed since the chain checks; its prune would
        // have missed this insert.
        if let Err(e) = ensure_not_committed(&tx, self.reader.store()) {
            self.reader.pool().remove(&[tx.id]);
            return Err(e);
        }
        debug!(staged = self.reader.pool().len(), "staged transaction pool");

        // Staging stands even if the announcement does not go out.
        if let Err(e) = self.broadcaster.announce(&tx) {
            warn!(tx_id = %tx.id, error = %e, "broadcast failed");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use headgate_core::currency::Currency;
    use headgate_core::transaction::Action;
    use headgate_core::types::{Address, BlockHash, Nonce, TxId};
    use headgate_core::value::Value;
    use headgate_crypto::{sign_transaction, tx_id_from_body, KeyPair, UnsignedTx};
    use headgate_state::{BlockCommit, BlockHeader, ChainStore, RenderCheckpoint, StagedPool, StateDb};

    use crate::broadcast::ChannelBroadcaster;

    struct FailingBroadcaster;

    impl Broadcaster for FailingBroadcaster {
        fn announce(&self, _tx: &Transaction) -> Result<(), HeadgateError> {
            Err(HeadgateError::Broadcast("no peers".into()))
        }
    }

    fn reader() -> Arc<ChainReader> {
        let db = Arc::new(StateDb::temporary().unwrap());
        db.append_block(&BlockCommit::new(BlockHeader::new(0, None, 0, vec![]).unwrap()))
            .unwrap();
        Arc::new(ChainReader::new(
            db,
            Arc::new(StagedPool::new()),
            Arc::new(RenderCheckpoint::new(0)),
        ))
    }

    fn tx(kp: &KeyPair, nonce: u64) -> Transaction {
        sign_transaction(
            kp,
            UnsignedTx {
                nonce,
                genesis_hash: None,
                timestamp: 1_700_000_000,
                actions: vec![Action::Noop],
            },
        )
        .unwrap()
    }

    #[test]
    fn staged_transaction_is_announced_once() {
        let (b, mut rx) = ChannelBroadcaster::channel(8);
        let intake = TxIntake::new(reader(), Arc::new(b), IntakePolicy::default());
        let kp = KeyPair::generate();
        let bytes = tx(&kp, 0).encode().unwrap();

        assert!(intake.put_transaction(&bytes).unwrap());
        assert!(intake.put_transaction(&bytes).unwrap());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcast_failure_keeps_transaction_staged() {
        let reader = reader();
        let intake = TxIntake::new(reader.clone(), Arc::new(FailingBroadcaster), IntakePolicy::default());
        let kp = KeyPair::generate();
        let t = tx(&kp, 0);

        assert!(intake.put_transaction(&t.encode().unwrap()).unwrap());
        assert!(reader.is_staged(&t.id));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let (b, _rx) = ChannelBroadcaster::channel(1);
        let intake = TxIntake::new(reader(), Arc::new(b), IntakePolicy::default());
        assert!(matches!(
            intake.put_transaction(&[0xde, 0xad]),
            Err(HeadgateError::Decode(_))
        ));
    }

    #[test]
    fn deeply_nested_payload_is_refused() {
        let (b, mut rx) = ChannelBroadcaster::channel(1);
        let reader = reader();
        let intake = TxIntake::new(reader.clone(), Arc::new(b), IntakePolicy::default());
        let kp = KeyPair::generate();

        // [SetState { value: List[List[...List[Null]...]] }], 70k levels.
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u64.to_le_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());
        for _ in 0..70_000 {
            payload.extend_from_slice(&5u32.to_le_bytes());
            payload.extend_from_slice(&1u64.to_le_bytes());
        }
        payload.extend_from_slice(&0u32.to_le_bytes());

        let mut t = tx(&kp, 0);
        t.payload = payload;
        let body = t.body_bytes().unwrap();
        t.id = tx_id_from_body(&body);
        t.signature = kp.sign(&body).unwrap();

        assert!(!intake.put_transaction(&t.encode().unwrap()).unwrap());
        assert!(!reader.is_staged(&t.id));
        assert!(rx.try_recv().is_err());
    }

    /// Reports a transaction as committed from the second lookup on, as if a
    /// block landed between the chain checks and staging.
    struct CommitsMidIntake {
        inner: StateDb,
        lookups: AtomicUsize,
    }

    impl ChainStore for CommitsMidIntake {
        fn genesis_hash(&self) -> Result<Option<BlockHash>, HeadgateError> {
            self.inner.genesis_hash()
        }
        fn tip(&self) -> Result<Option<BlockHeader>, HeadgateError> {
            self.inner.tip()
        }
        fn block(&self, hash: &BlockHash) -> Result<Option<BlockHeader>, HeadgateError> {
            self.inner.block(hash)
        }
        fn block_hash_at(&self, index: u64) -> Result<Option<BlockHash>, HeadgateError> {
            self.inner.block_hash_at(index)
        }
        fn state_at(&self, at: &BlockHash, address: &Address) -> Result<Option<Value>, HeadgateError> {
            self.inner.state_at(at, address)
        }
        fn balance_at(
            &self,
            at: &BlockHash,
            address: &Address,
            currency: &Currency,
        ) -> Result<i128, HeadgateError> {
            self.inner.balance_at(at, address, currency)
        }
        fn next_nonce(&self, address: &Address) -> Result<Nonce, HeadgateError> {
            self.inner.next_nonce(address)
        }
        fn is_committed(&self, _id: &TxId) -> Result<bool, HeadgateError> {
            Ok(self.lookups.fetch_add(1, Ordering::SeqCst) > 0)
        }
    }

    #[test]
    fn transaction_committed_during_intake_is_not_left_staged() {
        let inner = StateDb::temporary().unwrap();
        inner
            .append_block(&BlockCommit::new(BlockHeader::new(0, None, 0, vec![]).unwrap()))
            .unwrap();
        let store = Arc::new(CommitsMidIntake {
            inner,
            lookups: AtomicUsize::new(0),
        });
        let reader = Arc::new(ChainReader::new(
            store.clone(),
            Arc::new(StagedPool::new()),
            Arc::new(RenderCheckpoint::new(0)),
        ));
        let (b, mut rx) = ChannelBroadcaster::channel(1);
        let intake = TxIntake::new(reader.clone(), Arc::new(b), IntakePolicy::default());
        let t = tx(&KeyPair::generate(), 0);

        assert!(!intake.put_transaction(&t.encode().unwrap()).unwrap());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
        assert!(!reader.is_staged(&t.id));
        assert!(reader.pool().is_empty());
        assert!(rx.try_recv().is_err());
    }
}
