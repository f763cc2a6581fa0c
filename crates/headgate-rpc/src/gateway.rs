use std::sync::Arc;

use headgate_core::currency::Currency;
use headgate_core::error::HeadgateError;
use headgate_core::types::{Address, Nonce, TxId};
use headgate_state::{ChainStore, RenderCheckpoint, StagedPool};
use tracing::{debug, error};

use crate::broadcast::Broadcaster;
use crate::fault::{FaultHandler, FaultRelay, FaultTable};
use crate::intake::{IntakePolicy, TxIntake};
use crate::reader::{ChainReader, CheckpointInfo};
use crate::session::{SessionContext, SessionId, SessionRegistry};

/// Everything the gateway needs from the node, passed in explicitly.
pub struct GatewayContext {
    pub store: Arc<dyn ChainStore>,
    pub pool: Arc<StagedPool>,
    pub checkpoint: Arc<RenderCheckpoint>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub fault_handler: Arc<dyn FaultHandler>,
    pub fault_table: FaultTable,
    pub sessions: Arc<SessionRegistry>,
    pub policy: IntakePolicy,
}

/// The client-facing operations, over raw wire bytes.
///
/// Transport concerns (hex, JSON-RPC error codes) live in `server`.
pub struct Gateway {
    reader: Arc<ChainReader>,
    intake: TxIntake,
    faults: FaultRelay,
    sessions: Arc<SessionRegistry>,
}

/// Log a failed operation before handing the error back to the caller.
fn logged<T>(op: &'static str, result: Result<T, HeadgateError>) -> Result<T, HeadgateError> {
    if let Err(e) = &result {
        error!(op, error = %e, "gateway operation failed");
    }
    result
}

impl Gateway {
    pub fn new(ctx: GatewayContext) -> Self {
        let reader = Arc::new(ChainReader::new(ctx.store, ctx.pool, ctx.checkpoint));
        Self {
            intake: TxIntake::new(reader.clone(), ctx.broadcaster, ctx.policy),
            faults: FaultRelay::new(ctx.fault_table, ctx.fault_handler),
            sessions: ctx.sessions,
            reader,
        }
    }

    pub fn reader(&self) -> &ChainReader {
        &self.reader
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn put_transaction(&self, tx_bytes: &[u8]) -> Result<bool, HeadgateError> {
        logged("putTransaction", self.intake.put_transaction(tx_bytes))
    }

    /// Encoded state of `address` at the checkpoint; `ABSENT_STATE_BYTES`
    /// when nothing is stored.
    pub fn get_state(&self, address_bytes: &[u8]) -> Result<Vec<u8>, HeadgateError> {
        let run = || -> Result<Vec<u8>, HeadgateError> {
            let address = Address::from_slice(address_bytes)?;
            self.reader.state(&address)?.encode()
        };
        logged("getState", run())
    }

    /// Encoded `[currency, raw amount]` pair at the checkpoint.
    pub fn get_balance(
        &self,
        address_bytes: &[u8],
        currency_bytes: &[u8],
    ) -> Result<Vec<u8>, HeadgateError> {
        let run = || -> Result<Vec<u8>, HeadgateError> {
            let address = Address::from_slice(address_bytes)?;
            let currency = Currency::decode(currency_bytes)?;
            self.reader.balance(&address, currency)?.encode()
        };
        logged("getBalance", run())
    }

    pub fn get_next_tx_nonce(&self, address_bytes: &[u8]) -> Result<Nonce, HeadgateError> {
        let run = || -> Result<Nonce, HeadgateError> {
            let address = Address::from_slice(address_bytes)?;
            self.reader.next_tx_nonce(&address)
        };
        logged("getNextTxNonce", run())
    }

    pub fn open_session(&self) -> Arc<SessionContext> {
        self.sessions.open()
    }

    pub fn close_session(&self, id: SessionId) -> bool {
        self.sessions.close(id)
    }

    /// Replace the session's subscription set. All addresses must decode
    /// before anything changes.
    pub fn set_addresses_to_subscribe(
        &self,
        session: SessionId,
        addresses: &[Vec<u8>],
    ) -> Result<bool, HeadgateError> {
        let run = || -> Result<bool, HeadgateError> {
            let ctx = self
                .sessions
                .get(session)
                .ok_or(HeadgateError::UnknownSession(session))?;
            let parsed = addresses
                .iter()
                .map(|a| Address::from_slice(a))
                .collect::<Result<Vec<_>, _>>()?;
            let count = ctx.set_addresses(parsed);
            debug!(session, addresses = count, "subscriptions replaced");
            Ok(true)
        };
        logged("setAddressesToSubscribe", run())
    }

    pub fn is_transaction_staged(&self, tx_id_bytes: &[u8]) -> Result<bool, HeadgateError> {
        let run = || -> Result<bool, HeadgateError> {
            let id = TxId::from_slice(tx_id_bytes)?;
            Ok(self.reader.is_staged(&id))
        };
        logged("isTransactionStaged", run())
    }

    pub fn report_exception(&self, code: &str, message: &str) -> bool {
        self.faults.report(code, message)
    }

    pub fn staged_transaction_ids(&self) -> Vec<TxId> {
        self.reader.staged_ids()
    }

    pub fn checkpoint(&self) -> Result<CheckpointInfo, HeadgateError> {
        logged("getCheckpoint", self.reader.checkpoint_info())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;

    use headgate_core::constants::ABSENT_STATE_BYTES;
    use headgate_core::currency::FungibleAssetValue;
    use headgate_core::transaction::{Action, Transaction};
    use headgate_core::value::Value;
    use headgate_crypto::{sign_transaction, KeyPair, UnsignedTx};
    use headgate_state::{BlockCommit, BlockHeader, StateDb};
    use parking_lot::Mutex;

    use crate::fault::{NodeFault, NodeFaultKind};

    #[derive(Default)]
    pub(crate) struct RecordingBroadcaster(pub Mutex<Vec<TxId>>);

    impl Broadcaster for RecordingBroadcaster {
        fn announce(&self, tx: &Transaction) -> Result<(), HeadgateError> {
            self.0.lock().push(tx.id);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingFaults(pub Mutex<Vec<NodeFault>>);

    impl FaultHandler for RecordingFaults {
        fn notify(&self, kind: NodeFaultKind, message: &str) -> Result<(), HeadgateError> {
            self.0.lock().push(NodeFault {
                kind,
                message: message.into(),
            });
            Ok(())
        }
    }

    pub(crate) struct Fixture {
        pub gateway: Arc<Gateway>,
        pub broadcasts: Arc<RecordingBroadcaster>,
        pub faults: Arc<RecordingFaults>,
        pub pool: Arc<StagedPool>,
        pub rich: KeyPair,
    }

    pub(crate) fn gold() -> Currency {
        Currency::new("GOLD", 2)
    }

    /// Genesis gives `rich` 1000 GOLD and a stored state value.
    pub(crate) fn fixture() -> Fixture {
        let rich = KeyPair::generate();
        let db = Arc::new(StateDb::temporary().unwrap());
        let g = BlockHeader::new(0, None, 0, vec![]).unwrap();
        db.append_block(
            &BlockCommit::new(g)
                .with_balance(rich.address, FungibleAssetValue::new(gold(), 1000))
                .with_state(rich.address, Value::Text("hero".into())),
        )
        .unwrap();

        let pool = Arc::new(StagedPool::new());
        let broadcasts = Arc::new(RecordingBroadcaster::default());
        let faults = Arc::new(RecordingFaults::default());
        let gateway = Arc::new(Gateway::new(GatewayContext {
            store: db,
            pool: pool.clone(),
            checkpoint: Arc::new(RenderCheckpoint::new(0)),
            broadcaster: broadcasts.clone(),
            fault_handler: faults.clone(),
            fault_table: FaultTable::default(),
            sessions: Arc::new(SessionRegistry::new()),
            policy: IntakePolicy::default(),
        }));
        Fixture {
            gateway,
            broadcasts,
            faults,
            pool,
            rich,
        }
    }

    pub(crate) fn signed(kp: &KeyPair, nonce: u64, actions: Vec<Action>) -> Transaction {
        sign_transaction(
            kp,
            UnsignedTx {
                nonce,
                genesis_hash: None,
                timestamp: 1_700_000_000,
                actions,
            },
        )
        .unwrap()
    }

    #[test]
    fn valid_transaction_is_staged_and_advances_nonce() {
        let f = fixture();
        let addr = f.rich.address;
        assert_eq!(f.gateway.get_next_tx_nonce(addr.as_bytes()).unwrap(), 0);

        let tx = signed(&f.rich, 0, vec![Action::Noop]);
        assert!(f.gateway.put_transaction(&tx.encode().unwrap()).unwrap());
        assert!(f.gateway.is_transaction_staged(tx.id.as_bytes()).unwrap());
        assert_eq!(f.gateway.get_next_tx_nonce(addr.as_bytes()).unwrap(), 1);
        assert_eq!(*f.broadcasts.0.lock(), vec![tx.id]);
    }

    #[test]
    fn concurrent_submissions_for_one_nonce_stage_exactly_one() {
        let f = fixture();
        let rivals: Vec<Vec<u8>> = (0..8)
            .map(|i| {
                signed(&f.rich, 0, vec![Action::SetState { value: Value::Integer(i) }])
                    .encode()
                    .unwrap()
            })
            .collect();

        let barrier = std::sync::Barrier::new(rivals.len());
        let accepted: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = rivals
                .iter()
                .map(|bytes| {
                    let gateway = &f.gateway;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        gateway.put_transaction(bytes).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(accepted.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(f.pool.len(), 1);
        assert_eq!(*f.broadcasts.0.lock(), f.pool.ids());
        assert_eq!(f.gateway.get_next_tx_nonce(f.rich.address.as_bytes()).unwrap(), 1);
    }

    #[test]
    fn reused_nonce_is_refused_and_pool_unchanged() {
        let f = fixture();
        let first = signed(&f.rich, 0, vec![Action::Noop]);
        assert!(f.gateway.put_transaction(&first.encode().unwrap()).unwrap());

        let rival = signed(&f.rich, 0, vec![]);
        assert!(!f.gateway.put_transaction(&rival.encode().unwrap()).unwrap());
        assert_eq!(f.pool.ids(), vec![first.id]);
        assert!(!f.gateway.is_transaction_staged(rival.id.as_bytes()).unwrap());
        assert_eq!(f.broadcasts.0.lock().len(), 1);
    }

    #[test]
    fn resubmission_and_conflict_at_nonce_five() {
        let f = fixture();
        for n in 0..5 {
            let tx = signed(&f.rich, n, vec![Action::Noop]);
            assert!(f.gateway.put_transaction(&tx.encode().unwrap()).unwrap());
        }
        let five = signed(&f.rich, 5, vec![Action::Noop]);
        let bytes = five.encode().unwrap();
        assert!(f.gateway.put_transaction(&bytes).unwrap());
        assert!(f.gateway.put_transaction(&bytes).unwrap());

        let other = signed(
            &f.rich,
            5,
            vec![Action::SetState {
                value: Value::Integer(5),
            }],
        );
        assert!(!f.gateway.put_transaction(&other.encode().unwrap()).unwrap());
        assert_eq!(f.broadcasts.0.lock().len(), 6);
        assert_eq!(f.gateway.get_next_tx_nonce(f.rich.address.as_bytes()).unwrap(), 6);
    }

    #[test]
    fn malformed_transaction_fails_the_call() {
        let f = fixture();
        assert!(matches!(
            f.gateway.put_transaction(b"not a transaction"),
            Err(HeadgateError::Decode(_))
        ));
        assert!(f.pool.is_empty());
    }

    #[test]
    fn state_reads_encode_values() {
        let f = fixture();
        let got = f.gateway.get_state(f.rich.address.as_bytes()).unwrap();
        assert_eq!(Value::decode(&got).unwrap(), Value::Text("hero".into()));

        let nobody = Address::from_bytes([0xee; 20]);
        assert_eq!(
            f.gateway.get_state(nobody.as_bytes()).unwrap(),
            ABSENT_STATE_BYTES.to_vec()
        );
        assert!(matches!(
            f.gateway.get_state(&[1, 2, 3]),
            Err(HeadgateError::Decode(_))
        ));
    }

    #[test]
    fn balance_echoes_requested_currency() {
        let f = fixture();
        let silver = Currency::new("SILVER", 0);
        let nobody = Address::from_bytes([0xee; 20]);

        let got = f
            .gateway
            .get_balance(nobody.as_bytes(), &silver.encode().unwrap())
            .unwrap();
        assert_eq!(got, FungibleAssetValue::zero(silver).encode().unwrap());

        let got = f
            .gateway
            .get_balance(f.rich.address.as_bytes(), &gold().encode().unwrap())
            .unwrap();
        assert_eq!(got, FungibleAssetValue::new(gold(), 1000).encode().unwrap());

        assert!(matches!(
            f.gateway.get_balance(nobody.as_bytes(), &[0xff]),
            Err(HeadgateError::Decode(_))
        ));
    }

    #[test]
    fn subscriptions_replace_per_session() {
        let f = fixture();
        let (a, b, c) = (
            Address::from_bytes([1; 20]),
            Address::from_bytes([2; 20]),
            Address::from_bytes([3; 20]),
        );
        let s = f.gateway.open_session();
        assert!(f
            .gateway
            .set_addresses_to_subscribe(s.id(), &[a.as_bytes().to_vec(), b.as_bytes().to_vec()])
            .unwrap());
        assert!(f
            .gateway
            .set_addresses_to_subscribe(s.id(), &[c.as_bytes().to_vec()])
            .unwrap());
        assert_eq!(s.addresses(), HashSet::from([c]));

        // A bad address leaves the previous set in place.
        assert!(f
            .gateway
            .set_addresses_to_subscribe(s.id(), &[vec![0; 3]])
            .is_err());
        assert_eq!(s.addresses(), HashSet::from([c]));

        assert!(f.gateway.close_session(s.id()));
        assert!(matches!(
            f.gateway.set_addresses_to_subscribe(s.id(), &[]),
            Err(HeadgateError::UnknownSession(_))
        ));
    }

    #[test]
    fn exception_reports_escalate_only_mapped_codes() {
        let f = fixture();
        assert!(f.gateway.report_exception("99", "whatever"));
        assert!(f.faults.0.lock().is_empty());

        assert!(f.gateway.report_exception("27", "timeout"));
        assert_eq!(
            *f.faults.0.lock(),
            vec![NodeFault {
                kind: NodeFaultKind::ActionTimeout,
                message: "timeout".into()
            }]
        );
    }

    #[test]
    fn malformed_tx_id_is_a_decode_error() {
        let f = fixture();
        assert!(matches!(
            f.gateway.is_transaction_staged(&[0; 31]),
            Err(HeadgateError::Decode(_))
        ));
        assert!(!f.gateway.is_transaction_staged(&[0; 32]).unwrap());
    }
}
