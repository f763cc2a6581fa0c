//! headgate-rpc
//!
//! Client gateway for a Headgate node: transaction intake, state and
//! balance reads at the render checkpoint, per-session subscriptions and
//! client fault reports, served over JSON-RPC 2.0.
//!
//! Namespace: "headgate"
//! Methods:
//!   headgate_putTransaction          — stage and announce a signed transaction
//!   headgate_getState                — encoded state at the checkpoint
//!   headgate_getBalance              — encoded [currency, amount] at the checkpoint
//!   headgate_getNextTxNonce          — next nonce, counting staged transactions
//!   headgate_openSession             — open a subscription session
//!   headgate_closeSession            — close it
//!   headgate_setAddressesToSubscribe — replace a session's address set
//!   headgate_isTransactionStaged     — staging pool membership
//!   headgate_reportException         — client error report, maybe escalated
//!   headgate_getStagedTransactionIds — staging pool contents
//!   headgate_getCheckpoint           — where reads are pinned

pub mod api;
pub mod broadcast;
pub mod fault;
pub mod gateway;
pub mod intake;
pub mod reader;
pub mod server;
pub mod session;
pub mod types;
pub mod validation;

pub use broadcast::{Broadcaster, ChannelBroadcaster, TxAnnouncement};
pub use fault::{ChannelFaultHandler, FaultHandler, FaultRelay, FaultTable, NodeFault, NodeFaultKind};
pub use gateway::{Gateway, GatewayContext};
pub use intake::{IntakePolicy, TxIntake};
pub use reader::{ChainReader, CheckpointInfo};
pub use server::RpcServer;
pub use session::{SessionContext, SessionId, SessionRegistry};
pub use types::{RpcCheckpoint, RpcSession};
