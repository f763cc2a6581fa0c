use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use headgate_core::error::HeadgateError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Node-level fault categories a client report can escalate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeFaultKind {
    NoAnyPeer,
    DemandTooHigh,
    TipNotChange,
    MessageNotReceived,
    ActionTimeout,
}

/// An escalated client report, as delivered to the node's fault handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFault {
    pub kind: NodeFaultKind,
    pub message: String,
}

pub trait FaultHandler: Send + Sync {
    fn notify(&self, kind: NodeFaultKind, message: &str) -> Result<(), HeadgateError>;
}

/// Fault handler feeding a bounded channel drained by the node.
pub struct ChannelFaultHandler {
    sender: mpsc::Sender<NodeFault>,
}

impl ChannelFaultHandler {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NodeFault>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl FaultHandler for ChannelFaultHandler {
    fn notify(&self, kind: NodeFaultKind, message: &str) -> Result<(), HeadgateError> {
        self.sender
            .try_send(NodeFault {
                kind,
                message: message.to_string(),
            })
            .map_err(|e| HeadgateError::Other(format!("fault handler unavailable: {e}")))
    }
}

/// Client error code → node fault kind.
///
/// Codes are compared as exact strings. The default table maps the client
/// action-timeout codes `"26"` and `"27"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultTable {
    entries: HashMap<String, NodeFaultKind>,
}

impl Default for FaultTable {
    fn default() -> Self {
        Self::from_entries([
            ("26", NodeFaultKind::ActionTimeout),
            ("27", NodeFaultKind::ActionTimeout),
        ])
    }
}

impl FaultTable {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, NodeFaultKind)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(c, k)| (c.into(), k)).collect(),
        }
    }

    /// Parse a JSON object such as `{"26": "ActionTimeout"}`.
    pub fn from_json(json: &str) -> Result<Self, HeadgateError> {
        serde_json::from_str(json).map_err(|e| HeadgateError::Config(format!("fault table: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, HeadgateError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| HeadgateError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn lookup(&self, code: &str) -> Option<NodeFaultKind> {
        self.entries.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns client error reports into node faults.
pub struct FaultRelay {
    table: FaultTable,
    handler: Arc<dyn FaultHandler>,
}

impl FaultRelay {
    pub fn new(table: FaultTable, handler: Arc<dyn FaultHandler>) -> Self {
        Self { table, handler }
    }

    /// Record a client report. The acknowledgement is unconditional: an
    /// unmapped code, or a handler that cannot take the fault, is only logged.
    pub fn report(&self, code: &str, message: &str) -> bool {
        debug!(code, message, "client exception reported");
        match self.table.lookup(code) {
            Some(kind) => {
                info!(code, ?kind, "escalating client exception");
                if let Err(e) = self.handler.notify(kind, message) {
                    warn!(code, ?kind, error = %e, "fault handler rejected report");
                }
            }
            None => debug!(code, "no fault mapped for code"),
        }
        true
    }
}
