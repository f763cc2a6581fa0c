use serde::{Deserialize, Serialize};

use crate::reader::CheckpointInfo;

/// Read checkpoint returned by `headgate_getCheckpoint`.
/// Hashes are hex; fields are null on an empty chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcCheckpoint {
    /// Block reads are evaluated at (the tip until a block is rendered).
    pub checkpoint: Option<String>,
    pub checkpoint_index: Option<u64>,
    pub tip: Option<String>,
    pub tip_index: Option<u64>,
}

impl From<CheckpointInfo> for RpcCheckpoint {
    fn from(info: CheckpointInfo) -> Self {
        let rendered = info.checkpoint.is_some();
        Self {
            checkpoint: info.checkpoint.or(info.tip).map(|h| h.to_hex()),
            checkpoint_index: if rendered {
                info.checkpoint_index
            } else {
                info.tip_index
            },
            tip: info.tip.map(|h| h.to_hex()),
            tip_index: info.tip_index,
        }
    }
}

/// A freshly opened session, returned by `headgate_openSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSession {
    pub session_id: u64,
    /// RFC 3339 UTC.
    pub opened_at: String,
}
