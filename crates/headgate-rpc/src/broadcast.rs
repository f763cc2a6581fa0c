use headgate_core::error::HeadgateError;
use headgate_core::transaction::Transaction;
use headgate_core::types::TxId;
use tokio::sync::mpsc;

/// Announces newly staged transactions to the peer network.
pub trait Broadcaster: Send + Sync {
    fn announce(&self, tx: &Transaction) -> Result<(), HeadgateError>;
}

/// What the gossip layer receives for each staged transaction.
/// `payload` is the transaction's wire encoding.
#[derive(Debug, Clone)]
pub struct TxAnnouncement {
    pub tx_id: TxId,
    pub payload: Vec<u8>,
}

/// Broadcaster that hands announcements to the transport over a bounded
/// channel. Never waits: a full or closed queue is reported as an error.
pub struct ChannelBroadcaster {
    sender: mpsc::Sender<TxAnnouncement>,
}

impl ChannelBroadcaster {
    pub fn new(sender: mpsc::Sender<TxAnnouncement>) -> Self {
        Self { sender }
    }

    /// Build a broadcaster and the receiver the transport drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TxAnnouncement>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn announce(&self, tx: &Transaction) -> Result<(), HeadgateError> {
        let announcement = TxAnnouncement {
            tx_id: tx.id,
            payload: tx.encode()?,
        };
        self.sender
            .try_send(announcement)
            .map_err(|e| HeadgateError::Broadcast(e.to_string()))
    }
}
