//! headgate-state
//!
//! The node-side collaborators the gateway reads from and writes into:
//! the sled-backed chain store, the staging pool of validated transactions,
//! and the rendered checkpoint that pins reads behind the tip.

pub mod block;
pub mod checkpoint;
pub mod commit;
pub mod db;
pub mod pool;
pub mod store;

pub use block::{BlockCommit, BlockHeader, CommittedTx};
pub use checkpoint::RenderCheckpoint;
pub use commit::ChainWriter;
pub use db::StateDb;
pub use pool::{StageOutcome, StagedPool};
pub use store::ChainStore;
