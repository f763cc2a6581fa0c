//! headgate-node — a node exposing the Headgate client gateway.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh, else pin the read checkpoint
//!   3. Route block commits through one writer (append, prune, checkpoint)
//!   4. Wire the gateway to the broadcast and fault queues
//!   5. Start the JSON-RPC 2.0 server
//!   6. Drain broadcasts and faults until Ctrl-C

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use headgate_core::constants::{DEFAULT_BROADCAST_QUEUE, DEFAULT_NONCE_WINDOW, DEFAULT_RENDER_DELAY};
use headgate_genesis::{apply_genesis, GenesisParams};
use headgate_rpc::{
    ChannelBroadcaster, ChannelFaultHandler, FaultTable, Gateway, GatewayContext, IntakePolicy,
    NodeFault, RpcServer, SessionRegistry, TxAnnouncement,
};
use headgate_state::{ChainStore, ChainWriter, RenderCheckpoint, StagedPool, StateDb};

const FAULT_QUEUE: usize = 64;

#[derive(Parser, Debug)]
#[command(
    name = "headgate-node",
    version,
    about = "Headgate node — client gateway for staging transactions and reading chain state"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.headgate/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only read on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// JSON object mapping client error codes to node fault kinds.
    #[arg(long)]
    fault_table: Option<PathBuf>,

    /// How many blocks reads trail the tip.
    #[arg(long, default_value_t = DEFAULT_RENDER_DELAY)]
    render_delay: u64,

    /// How far past the next expected nonce a submission may run.
    #[arg(long, default_value_t = DEFAULT_NONCE_WINDOW)]
    nonce_window: u64,

    /// Capacity of the outbound announcement queue.
    #[arg(long, default_value_t = DEFAULT_BROADCAST_QUEUE)]
    broadcast_queue: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,headgate=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Headgate node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);
    let pool = Arc::new(StagedPool::new());
    let checkpoint = Arc::new(RenderCheckpoint::new(args.render_delay));
    // Blocks from the external producer must go through `writer.commit`.
    let writer = ChainWriter::new(db.clone(), pool.clone(), checkpoint.clone());

    // ── Genesis if fresh, else pin the read checkpoint ────────────────────────
    if let Some(tip) = db.tip().context("reading tip")? {
        info!(index = tip.index, hash = %tip.hash, "existing database found — skipping genesis");
        writer.resume().context("pinning read checkpoint")?;
    } else {
        info!("fresh database — applying genesis");
        let params = load_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&writer, &params).context("applying genesis")?;
    }
    match checkpoint.current() {
        Some(hash) => info!(%hash, render_delay = args.render_delay, "read checkpoint set"),
        None => info!(render_delay = args.render_delay, "chain shorter than render delay — reading at tip"),
    }

    // ── Collaborator queues ───────────────────────────────────────────────────
    let fault_table = match &args.fault_table {
        Some(path) => FaultTable::load(path).context("loading fault table")?,
        None => FaultTable::default(),
    };
    info!(entries = fault_table.len(), "fault table loaded");

    let (broadcaster, announcements) = ChannelBroadcaster::channel(args.broadcast_queue);
    let (fault_handler, faults) = ChannelFaultHandler::channel(FAULT_QUEUE);
    tokio::spawn(drain_announcements(announcements));
    tokio::spawn(drain_faults(faults));

    // ── Gateway + RPC server ──────────────────────────────────────────────────
    let gateway = Arc::new(Gateway::new(GatewayContext {
        store: db.clone(),
        pool,
        checkpoint,
        broadcaster: Arc::new(broadcaster),
        fault_handler: Arc::new(fault_handler),
        fault_table,
        sessions: Arc::new(SessionRegistry::new()),
        policy: IntakePolicy {
            nonce_window: args.nonce_window,
        },
    }));
    let (_, rpc_handle) = RpcServer::new(gateway)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!("node ready");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("shutting down");
    if rpc_handle.stop().is_err() {
        warn!("RPC server already stopped");
    }
    db.flush().context("flushing state database")?;
    Ok(())
}

/// The gossip transport is external; announcements are handed off here.
async fn drain_announcements(mut rx: mpsc::Receiver<TxAnnouncement>) {
    while let Some(a) = rx.recv().await {
        info!(tx_id = %a.tx_id, bytes = a.payload.len(), "announcing staged transaction");
    }
}

async fn drain_faults(mut rx: mpsc::Receiver<NodeFault>) {
    while let Some(fault) = rx.recv().await {
        warn!(kind = ?fault.kind, message = %fault.message, "node fault reported by client");
    }
}

/// Load genesis parameters from a JSON file, or start from an empty genesis
/// if no path is given.
fn load_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading genesis params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing genesis params JSON");
    }
    warn!("No --genesis-params provided. Starting from an empty genesis — DO NOT USE IN PRODUCTION.");
    Ok(GenesisParams {
        timestamp: chrono::Utc::now().timestamp(),
        ..GenesisParams::default()
    })
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
