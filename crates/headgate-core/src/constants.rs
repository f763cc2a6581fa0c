/// ─── Headgate constants ─────────────────────────────────────────────────────

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of a transaction id or block hash in bytes.
pub const HASH_LEN: usize = 32;

// ── Wire encoding ────────────────────────────────────────────────────────────

/// Encoding of `Value::Null`, the one sentinel returned by `getState` when no
/// state is recorded for an address at the checkpoint.
///
/// bincode writes an enum as its little-endian `u32` variant index, and
/// `Null` is variant 0.
pub const ABSENT_STATE_BYTES: [u8; 4] = [0, 0, 0, 0];

/// Upper bound on any single decoded wire payload (1 MiB).
pub const MAX_WIRE_BYTES: u64 = 1 << 20;

/// Upper bound on an encoded currency descriptor.
pub const MAX_CURRENCY_BYTES: usize = 4096;

/// Deepest `List`/`Dictionary` nesting a decoded `Value` may have. Decoding
/// recurses once per level, so this bounds stack use on untrusted input.
pub const MAX_VALUE_DEPTH: usize = 64;

/// Dictionary keys of a serialized currency.
pub const CURRENCY_TICKER_KEY: &str = "ticker";
pub const CURRENCY_DECIMALS_KEY: &str = "decimals";
pub const CURRENCY_MINTERS_KEY: &str = "minters";

// ── Intake ───────────────────────────────────────────────────────────────────

/// Default number of nonces past the next expected one that intake accepts.
/// Zero means a signer's transactions must arrive strictly in sequence.
pub const DEFAULT_NONCE_WINDOW: u64 = 0;

/// Default capacity of the outbound transaction announcement queue.
pub const DEFAULT_BROADCAST_QUEUE: usize = 512;

// ── Checkpoint ───────────────────────────────────────────────────────────────

/// Default number of blocks the rendered checkpoint trails the tip by.
pub const DEFAULT_RENDER_DELAY: u64 = 0;
