use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcCheckpoint, RpcSession};

/// Headgate JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "headgate_" via `namespace = "headgate"`.
/// Binary arguments and results are hex strings (an optional `0x` prefix is accepted).
#[rpc(server, namespace = "headgate")]
pub trait HeadgateApi {
    /// Submit a signed transaction. `tx_hex` is the hex wire encoding.
    /// `false` means it failed validation; malformed bytes are an error.
    #[method(name = "putTransaction")]
    async fn put_transaction(&self, tx_hex: String) -> RpcResult<bool>;

    /// Encoded state value of an address at the read checkpoint.
    #[method(name = "getState")]
    async fn get_state(&self, address: String) -> RpcResult<String>;

    /// Encoded `[currency, amount]` for an address and an encoded currency.
    #[method(name = "getBalance")]
    async fn get_balance(&self, address: String, currency: String) -> RpcResult<String>;

    #[method(name = "getNextTxNonce")]
    async fn get_next_tx_nonce(&self, address: String) -> RpcResult<u64>;

    #[method(name = "openSession")]
    async fn open_session(&self) -> RpcResult<RpcSession>;

    #[method(name = "closeSession")]
    async fn close_session(&self, session_id: u64) -> RpcResult<bool>;

    /// Replace the session's subscription set with `addresses`.
    #[method(name = "setAddressesToSubscribe")]
    async fn set_addresses_to_subscribe(
        &self,
        session_id: u64,
        addresses: Vec<String>,
    ) -> RpcResult<bool>;

    #[method(name = "isTransactionStaged")]
    async fn is_transaction_staged(&self, tx_id: String) -> RpcResult<bool>;

    /// Report a client-side error. Always acknowledged.
    #[method(name = "reportException")]
    async fn report_exception(&self, code: String, message: String) -> RpcResult<bool>;

    // ── Node introspection ────────────────────────────────────────────────────

    #[method(name = "getStagedTransactionIds")]
    async fn get_staged_transaction_ids(&self) -> RpcResult<Vec<String>>;

    #[method(name = "getCheckpoint")]
    async fn get_checkpoint(&self) -> RpcResult<RpcCheckpoint>;
}
