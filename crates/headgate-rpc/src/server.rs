use std::net::SocketAddr;
use std::sync::Arc;

use headgate_core::error::HeadgateError;
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::api::HeadgateApiServer;
use crate::gateway::Gateway;
use crate::types::{RpcCheckpoint, RpcSession};

const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Client input problems are invalid params; everything else is internal.
fn to_rpc_err(e: HeadgateError) -> ErrorObject<'static> {
    match e {
        HeadgateError::Decode(_) | HeadgateError::UnknownSession(_) => {
            rpc_err(INVALID_PARAMS, e.to_string())
        }
        _ => rpc_err(INTERNAL_ERROR, e.to_string()),
    }
}

fn from_hex(what: &str, s: &str) -> RpcResult<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| {
        error!(what, error = %e, "hex decode failed");
        rpc_err(INVALID_PARAMS, format!("invalid {what} hex: {e}"))
    })
}

/// The RPC server implementation.
pub struct RpcServer {
    gateway: Arc<Gateway>,
}

impl RpcServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address and a
    /// handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let middleware = tower::ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;
        let bound = server.local_addr()?;
        let handle = server.start(self.into_rpc());
        info!(addr = %bound, "RPC server started");
        Ok((bound, handle))
    }
}

#[async_trait]
impl HeadgateApiServer for RpcServer {
    async fn put_transaction(&self, tx_hex: String) -> RpcResult<bool> {
        let bytes = from_hex("transaction", &tx_hex)?;
        self.gateway.put_transaction(&bytes).map_err(to_rpc_err)
    }

    async fn get_state(&self, address: String) -> RpcResult<String> {
        let address = from_hex("address", &address)?;
        let encoded = self.gateway.get_state(&address).map_err(to_rpc_err)?;
        Ok(hex::encode(encoded))
    }

    async fn get_balance(&self, address: String, currency: String) -> RpcResult<String> {
        let address = from_hex("address", &address)?;
        let currency = from_hex("currency", &currency)?;
        let encoded = self
            .gateway
            .get_balance(&address, &currency)
            .map_err(to_rpc_err)?;
        Ok(hex::encode(encoded))
    }

    async fn get_next_tx_nonce(&self, address: String) -> RpcResult<u64> {
        let address = from_hex("address", &address)?;
        self.gateway.get_next_tx_nonce(&address).map_err(to_rpc_err)
    }

    async fn open_session(&self) -> RpcResult<RpcSession> {
        let session = self.gateway.open_session();
        Ok(RpcSession {
            session_id: session.id(),
            opened_at: session.opened_at().to_rfc3339(),
        })
    }

    async fn close_session(&self, session_id: u64) -> RpcResult<bool> {
        Ok(self.gateway.close_session(session_id))
    }

    async fn set_addresses_to_subscribe(
        &self,
        session_id: u64,
        addresses: Vec<String>,
    ) -> RpcResult<bool> {
        let addresses = addresses
            .iter()
            .map(|a| from_hex("address", a))
            .collect::<RpcResult<Vec<_>>>()?;
        self.gateway
            .set_addresses_to_subscribe(session_id, &addresses)
            .map_err(to_rpc_err)
    }

    async fn is_transaction_staged(&self, tx_id: String) -> RpcResult<bool> {
        let id = from_hex("tx id", &tx_id)?;
        self.gateway.is_transaction_staged(&id).map_err(to_rpc_err)
    }

    async fn report_exception(&self, code: String, message: String) -> RpcResult<bool> {
        Ok(self.gateway.report_exception(&code, &message))
    }

    async fn get_staged_transaction_ids(&self) -> RpcResult<Vec<String>> {
        Ok(self
            .gateway
            .staged_transaction_ids()
            .into_iter()
            .map(|id| id.to_hex())
            .collect())
    }

    async fn get_checkpoint(&self) -> RpcResult<RpcCheckpoint> {
        let info = self.gateway.checkpoint().map_err(to_rpc_err)?;
        Ok(info.into())
    }
}
