//! A transport for RPC calls.

use crate::{client_error::Result, rpc_request::RpcRequest};

/// `RpcSender` implements the underlying transport of requests to, and
/// responses from, a validator node, and is used primarily by
/// [`RpcClient`](crate::rpc_client::RpcClient).
pub trait RpcSender {
    fn send(&self, request: RpcRequest, params: serde_json::Value) -> Result<serde_json::Value>;
    fn url(&self) -> String;
    /// Restart request-id assignment from 1; invoked when the control
    /// plane re-establishes its connections.
    fn reset_request_id(&self) {}
}
