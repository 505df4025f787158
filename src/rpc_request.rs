//! JSON-RPC request naming and body construction.

use {
    serde_json::{json, Value},
    std::fmt,
    thiserror::Error,
};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RpcRequest {
    GetClusterNodes,
    GetSlotLeaders,
    GetVersion,
}

impl fmt::Display for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let method = match self {
            RpcRequest::GetClusterNodes => "getClusterNodes",
            RpcRequest::GetSlotLeaders => "getSlotLeaders",
            RpcRequest::GetVersion => "getVersion",
        };
        write!(f, "{}", method)
    }
}

impl RpcRequest {
    pub fn build_request_json(self, id: u64, params: Value) -> Value {
        json!({
           "jsonrpc": "2.0",
           "id": id,
           "method": format!("{}", self),
           "params": params,
        })
    }
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC request error: {0}")]
    RpcRequestError(String),
    #[error("parse error: expected {0}")]
    ParseError(String), /* "expected" */
}
