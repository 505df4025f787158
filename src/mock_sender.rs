//! An [`RpcSender`] used for unit testing
//! [`RpcClient`](crate::rpc_client::RpcClient).

use {
    crate::{
        client_error::Result,
        rpc_request::{RpcError, RpcRequest},
        rpc_response::{RpcContactInfo, RpcVersionInfo},
        rpc_sender::RpcSender,
    },
    serde_json::{json, Value},
    std::{collections::HashMap, sync::RwLock},
};

pub const PUBKEY: &str = "7RoSF9fUmdphVCpabEoefH81WwrW7orsWonXWqTXkKV8";

pub type Mocks = HashMap<RpcRequest, Value>;

/// Serves canned responses instead of talking to a validator.
///
/// Each entry in the mocks map is consumed by the first request that
/// matches it; requests without an entry fall back to a reasonable
/// default. Constructing with the url directive `"fails"` makes every
/// call return an error, which exercises the soft-failure paths.
pub struct MockSender {
    mocks: RwLock<Mocks>,
    url: String,
}

impl MockSender {
    pub fn new(url: String) -> Self {
        Self::new_with_mocks(url, Mocks::default())
    }

    pub fn new_with_mocks(url: String, mocks: Mocks) -> Self {
        Self {
            url,
            mocks: RwLock::new(mocks),
        }
    }
}

impl RpcSender for MockSender {
    fn send(&self, request: RpcRequest, _params: Value) -> Result<Value> {
        if let Some(value) = self.mocks.write().unwrap().remove(&request) {
            return Ok(value);
        }
        if self.url == "fails" {
            return Err(RpcError::RpcRequestError("mock failure".to_string()).into());
        }

        let val = match request {
            RpcRequest::GetClusterNodes => serde_json::to_value(vec![RpcContactInfo {
                pubkey: PUBKEY.to_string(),
                gossip: Some("127.0.0.1:1024".parse().unwrap()),
                tpu: Some("127.0.0.1:1027".parse().unwrap()),
                rpc: Some("127.0.0.1:8899".parse().unwrap()),
            }])?,
            RpcRequest::GetSlotLeaders => json!([PUBKEY]),
            RpcRequest::GetVersion => serde_json::to_value(RpcVersionInfo {
                solana_core: "1.10.0".to_string(),
            })?,
        };
        Ok(val)
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}
