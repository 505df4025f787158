//! Blocking HTTP JSON-RPC transport.

use {
    crate::{
        client_error::Result,
        rpc_request::{RpcError, RpcRequest},
        rpc_sender::RpcSender,
    },
    std::sync::atomic::{AtomicU64, Ordering},
};

/// Blocking [`RpcSender`] over HTTP. Request ids are assigned
/// monotonically starting at 1 so responses can be correlated with the
/// call that produced them.
pub struct HttpSender {
    client: reqwest::blocking::Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpSender {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url,
            request_id: AtomicU64::new(1),
        }
    }
}

impl RpcSender for HttpSender {
    fn send(&self, request: RpcRequest, params: serde_json::Value) -> Result<serde_json::Value> {
        let request_id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request_json = request.build_request_json(request_id, params);

        let response = self
            .client
            .post(&self.url)
            .json(&request_json)
            .send()?
            .error_for_status()?;
        let json: serde_json::Value = response.json()?;
        if json["error"].is_object() {
            return Err(RpcError::RpcRequestError(format!(
                "RPC error response: {}",
                serde_json::to_string(&json["error"]).unwrap_or_default()
            ))
            .into());
        }
        Ok(json["result"].clone())
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn reset_request_id(&self) {
        self.request_id.store(1, Ordering::SeqCst);
    }
}
