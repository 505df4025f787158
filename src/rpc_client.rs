//! Typed client for the unary JSON-RPC methods the forwarder consumes.

use {
    crate::{
        client_error::{ClientError, Result as ClientResult},
        http_sender::HttpSender,
        mock_sender::{MockSender, Mocks},
        pubkey::Pubkey,
        rpc_request::{RpcError, RpcRequest},
        rpc_response::{RpcContactInfo, RpcVersionInfo},
        rpc_sender::RpcSender,
        Slot,
    },
    serde::de::DeserializeOwned,
    serde_json::{json, Value},
};

pub struct RpcClient {
    sender: Box<dyn RpcSender + Send + Sync + 'static>,
}

impl RpcClient {
    pub fn new_sender<T: RpcSender + Send + Sync + 'static>(sender: T) -> Self {
        Self {
            sender: Box::new(sender),
        }
    }

    pub fn new(url: String) -> Self {
        Self::new_sender(HttpSender::new(url))
    }

    pub fn new_mock(url: String) -> Self {
        Self::new_sender(MockSender::new(url))
    }

    pub fn new_mock_with_mocks(url: String, mocks: Mocks) -> Self {
        Self::new_sender(MockSender::new_with_mocks(url, mocks))
    }

    pub fn url(&self) -> String {
        self.sender.url()
    }

    pub fn reset_request_id(&self) {
        self.sender.reset_request_id();
    }

    pub fn get_cluster_nodes(&self) -> ClientResult<Vec<RpcContactInfo>> {
        self.send(RpcRequest::GetClusterNodes, Value::Null)
    }

    /// Fetch the leader identity keys for the `limit` slots starting at
    /// `start_slot`.
    pub fn get_slot_leaders(&self, start_slot: Slot, limit: usize) -> ClientResult<Vec<Pubkey>> {
        self.send(RpcRequest::GetSlotLeaders, json!([start_slot, limit]))
            .and_then(|leaders: Vec<String>| {
                leaders
                    .iter()
                    .map(|leader| {
                        leader.parse::<Pubkey>().map_err(|_| {
                            ClientError::new_with_request(
                                RpcError::ParseError("Pubkey".to_string()).into(),
                                RpcRequest::GetSlotLeaders,
                            )
                        })
                    })
                    .collect()
            })
    }

    pub fn get_version(&self) -> ClientResult<RpcVersionInfo> {
        self.send(RpcRequest::GetVersion, Value::Null)
    }

    fn send<T>(&self, request: RpcRequest, params: Value) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .sender
            .send(request, params)
            .map_err(|err| err.into_with_request(request))?;
        serde_json::from_value(response)
            .map_err(|err| ClientError::new_with_request(err.into(), request))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::mock_sender::PUBKEY, std::net::SocketAddr};

    #[test]
    fn test_get_cluster_nodes() {
        let rpc_client = RpcClient::new_mock("succeeds".to_string());
        let nodes = rpc_client.get_cluster_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].pubkey, PUBKEY);
        assert_eq!(
            nodes[0].tpu,
            Some("127.0.0.1:1027".parse::<SocketAddr>().unwrap())
        );
    }

    #[test]
    fn test_get_slot_leaders() {
        let rpc_client = RpcClient::new_mock("succeeds".to_string());
        let leaders = rpc_client.get_slot_leaders(100, 32).unwrap();
        assert_eq!(leaders, vec![PUBKEY.parse::<Pubkey>().unwrap()]);
    }

    #[test]
    fn test_get_slot_leaders_bad_pubkey() {
        let mocks = Mocks::from([(RpcRequest::GetSlotLeaders, json!(["not-a-pubkey!"]))]);
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);
        assert!(rpc_client.get_slot_leaders(100, 32).is_err());
    }

    #[test]
    fn test_send_failure() {
        let rpc_client = RpcClient::new_mock("fails".to_string());
        assert!(rpc_client.get_cluster_nodes().is_err());
    }
}
