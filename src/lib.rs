//! Leader-tracking transaction forwarder.
//!
//! Accepts framed transaction blobs from local clients over TCP and
//! forwards each blob via UDP to the validators currently and imminently
//! designated slot leader. Leader rotation is tracked through a JSON-RPC
//! slot subscription plus the cluster-node TPU address map.

pub mod backoff;
pub mod client_error;
pub mod cluster_nodes;
pub mod embedded;
pub mod frame;
pub mod hash;
pub mod http_sender;
pub mod leader_schedule;
pub mod leader_tracker;
pub mod mock_sender;
pub mod price_tx;
pub mod proxy;
pub mod pubkey;
pub mod pubsub_client;
pub mod rpc_client;
pub mod rpc_control;
pub mod rpc_request;
pub mod rpc_response;
pub mod rpc_sender;
pub mod short_vec;
pub mod signature;
pub mod tcp_server;
pub mod tx_encoder;
pub mod udp_sender;

/// A discrete time unit of the cluster; exactly one validator is the
/// leader per slot.
pub type Slot = u64;
