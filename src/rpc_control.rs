//! RPC control plane: connection state machine and reconnect pacing for
//! the HTTP + WebSocket pair that feeds the leader tracker.

use {
    crate::{
        backoff::ReconnectBackoff,
        cluster_nodes::ClusterNodes,
        leader_tracker::{LeaderTracker, ScheduleRequest},
        proxy::ProxyError,
        pubsub_client::{PubsubClient, SlotsSubscription},
        rpc_client::RpcClient,
        rpc_response::SlotInfo,
    },
    crossbeam_channel::{never, Receiver},
    log::*,
    std::time::Instant,
};

pub const RPC_HTTP_PORT: u16 = 8899;

/// HTTP and WebSocket endpoints derived from a `host[:http[:ws]]`
/// string; the WebSocket port defaults to the HTTP port plus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcUrls {
    pub http: String,
    pub websocket: String,
}

pub fn rpc_urls(rpc_host: &str) -> Result<RpcUrls, ProxyError> {
    let mut parts = rpc_host.split(':');
    let host = parts
        .next()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ProxyError::InvalidRpcHost(rpc_host.to_string()))?;
    let mut ports = [0u16; 2];
    for slot in ports.iter_mut() {
        match parts.next() {
            Some(port) => {
                *slot = port
                    .parse()
                    .map_err(|_| ProxyError::InvalidRpcHost(rpc_host.to_string()))?
            }
            None => break,
        }
    }
    if parts.next().is_some() {
        return Err(ProxyError::InvalidRpcHost(rpc_host.to_string()));
    }
    let http_port = if ports[0] == 0 { RPC_HTTP_PORT } else { ports[0] };
    let ws_port = if ports[1] == 0 { http_port + 1 } else { ports[1] };
    Ok(RpcUrls {
        http: format!("http://{}:{}", host, http_port),
        websocket: format!("ws://{}:{}", host, ws_port),
    })
}

/// Owns the HTTP client and the slot subscription. A connect attempt
/// must bring both sides up; afterwards the subscription channel is the
/// health signal for the WebSocket side. Individual `getClusterNodes` /
/// `getSlotLeaders` failures are soft: logged and retried later without
/// tearing the connection.
pub struct RpcControl {
    rpc: RpcClient,
    ws_url: String,
    backoff: ReconnectBackoff,
    connected: bool,
    subscription: Option<SlotsSubscription>,
    slot_rx: Receiver<SlotInfo>,
}

impl RpcControl {
    pub fn new(rpc_host: &str) -> Result<Self, ProxyError> {
        let urls = rpc_urls(rpc_host)?;
        Ok(Self::new_with_client(RpcClient::new(urls.http), urls.websocket))
    }

    pub fn new_with_client(rpc: RpcClient, ws_url: String) -> Self {
        Self {
            rpc,
            ws_url,
            backoff: ReconnectBackoff::new(),
            connected: false,
            subscription: None,
            slot_rx: never(),
        }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Stream of slot notifications; a `never` channel while
    /// disconnected.
    pub fn slot_receiver(&self) -> &Receiver<SlotInfo> {
        &self.slot_rx
    }

    /// The subscription channel disconnected: tear down the dead
    /// subscription so `maintain` starts reconnecting.
    pub fn mark_disconnected(&mut self) {
        if self.connected {
            warn!("rpc_websocket_reset url={}", self.ws_url);
        }
        self.connected = false;
        if let Some(mut subscription) = self.subscription.take() {
            // the reader already exited; this just joins it
            let _ = subscription.shutdown();
        }
        self.slot_rx = never();
    }

    /// Drive the reconnect state machine. No-op while connected or
    /// before the backoff deadline.
    pub fn maintain(&mut self, now: Instant, tracker: &mut LeaderTracker) {
        if self.connected || !self.backoff.ready(now) {
            return;
        }
        self.backoff.record_attempt(now);
        match self.try_connect() {
            Ok((subscription, slot_rx)) => {
                info!("rpc_connected url={}", self.rpc.url());
                self.subscription = Some(subscription);
                self.slot_rx = slot_rx;
                self.connected = true;
                tracker.reset();
                self.rpc.reset_request_id();
                self.refresh_cluster_nodes(tracker);
            }
            Err(err) => {
                warn!(
                    "rpc connect failed: {} (next attempt in {:?})",
                    err,
                    self.backoff.interval()
                );
            }
        }
    }

    fn try_connect(&self) -> Result<(SlotsSubscription, Receiver<SlotInfo>), ProxyError> {
        // probe the unary side before subscribing
        let version = self.rpc.get_version()?;
        debug!("rpc node version {}", version.solana_core);
        let subscription = PubsubClient::slot_subscribe(&self.ws_url)?;
        Ok(subscription)
    }

    /// Re-request the cluster-node table; on failure the previous table
    /// stays in use.
    pub fn refresh_cluster_nodes(&self, tracker: &mut LeaderTracker) {
        match self.rpc.get_cluster_nodes() {
            Ok(contact_infos) => {
                let nodes = ClusterNodes::from_contact_infos(&contact_infos);
                info!("received cluster nodes, {} with tpu", nodes.len());
                tracker.set_cluster_nodes(nodes);
            }
            Err(err) => warn!("failed to get cluster nodes [{}]", err),
        }
    }

    /// Execute a schedule fetch the tracker asked for, feeding the
    /// window or the failure back into it.
    pub fn request_slot_leaders(&self, request: &ScheduleRequest, tracker: &mut LeaderTracker) {
        match self.rpc.get_slot_leaders(request.anchor, request.limit) {
            Ok(leaders) => {
                debug!(
                    "received slot leaders, anchor={} len={}",
                    request.anchor,
                    leaders.len()
                );
                tracker.set_schedule(request.anchor, leaders);
            }
            Err(err) => {
                warn!("failed to get slot leaders [{}]", err);
                tracker.schedule_request_failed();
            }
        }
    }
}
