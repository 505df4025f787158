//! The unified proxy server: TCP ingress, leader tracking, UDP egress.

use {
    crate::{
        client_error::ClientError,
        leader_tracker::LeaderTracker,
        pubsub_client::PubsubClientError,
        rpc_control::RpcControl,
        tcp_server::TcpServer,
        udp_sender::UdpSender,
        Slot,
    },
    crossbeam_channel::{select, unbounded, Receiver},
    log::*,
    std::{
        io,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    },
    thiserror::Error,
};

/// Default port local submitters connect to.
pub const TX_PROXY_PORT: u16 = 8898;

const POLL_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid rpc host: {0}")]
    InvalidRpcHost(String),
    #[error("rpc client error: {0}")]
    Client(#[from] ClientError),
    #[error("websocket error: {0}")]
    Pubsub(#[from] PubsubClientError),
    #[error("tcp listener terminated")]
    ListenerDied,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// `host[:http_port[:ws_port]]` of the RPC node to track.
    pub rpc_host: String,
    pub listen_port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            rpc_host: "localhost".to_string(),
            listen_port: TX_PROXY_PORT,
        }
    }
}

/// Single service object owning every piece of routing state. All of it
/// is touched only from `run`'s loop thread; the acceptor, per-user
/// readers and the WebSocket reader communicate exclusively through
/// channels.
pub struct TxProxy {
    tracker: LeaderTracker,
    udp: UdpSender,
    control: RpcControl,
    server: TcpServer,
    submit_rx: Receiver<Vec<u8>>,
    exit: Arc<AtomicBool>,
}

impl TxProxy {
    pub fn new(config: &ProxyConfig, exit: Arc<AtomicBool>) -> Result<Self, ProxyError> {
        let control = RpcControl::new(&config.rpc_host)?;
        let udp = UdpSender::bind()?;
        let (submit_tx, submit_rx) = unbounded();
        let server = TcpServer::bind(config.listen_port, submit_tx, exit.clone())?;
        info!("listening port={}", server.local_addr().port());
        Ok(Self {
            tracker: LeaderTracker::default(),
            udp,
            control,
            server,
            submit_rx,
            exit,
        })
    }

    pub fn listen_addr(&self) -> std::net::SocketAddr {
        self.server.local_addr()
    }

    /// Service loop. Returns cleanly when the exit flag is raised;
    /// returns an error only for unrecoverable conditions.
    pub fn run(&mut self) -> Result<(), ProxyError> {
        while !self.exit.load(Ordering::Relaxed) {
            // channel handles are cloned out so the arms can borrow self
            let submit_rx = self.submit_rx.clone();
            let slot_rx = self.control.slot_receiver().clone();
            select! {
                recv(submit_rx) -> payload => match payload {
                    Ok(payload) => self.forward(&payload),
                    Err(_) => {
                        if !self.exit.load(Ordering::Relaxed) {
                            error!("submission channel closed");
                            self.teardown();
                            return Err(ProxyError::ListenerDied);
                        }
                    }
                },
                recv(slot_rx) -> slot_info => match slot_info {
                    Ok(slot_info) => self.handle_slot(slot_info.slot),
                    Err(_) => self.control.mark_disconnected(),
                },
                default(POLL_TIMEOUT) => {}
            }

            // reap users scheduled for deletion between dispatches
            self.server.reap();

            if !self.server.is_listening() && !self.exit.load(Ordering::Relaxed) {
                error!("tcp listener died");
                self.teardown();
                return Err(ProxyError::ListenerDied);
            }

            self.control.maintain(Instant::now(), &mut self.tracker);
        }
        self.teardown();
        Ok(())
    }

    fn forward(&mut self, payload: &[u8]) {
        self.udp.spray(
            self.tracker.current_leader(),
            self.tracker.next_leader(),
            payload,
        );
    }

    fn handle_slot(&mut self, slot: Slot) {
        debug!("receive slot {}", slot);
        if let Some(request) = self.tracker.record_slot(slot) {
            self.control.request_slot_leaders(&request, &mut self.tracker);
        }
    }

    fn teardown(&mut self) {
        info!("tx_proxy_teardown");
        self.server.shutdown();
    }
}
