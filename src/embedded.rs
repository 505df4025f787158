//! In-process submission facade: the same leader tracking and UDP spray
//! without the TCP front.

use {
    crate::{
        leader_tracker::LeaderTracker,
        price_tx::TxBuild,
        proxy::ProxyError,
        rpc_control::RpcControl,
        udp_sender::UdpSender,
        Slot,
    },
    crossbeam_channel::TryRecvError,
    std::time::Instant,
};

/// Embeds the forwarder in an application that builds its own
/// transactions. `poll` keeps the tracker fed; `submit` serializes a
/// transaction into a reused scratch buffer and sprays it at the
/// current and next leader.
pub struct EmbeddedTpu {
    tracker: LeaderTracker,
    udp: UdpSender,
    control: RpcControl,
    scratch: Vec<u8>,
}

impl EmbeddedTpu {
    pub fn new(rpc_host: &str) -> Result<Self, ProxyError> {
        Self::new_with_control(RpcControl::new(rpc_host)?)
    }

    pub fn new_with_control(control: RpcControl) -> Result<Self, ProxyError> {
        Ok(Self {
            tracker: LeaderTracker::default(),
            udp: UdpSender::bind()?,
            control,
            scratch: Vec::new(),
        })
    }

    /// Drain pending slot notifications into the tracker and run
    /// reconnect maintenance. Call from the host application's loop.
    pub fn poll(&mut self) {
        let slot_rx = self.control.slot_receiver().clone();
        loop {
            match slot_rx.try_recv() {
                Ok(slot_info) => self.record_slot(slot_info.slot),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.control.mark_disconnected();
                    break;
                }
            }
        }
        self.control.maintain(Instant::now(), &mut self.tracker);
    }

    /// Feed one slot obtained out of band (a host-managed slot source
    /// instead of this facade's own subscription).
    pub fn record_slot(&mut self, slot: Slot) {
        if let Some(request) = self.tracker.record_slot(slot) {
            self.control.request_slot_leaders(&request, &mut self.tracker);
        }
    }

    /// Build and spray one transaction. Fire-and-forget: with no known
    /// leader the transaction is dropped.
    pub fn submit(&mut self, request: &dyn TxBuild) {
        let mut scratch = std::mem::take(&mut self.scratch);
        request.build(&mut scratch);
        self.udp.spray(
            self.tracker.current_leader(),
            self.tracker.next_leader(),
            &scratch,
        );
        self.scratch = scratch;
    }

    /// Direct tracker access for hosts that manage schedule or node
    /// state themselves.
    pub fn tracker_mut(&mut self) -> &mut LeaderTracker {
        &mut self.tracker
    }

    pub fn tracker(&self) -> &LeaderTracker {
        &self.tracker
    }
}
