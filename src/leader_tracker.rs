//! Slot-driven resolver for the current and next leader TPU endpoints.

use {
    crate::{
        cluster_nodes::ClusterNodes,
        leader_schedule::{LeaderSchedule, SLOT_LEADERS_LIMIT},
        pubkey::Pubkey,
        Slot,
    },
    log::*,
    std::net::SocketAddr,
};

/// Remaining-window headroom below which the next schedule fetch is
/// issued, leaving one request's worth of slots against RPC latency.
pub const SCHEDULE_PREFETCH_SLOTS: u64 = 16;

/// A `getSlotLeaders` fetch the caller should issue on the tracker's
/// behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub anchor: Slot,
    pub limit: usize,
}

/// Owns the schedule window, the node table and the slot watermark.
/// `record_slot` is the only operation that moves the watermark and
/// re-resolves endpoints; schedule fetches are reported back to the
/// caller so the tracker itself stays free of I/O.
#[derive(Debug, Default)]
pub struct LeaderTracker {
    slot: Slot,
    schedule: LeaderSchedule,
    nodes: ClusterNodes,
    request_inflight: bool,
    current: Option<SocketAddr>,
    next: Option<SocketAddr>,
}

impl LeaderTracker {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// TPU endpoint of the leader for the observed slot, when both the
    /// schedule and the node table know it.
    pub fn current_leader(&self) -> Option<SocketAddr> {
        self.current
    }

    /// TPU endpoint of the next slot's leader; `None` when it is the
    /// same validator as the current leader.
    pub fn next_leader(&self) -> Option<SocketAddr> {
        self.next
    }

    /// Ingest a slot notification. Equal or backward slots are dropped.
    /// Returns the schedule fetch to issue, if one is due.
    pub fn record_slot(&mut self, new_slot: Slot) -> Option<ScheduleRequest> {
        if new_slot <= self.slot {
            return None;
        }
        self.slot = new_slot;

        let request = if !self.request_inflight
            && (!self.schedule.has_response()
                || new_slot > self.schedule.last_slot().saturating_sub(SCHEDULE_PREFETCH_SLOTS))
        {
            self.request_inflight = true;
            Some(ScheduleRequest {
                anchor: new_slot,
                limit: SLOT_LEADERS_LIMIT,
            })
        } else {
            None
        };

        let leader: Option<Pubkey> = self.schedule.leader_of(new_slot).copied();
        self.current = leader.and_then(|key| self.nodes.tpu_addr(&key));

        let next_leader: Option<Pubkey> = self.schedule.leader_of(new_slot + 1).copied();
        self.next = next_leader
            .filter(|key| Some(*key) != leader)
            .and_then(|key| self.nodes.tpu_addr(&key));

        if let Some(addr) = self.current {
            debug!("slot {} leader tpu {}", new_slot, addr);
        }

        request
    }

    /// Replace the node table. A refresh failure never reaches this
    /// point, so a stale-but-usable table survives RPC hiccups.
    pub fn set_cluster_nodes(&mut self, nodes: ClusterNodes) {
        self.nodes = nodes;
    }

    /// Install a schedule window fetched for `anchor` and allow the next
    /// prefetch.
    pub fn set_schedule(&mut self, anchor: Slot, leaders: Vec<Pubkey>) {
        self.schedule.set_window(anchor, leaders);
        self.request_inflight = false;
    }

    /// A schedule fetch errored; clear the in-flight suppression so the
    /// next slot tick may retry.
    pub fn schedule_request_failed(&mut self) {
        self.request_inflight = false;
    }

    /// Rewind the slot watermark after an RPC reconnect so the fresh
    /// subscription's first notification is accepted.
    pub fn reset(&mut self) {
        self.slot = 0;
        self.request_inflight = false;
    }
}
