//! Best-effort UDP spray toward leader TPU ports.

use {
    log::*,
    std::{
        io,
        net::{SocketAddr, UdpSocket},
    },
};

/// One unconnected nonblocking socket reused for every destination.
/// Sends never propagate errors; failures are counted and logged so the
/// TCP ingress and RPC paths are unaffected.
pub struct UdpSender {
    socket: UdpSocket,
    packets_sent: u64,
    send_errors: u64,
    dropped_no_leader: u64,
}

impl UdpSender {
    pub fn bind() -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            packets_sent: 0,
            send_errors: 0,
            dropped_no_leader: 0,
        })
    }

    /// Forward one payload to the current leader and, when it is a
    /// different validator, the next leader. With no known leader the
    /// payload is dropped; submission is fire-and-forget.
    pub fn spray(
        &mut self,
        current: Option<SocketAddr>,
        next: Option<SocketAddr>,
        payload: &[u8],
    ) {
        if current.is_none() && next.is_none() {
            self.dropped_no_leader += 1;
            debug!("no leader endpoint known, dropping {} bytes", payload.len());
            return;
        }
        if let Some(addr) = current {
            self.send_one(addr, payload);
        }
        if let Some(addr) = next {
            self.send_one(addr, payload);
        }
    }

    fn send_one(&mut self, addr: SocketAddr, payload: &[u8]) {
        match self.socket.send_to(payload, addr) {
            Ok(_) => self.packets_sent += 1,
            Err(err) => {
                self.send_errors += 1;
                debug!("udp send to {} failed: {}", addr, err);
            }
        }
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors
    }

    pub fn dropped_no_leader(&self) -> u64 {
        self.dropped_no_leader
    }
}
