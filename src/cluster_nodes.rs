//! Identity key to TPU endpoint map built from `getClusterNodes`.

use {
    crate::{pubkey::Pubkey, rpc_response::RpcContactInfo},
    log::*,
    std::{collections::HashMap, net::SocketAddr},
};

/// Nodes that advertise no TPU address are skipped; a refresh replaces
/// the whole table rather than mutating entries in place.
#[derive(Debug, Default)]
pub struct ClusterNodes {
    tpu_by_id: HashMap<Pubkey, SocketAddr>,
}

impl ClusterNodes {
    pub fn from_contact_infos(nodes: &[RpcContactInfo]) -> Self {
        let mut tpu_by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let pubkey = match node.pubkey.parse::<Pubkey>() {
                Ok(pubkey) => pubkey,
                Err(err) => {
                    debug!("skipping node with bad pubkey {}: {}", node.pubkey, err);
                    continue;
                }
            };
            match node.tpu {
                Some(tpu) => {
                    tpu_by_id.insert(pubkey, tpu);
                }
                None => debug!("skipping node {} without tpu", pubkey),
            }
        }
        Self { tpu_by_id }
    }

    pub fn tpu_addr(&self, id: &Pubkey) -> Option<SocketAddr> {
        self.tpu_by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.tpu_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tpu_by_id.is_empty()
    }
}
