//! An in-memory mesh transport for unit and scenario tests
//!
//! Builds a fully-connected mesh of unbounded tokio channels between a
//! fixed set of parties. Sends never block; receives suspend until the
//! peer's message arrives. Per-pair ordering follows from the channel
//! semantics.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{error::CoreError, PartyId};

use super::{MeshNetwork, NetStats, NetworkPayload};

/// One party's endpoint of an in-memory mesh
pub struct MockMesh {
    /// The id of the local party
    party_id: PartyId,
    /// Send half per peer
    senders: HashMap<PartyId, UnboundedSender<NetworkPayload>>,
    /// Receive half per peer
    receivers: HashMap<PartyId, UnboundedReceiver<NetworkPayload>>,
    /// Traffic counters
    stats: NetStats,
}

impl MockMesh {
    /// Build a fully-connected mesh between the given parties
    ///
    /// Returns one endpoint per party, in input order.
    pub fn mesh(parties: &[PartyId]) -> Vec<MockMesh> {
        let mut endpoints: Vec<MockMesh> = parties
            .iter()
            .map(|&id| MockMesh {
                party_id: id,
                senders: HashMap::new(),
                receivers: HashMap::new(),
                stats: NetStats::default(),
            })
            .collect();

        for i in 0..parties.len() {
            for j in 0..parties.len() {
                if i == j {
                    continue;
                }
                let (send, recv) = unbounded_channel();
                endpoints[i].senders.insert(parties[j], send);
                endpoints[j].receivers.insert(parties[i], recv);
            }
        }
        endpoints
    }
}

#[async_trait]
impl MeshNetwork for MockMesh {
    fn party_id(&self) -> PartyId {
        self.party_id
    }

    async fn send(&mut self, to: PartyId, payload: NetworkPayload) -> Result<(), CoreError> {
        let sender = self
            .senders
            .get(&to)
            .ok_or_else(|| CoreError::Transport(format!("no channel to party {to}")))?;
        sender
            .send(payload)
            .map_err(|_| CoreError::Transport(format!("party {to} disconnected")))?;
        self.stats.messages_sent += 1;
        Ok(())
    }

    async fn recv(&mut self, from: PartyId) -> Result<NetworkPayload, CoreError> {
        let receiver = self
            .receivers
            .get_mut(&from)
            .ok_or_else(|| CoreError::Transport(format!("no channel from party {from}")))?;
        let payload = receiver
            .recv()
            .await
            .ok_or_else(|| CoreError::Transport(format!("party {from} disconnected")))?;
        self.stats.messages_received += 1;
        Ok(payload)
    }

    async fn close(&mut self) -> Result<(), CoreError> {
        self.senders.clear();
        self.receivers.clear();
        Ok(())
    }

    fn stats(&self) -> NetStats {
        self.stats
    }
}
