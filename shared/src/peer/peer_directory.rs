use std::collections::HashMap;

use log::info;

use crate::{
    entity::entity_id::EntityId,
    peer::peer_record::PeerRecord,
    types::{PeerId, StateTick},
};

/// Every remote peer in the session, plus the local peer's own id
pub struct PeerDirectory {
    local: PeerId,
    peers: HashMap<PeerId, PeerRecord>,
}

impl PeerDirectory {
    pub fn new(local: PeerId) -> Self {
        Self {
            local,
            peers: HashMap::new(),
        }
    }

    pub fn local(&self) -> PeerId {
        self.local
    }

    pub fn is_local(&self, peer: &PeerId) -> bool {
        self.local == *peer
    }

    /// Returns `false` if the peer is the local peer or already known
    pub fn add_peer(&mut self, peer: PeerId, name: &str, now: StateTick) -> bool {
        if peer == self.local || self.peers.contains_key(&peer) {
            return false;
        }
        info!("{} ({}) joined", peer, name);
        self.peers.insert(peer, PeerRecord::new(name.to_string(), now));
        true
    }

    pub fn remove_peer(&mut self, peer: &PeerId) -> Option<PeerRecord> {
        let record = self.peers.remove(peer)?;
        info!("{} ({}) left", peer, record.name());
        Some(record)
    }

    pub fn get(&self, peer: &PeerId) -> Option<&PeerRecord> {
        self.peers.get(peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains_key(peer)
    }

    /// Remote peers, sorted
    pub fn peers(&self) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self.peers.keys().copied().collect();
        peers.sort();
        peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn mark_heard(&mut self, peer: &PeerId, now: StateTick) {
        if let Some(record) = self.peers.get_mut(peer) {
            record.mark_heard(now);
        }
    }

    /// Peers not heard from for more than `timeout` ticks, sorted
    pub fn timed_out(&self, now: StateTick, timeout: StateTick) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, record)| now.saturating_sub(record.last_heard()) > timeout)
            .map(|(peer, _)| *peer)
            .collect();
        peers.sort();
        peers
    }

    /// Records that `peer` became authoritative for `entity`, releasing it
    /// from whoever held it before
    pub fn record_authority(&mut self, peer: &PeerId, entity: EntityId) {
        for record in self.peers.values_mut() {
            record.authority_mut().remove(&entity);
        }
        if let Some(record) = self.peers.get_mut(peer) {
            record.authority_mut().insert(entity);
        }
    }

    pub fn release_authority(&mut self, entity: &EntityId) {
        for record in self.peers.values_mut() {
            record.authority_mut().remove(entity);
        }
    }

    /// The remote peer authoritative for `entity`, if any
    pub fn authority_of(&self, entity: &EntityId) -> Option<PeerId> {
        self.peers
            .iter()
            .find(|(_, record)| record.authority().contains(entity))
            .map(|(peer, _)| *peer)
    }
}
