use log::debug;

use meadow_peer::{
    shared::PeerId,
    transport::{LinkConditionerConfig, LocalHub},
    SessionConfig,
};

use super::TestPeer;

/// Several peers sharing one in-process hub, ticked in id order
pub struct TestMesh {
    hub: LocalHub,
    config: SessionConfig,
    peers: Vec<TestPeer>,
}

impl Default for TestMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMesh {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            hub: LocalHub::new(),
            config,
            peers: Vec::new(),
        }
    }

    pub fn hub(&self) -> &LocalHub {
        &self.hub
    }

    pub fn set_conditioner(&self, config: Option<LinkConditionerConfig>) {
        self.hub.set_conditioner(config);
    }

    pub fn add_peer(&mut self, id: u64, name: &str) -> PeerId {
        let id = PeerId::new(id);
        let peer = TestPeer::new(id, name, self.config.clone(), &self.hub);
        self.peers.push(peer);
        self.peers.sort_by_key(|peer| peer.id);
        id
    }

    pub fn ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|peer| peer.id).collect()
    }

    /// # Panics
    ///
    /// Panics if no peer has this id
    pub fn peer(&self, id: PeerId) -> &TestPeer {
        match self.peers.iter().find(|peer| peer.id == id) {
            Some(peer) => peer,
            None => panic!("No test peer {}", id),
        }
    }

    pub fn peer_mut(&mut self, id: PeerId) -> &mut TestPeer {
        match self.peers.iter_mut().find(|peer| peer.id == id) {
            Some(peer) => peer,
            None => panic!("No test peer {}", id),
        }
    }

    pub fn peers_mut(&mut self) -> impl Iterator<Item = &mut TestPeer> {
        self.peers.iter_mut()
    }

    /// Each peer greets every peer with a higher id
    pub fn connect_all(&mut self) {
        let introductions: Vec<(PeerId, String)> = self
            .peers
            .iter()
            .map(|peer| (peer.id, peer.name.clone()))
            .collect();
        for peer in self.peers.iter_mut() {
            for (other, name) in &introductions {
                if *other > peer.id {
                    peer.session.connect(*other, name);
                }
            }
        }
    }

    pub fn tick(&mut self) {
        for peer in self.peers.iter_mut() {
            peer.tick();
        }
    }

    pub fn tick_n(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Takes a peer off the hub without telling anyone. The others notice
    /// through the liveness timeout or an explicit `peer_disconnected`.
    pub fn remove_peer(&mut self, id: PeerId) -> Option<TestPeer> {
        self.hub.leave(&id);
        let index = self.peers.iter().position(|peer| peer.id == id)?;
        debug!("{} left the mesh", id);
        Some(self.peers.remove(index))
    }
}
