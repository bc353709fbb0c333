use std::{
    cell::Cell,
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::{debug, trace};
use smol::channel::{self, Receiver, Sender, TryRecvError};

use meadow_shared::PeerId;

use super::{PacketReceiver, PacketSender, RecvError, SendError};

type Inbox = Sender<(PeerId, Box<[u8]>)>;

/// Loss and duplication applied to every packet a peer sends
#[derive(Clone, Debug)]
pub struct LinkConditionerConfig {
    /// Probability in `[0, 1]` that a packet is dropped
    pub loss: f32,
    /// Probability in `[0, 1]` that a delivered packet arrives twice
    pub duplication: f32,
    /// Seed for the conditioner's random source, mixed with the peer id
    pub seed: u64,
}

impl LinkConditionerConfig {
    pub fn new(loss: f32, duplication: f32, seed: u64) -> Self {
        Self {
            loss,
            duplication,
            seed,
        }
    }

    /// Creates a new LinkConditionerConfig that drops a tenth of all packets
    pub fn poor_condition(seed: u64) -> Self {
        Self::new(0.1, 0.05, seed)
    }

    /// Creates a new LinkConditionerConfig that drops a third of all packets
    pub fn very_poor_condition(seed: u64) -> Self {
        Self::new(0.33, 0.1, seed)
    }
}

/// In-process packet mesh. Every joined peer gets an inbox; any peer can
/// send to any other inbox still present.
#[derive(Clone, Default)]
pub struct LocalHub {
    inboxes: Arc<Mutex<HashMap<PeerId, Inbox>>>,
    conditioner: Arc<Mutex<Option<LinkConditionerConfig>>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditioner(config: LinkConditionerConfig) -> Self {
        let hub = Self::default();
        hub.set_conditioner(Some(config));
        hub
    }

    /// Replaces the link conditioner for every joined peer. `None` makes
    /// the mesh lossless again.
    pub fn set_conditioner(&self, config: Option<LinkConditionerConfig>) {
        if let Ok(mut conditioner) = self.conditioner.lock() {
            *conditioner = config;
        }
    }

    /// Creates the transport halves for `peer`
    pub fn join(&self, peer: PeerId) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>) {
        let (inbox, receiver) = channel::unbounded();
        if let Ok(mut inboxes) = self.inboxes.lock() {
            inboxes.insert(peer, inbox);
        }
        let seed = self
            .conditioner
            .lock()
            .ok()
            .and_then(|conditioner| conditioner.as_ref().map(|config| config.seed))
            .unwrap_or_default();
        debug!("{} joined the local hub", peer);

        let sender = LocalPacketSender {
            local: peer,
            inboxes: self.inboxes.clone(),
            conditioner: self.conditioner.clone(),
            rng: fastrand::Rng::with_seed(seed ^ peer.to_u64()),
            seed: Cell::new(seed),
        };
        let receiver = LocalPacketReceiver {
            receiver,
            current_payload: None,
        };
        (Box::new(sender), Box::new(receiver))
    }

    /// Removes `peer`'s inbox. Packets sent to it fail from now on, and its
    /// receiver reports the transport closed once drained.
    pub fn leave(&self, peer: &PeerId) {
        if let Ok(mut inboxes) = self.inboxes.lock() {
            inboxes.remove(peer);
        }
    }
}

struct LocalPacketSender {
    local: PeerId,
    inboxes: Arc<Mutex<HashMap<PeerId, Inbox>>>,
    conditioner: Arc<Mutex<Option<LinkConditionerConfig>>>,
    rng: fastrand::Rng,
    seed: Cell<u64>,
}

impl LocalPacketSender {
    /// How many copies of the next packet reach the wire
    fn copies(&self) -> usize {
        let Ok(conditioner) = self.conditioner.lock() else {
            return 1;
        };
        let Some(config) = conditioner.as_ref() else {
            return 1;
        };
        if self.seed.get() != config.seed {
            self.seed.set(config.seed);
            self.rng.seed(config.seed ^ self.local.to_u64());
        }
        if self.rng.f32() < config.loss {
            return 0;
        }
        if self.rng.f32() < config.duplication {
            return 2;
        }
        1
    }
}

impl PacketSender for LocalPacketSender {
    fn send(&self, peer: &PeerId, payload: &[u8]) -> Result<(), SendError> {
        let inbox = {
            let inboxes = self.inboxes.lock().map_err(|_| SendError)?;
            inboxes.get(peer).cloned().ok_or(SendError)?
        };
        let copies = self.copies();
        if copies == 0 {
            trace!("link conditioner dropped packet {} -> {}", self.local, peer);
        }
        for _ in 0..copies {
            inbox
                .try_send((self.local, payload.into()))
                .map_err(|_| SendError)?;
        }
        Ok(())
    }
}

struct LocalPacketReceiver {
    receiver: Receiver<(PeerId, Box<[u8]>)>,
    current_payload: Option<Box<[u8]>>,
}

impl PacketReceiver for LocalPacketReceiver {
    fn receive(&mut self) -> Result<Option<(PeerId, &[u8])>, RecvError> {
        match self.receiver.try_recv() {
            Ok((peer, payload)) => {
                let payload = self.current_payload.insert(payload);
                Ok(Some((peer, &payload[..])))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(RecvError),
        }
    }
}
