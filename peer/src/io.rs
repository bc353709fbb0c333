use log::trace;

use meadow_shared::{Packet, PeerId};

use crate::{
    error::MeadowPeerError,
    transport::{PacketReceiver, PacketSender},
};

/// Packet-level wrapper around the loaded transport halves
pub(crate) struct Io {
    packet_sender: Option<Box<dyn PacketSender>>,
    packet_receiver: Option<Box<dyn PacketReceiver>>,
}

impl Io {
    pub fn new() -> Self {
        Self {
            packet_sender: None,
            packet_receiver: None,
        }
    }

    pub fn load(&mut self, sender: Box<dyn PacketSender>, receiver: Box<dyn PacketReceiver>) {
        if self.packet_sender.is_some() {
            panic!("Session's Io was already loaded!");
        }
        self.packet_sender = Some(sender);
        self.packet_receiver = Some(receiver);
    }

    pub fn is_loaded(&self) -> bool {
        self.packet_sender.is_some()
    }

    pub fn send_packet(&self, peer: &PeerId, packet: &Packet) -> Result<(), MeadowPeerError> {
        let Some(sender) = self.packet_sender.as_ref() else {
            return Err(MeadowPeerError::IoNotLoaded);
        };
        let payload = packet.to_bytes();
        trace!("sending {} bytes to {}", payload.len(), peer);
        sender
            .send(peer, &payload)
            .map_err(|_| MeadowPeerError::Send { peer: *peer })
    }

    /// Next decoded packet, `Ok(None)` once the queue is drained
    pub fn recv_packet(&mut self) -> Result<Option<(PeerId, Packet)>, MeadowPeerError> {
        let Some(receiver) = self.packet_receiver.as_mut() else {
            return Err(MeadowPeerError::IoNotLoaded);
        };
        match receiver.receive() {
            Ok(Some((peer, payload))) => match Packet::from_bytes(payload) {
                Ok(packet) => Ok(Some((peer, packet))),
                Err(source) => Err(MeadowPeerError::Decode { peer, source }),
            },
            Ok(None) => Ok(None),
            Err(_) => Err(MeadowPeerError::Recv),
        }
    }
}
