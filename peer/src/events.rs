use meadow_shared::{EntityEvent, PeerId, ResourceId, StateTick};

use crate::{error::MeadowPeerError, mod_sync::ModListDiff};

/// Something the integration should react to, collected during a tick and
/// drained with [`Session::take_events`](crate::Session::take_events)
#[derive(Debug)]
pub enum SessionEvent {
    /// The session advanced to a new tick
    Tick(StateTick),
    PeerConnected { peer: PeerId, name: String },
    PeerDisconnected(PeerId),
    /// A mirrored entity joined, changed, left or changed hands
    Entity(EntityEvent),
    /// A resource was deactivated because nobody uses it anymore
    ResourceReleased(ResourceId),
    /// A resource whose owner left was handed to `owner`
    OwnershipAssigned { resource: ResourceId, owner: PeerId },
    /// A remote procedure ran against the local context
    RpcExecuted { procedure: String, sender: PeerId },
    /// The background mod-list comparison finished
    ModsNegotiated(ModListDiff),
    Error(MeadowPeerError),
}

impl SessionEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, SessionEvent::Error(_))
    }
}
