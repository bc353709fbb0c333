//! # Meadow Peer
//! Drives one peer of a Meadow Online session: drains incoming packets,
//! routes them into the replication core, executes remote procedures and
//! flushes captured entity state to the other peers once per tick.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use meadow_shared::{
        ActivationError, ArgKind, EntityEvent, EntityId, EntityIdType, EntityState,
        EntityStateSerializer, EntityTypeId, ExternalKey, FeedError, FieldValue, MessageError,
        PeerId, ProcedureRegistry, ResourceAdapter, ResourceError, ResourceId, ResourceKind,
        RpcArg, RpcCall, RpcConfig, RpcError, RpcTarget, StateTick, SyncError,
        RESET_RETRY_AFTER,
    };
}

mod error;
mod events;
mod io;
mod mod_sync;
mod session;
mod session_config;

pub use error::MeadowPeerError;
pub use events::SessionEvent;
pub use mod_sync::{ModEntry, ModListDiff, ModListNegotiation};
pub use session::Session;
pub use session_config::SessionConfig;
