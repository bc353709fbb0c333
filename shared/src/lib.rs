//! # Meadow Shared
//! The replication core every Meadow Online peer runs: the lobby → world →
//! room resource tree, per-peer entity feeds with delta synchronization,
//! subscriptions, and named remote procedures.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use meadow_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr};

mod entity;
mod error;
mod feed;
mod messages;
mod peer;
mod replication;
mod resource;
mod rpc;
mod subscription;
mod types;
mod wrapping_number;

pub use entity::{
    diff_mask::DiffMask,
    entity_id::{EntityId, EntityIdType},
    entity_state::{EntityState, FieldDiff, FieldValue},
    error::EntityStateError,
    online_entity::OnlineEntity,
    serializer::EntityStateSerializer,
};
pub use error::SyncError;
pub use feed::{
    error::FeedError,
    feed_receiver::{FeedReceiver, RESET_RETRY_AFTER},
    feed_sender::{FeedPayload, FeedSender},
};
pub use messages::{
    entity_messages::{
        AuthorityTransferMessage, DeltaMessage, EntityLeftMessage, FullStateMessage,
        ResetRequest,
    },
    error::MessageError,
    packet::Packet,
    session_message::SessionMessage,
};
pub use peer::{peer_directory::PeerDirectory, peer_record::PeerRecord};
pub use replication::{
    entity_event::{EntityEvent, ResetOutcome},
    replication_manager::ReplicationManager,
};
pub use resource::{
    adapter::{ExternalKey, ResourceAdapter},
    error::{ActivationError, ResourceError},
    resource::{Resource, ResourceStatus},
    resource_id::{ResourceId, ResourceKind},
    resource_state::{EntityMembership, ResourceState, StateType},
    resource_tree::{Deactivation, ResourceTree},
};
pub use rpc::{
    arg::{ArgKind, RpcArg},
    error::RpcError,
    once_window::OnceWindow,
    procedure_registry::{Procedure, ProcedureHandler, ProcedureRegistry},
    rpc_config::RpcConfig,
    rpc_dispatcher::{RpcCall, RpcDispatcher, RpcRequest},
    rpc_event::{OnceKey, RpcEvent, RpcTarget},
};
pub use subscription::{subscription::Subscription, subscription_registry::SubscriptionRegistry};
pub use types::{EntityTypeId, FeedVersion, PeerId, StateTick};
pub use wrapping_number::{sequence_distance, sequence_greater_than, sequence_less_than};
