use thiserror::Error;

use crate::{entity::error::EntityStateError, types::FeedVersion};

/// Errors raised while routing or applying entity feed traffic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The message names a resource that does not exist locally
    #[error("Feed message for unknown resource {resource}")]
    UnknownResource { resource: String },

    /// The message names an entity the resource does not hold
    #[error("Feed message for unknown entity {entity} in {resource}")]
    UnknownEntity { entity: String, resource: String },

    /// A delta referenced a baseline this peer does not hold
    #[error("Delta for {entity} expects baseline {baseline}, local baseline is {local:?}")]
    StaleFeed {
        entity: String,
        baseline: FeedVersion,
        local: Option<FeedVersion>,
    },

    /// The feed was removed by an unsubscribe or a deactivation
    #[error("Feed for {entity} in {resource} is no longer valid")]
    FeedInvalidated { entity: String, resource: String },

    /// Only the authoritative peer may send entity state or give it away
    #[error("Peer {sender} is not authoritative for {entity}")]
    NotAuthority { entity: String, sender: u64 },

    /// The delta's mask and values do not describe the same fields
    #[error("Corrupt delta for {entity}: {source}")]
    CorruptDelta {
        entity: String,
        #[source]
        source: EntityStateError,
    },

    /// A reset request named the "no entity" id instead of omitting it
    #[error("Reset request for {resource} names the empty entity id")]
    MalformedReset { resource: String },
}
