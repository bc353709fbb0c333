use thiserror::Error;

use crate::{
    feed::error::FeedError,
    messages::error::MessageError,
    resource::error::{ActivationError, ResourceError},
    rpc::error::RpcError,
};

/// Any error the replication core can raise while handling one message or
/// one call. Every variant is recoverable within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
