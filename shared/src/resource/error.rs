use thiserror::Error;

/// Errors that leave a resource `Unloaded` after an activation attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// The simulation object backing the resource is not loaded (or not bound)
    #[error("Cannot activate {resource} - its simulation object is not loaded")]
    MissingExternalObject { resource: String },

    /// Children may only activate below an active parent
    #[error("Cannot activate {resource} - parent {parent} is not active")]
    ParentInactive { resource: String, parent: String },

    /// The resource is not in the tree
    #[error("Cannot activate {resource} - resource not found")]
    UnknownResource { resource: String },

    /// Activation was requested while the resource was mid-transition
    #[error("Cannot activate {resource} while it is {status}")]
    InTransition {
        resource: String,
        status: &'static str,
    },
}

/// Errors raised by structural operations on the resource tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A message or call referenced a resource that does not exist locally
    #[error("Resource {resource} not found")]
    UnknownResource { resource: String },

    /// The resource exists but is not active
    #[error("Resource {resource} is not active")]
    ResourceInactive { resource: String },

    /// Attempted to add a resource that already exists
    #[error("Resource {resource} already exists")]
    DuplicateResource { resource: String },

    /// The child id is not directly below the given parent
    #[error("Resource {child} is not a direct child of {parent}")]
    NotAChild { parent: String, child: String },

    /// Only lobby ids may be roots
    #[error("Resource {resource} cannot be a root")]
    InvalidRoot { resource: String },

    /// The simulation object is already bound to another resource
    #[error("Simulation object {key} is already bound to {resource}")]
    DuplicateBinding { key: u64, resource: String },

    /// A state arrived from a peer that does not own the resource
    #[error("Peer {sender} sent state for {resource} but does not own it")]
    NotResourceOwner { resource: String, sender: u64 },
}
