use thiserror::Error;

/// Errors raised while registering, invoking or dispatching procedures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// No procedure with this name is registered
    #[error("Procedure {name:?} not found. Register it with ProcedureRegistry::register before the session starts")]
    ProcedureNotFound { name: String },

    /// The call supplied the wrong number of arguments
    #[error("Procedure {name:?} takes {expected} arguments, {supplied} supplied")]
    ArgumentCount {
        name: String,
        expected: usize,
        supplied: usize,
    },

    /// An argument does not match the registered parameter kind
    #[error("Procedure {name:?} argument {index} should be {expected}, got {supplied}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: &'static str,
        supplied: &'static str,
    },

    /// A procedure with this name is already registered
    #[error("Procedure {name:?} is already registered")]
    DuplicateProcedure { name: String },

    /// The registry was locked when the session started
    #[error("Procedure registry is locked and cannot be modified")]
    RegistryLocked,

    /// The event was addressed to another peer, or is a broadcast that came
    /// back to its sender
    #[error("RPC event for {target} delivered to peer {local}")]
    MisroutedEvent { target: String, local: u64 },

    /// An invoke-once event that already executed
    #[error("RPC event {sequence} from peer {sender} already executed")]
    DuplicateOnce { sender: u64, sequence: u16 },
}
