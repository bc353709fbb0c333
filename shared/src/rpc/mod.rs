pub mod arg;
pub mod error;
pub mod once_window;
pub mod procedure_registry;
pub mod rpc_config;
pub mod rpc_dispatcher;
pub mod rpc_event;
