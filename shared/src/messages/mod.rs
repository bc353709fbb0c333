pub mod entity_messages;
pub mod error;
pub mod packet;
pub mod session_message;
