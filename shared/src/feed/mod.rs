pub mod error;
pub mod feed_receiver;
pub mod feed_sender;
