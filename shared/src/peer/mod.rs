pub mod peer_directory;
pub mod peer_record;
