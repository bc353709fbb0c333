use std::default::Default;

use meadow_shared::RpcConfig;

/// Contains Config properties which will be used by a Session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Every how many ticks owned resources publish a `ResourceState`
    pub state_interval_ticks: u64,
    /// Every how many ticks an empty packet goes to each peer, so quiet
    /// peers still look alive
    pub heartbeat_interval_ticks: u64,
    /// A peer silent for longer than this many ticks is dropped
    pub peer_timeout_ticks: u64,
    /// Remote procedure settings
    pub rpc: RpcConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_interval_ticks: 20,
            heartbeat_interval_ticks: 10,
            peer_timeout_ticks: 200,
            rpc: RpcConfig::default(),
        }
    }
}
