/// Contains config properties which will be used by the RPC dispatcher
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// How many invoke-once sequences are remembered per sender and
    /// stream. Sequences wrap at `u16`, so a stream must not get more than
    /// 32768 calls ahead of what its receiver has seen.
    pub once_window: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { once_window: 256 }
    }
}
