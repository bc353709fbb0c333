use std::fmt;

use crate::resource::resource_id::ResourceId;

/// Identity of a simulation object (a loaded world, a realized room) as
/// handed out by the integration layer
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ExternalKey(u64);

impl ExternalKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Capability implemented outside the core that lets resources inspect the
/// simulation while activating
pub trait ResourceAdapter {
    /// Whether the simulation object behind `key` is still loaded
    fn has_object(&self, key: ExternalKey) -> bool;

    /// Names of the child resources `resource` constructs while activating.
    /// For a world this is one name per room the bound simulation world knows.
    fn children_of(&self, resource: &ResourceId, binding: Option<ExternalKey>) -> Vec<String>;
}
