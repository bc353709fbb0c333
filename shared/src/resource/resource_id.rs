use std::fmt;

use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// Level of a resource in the lobby → world → room hierarchy
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum ResourceKind {
    Lobby,
    World,
    Room,
}

impl ResourceKind {
    /// The kind of resource this kind constructs while activating
    pub fn child_kind(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Lobby => Some(ResourceKind::World),
            ResourceKind::World => Some(ResourceKind::Room),
            ResourceKind::Room => None,
        }
    }

    /// Whether activation needs a bound simulation object
    pub fn requires_binding(&self) -> bool {
        matches!(self, ResourceKind::World)
    }

    fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::Lobby => "lobby",
            ResourceKind::World => "world",
            ResourceKind::Room => "room",
        }
    }

    fn to_tag(self) -> u8 {
        match self {
            ResourceKind::Lobby => 0,
            ResourceKind::World => 1,
            ResourceKind::Room => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, SerdeErr> {
        match tag {
            0 => Ok(ResourceKind::Lobby),
            1 => Ok(ResourceKind::World),
            2 => Ok(ResourceKind::Room),
            _ => Err(SerdeErr::InvalidTag {
                type_name: "ResourceKind",
                tag,
            }),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
struct ResourceSegment {
    kind: ResourceKind,
    name: String,
}

/// Typed path from the lobby down to a resource, e.g. `lobby:main/world:SU/room:SU_A01`.
///
/// Identifiers are derived from names, so two peers that load the same
/// region compute the same id without coordination.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ResourceId {
    segments: Vec<ResourceSegment>,
}

impl ResourceId {
    pub fn lobby<S: Into<String>>(name: S) -> Self {
        Self {
            segments: vec![ResourceSegment {
                kind: ResourceKind::Lobby,
                name: name.into(),
            }],
        }
    }

    /// The id of a world below this lobby
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a lobby id.
    pub fn world<S: Into<String>>(&self, region: S) -> Self {
        self.try_child(region).expect("worlds can only be created below a lobby")
    }

    /// The id of a room below this world
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a world id.
    pub fn room<S: Into<String>>(&self, room: S) -> Self {
        assert_eq!(self.kind(), ResourceKind::World, "rooms can only be created below a world");
        self.try_child(room).expect("rooms can only be created below a world")
    }

    /// The id of the child with the given name, if this kind has children
    pub fn try_child<S: Into<String>>(&self, name: S) -> Option<Self> {
        let kind = self.kind().child_kind()?;
        let mut segments = self.segments.clone();
        segments.push(ResourceSegment {
            kind,
            name: name.into(),
        });
        Some(Self { segments })
    }

    pub fn kind(&self) -> ResourceKind {
        self.last().kind
    }

    pub fn name(&self) -> &str {
        &self.last().name
    }

    pub fn parent(&self) -> Option<ResourceId> {
        if self.segments.len() <= 1 {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_ancestor_of(&self, other: &ResourceId) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    fn last(&self) -> &ResourceSegment {
        // constructors never produce an empty path
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}:{}", segment.kind.prefix(), segment.name)?;
        }
        Ok(())
    }
}

impl Serde for ResourceId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        (self.segments.len() as u8).ser(writer);
        for segment in &self.segments {
            segment.kind.to_tag().ser(writer);
            segment.name.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let count = u8::de(reader)?;
        if count == 0 || count > 3 {
            return Err(SerdeErr::ValueOutOfRange {
                type_name: "ResourceId",
                value: count as u64,
            });
        }

        let mut segments: Vec<ResourceSegment> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let tag = u8::de(reader)?;
            let kind = ResourceKind::from_tag(tag)?;
            let expected = match segments.last() {
                Some(parent) => parent.kind.child_kind(),
                None => Some(ResourceKind::Lobby),
            };
            if expected != Some(kind) {
                return Err(SerdeErr::InvalidTag {
                    type_name: "ResourceId",
                    tag,
                });
            }
            let name = String::de(reader)?;
            segments.push(ResourceSegment { kind, name });
        }

        Ok(Self { segments })
    }
}
