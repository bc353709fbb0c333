use log::trace;

use crate::{
    entity::{
        entity_id::EntityId,
        entity_state::{EntityState, FieldDiff},
    },
    messages::entity_messages::{DeltaMessage, FullStateMessage},
    resource::resource_id::ResourceId,
    types::{FeedVersion, PeerId},
};

/// What a capture decided to send
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FeedPayload {
    Full(FullStateMessage),
    Delta(DeltaMessage),
}

impl FeedPayload {
    pub fn version(&self) -> FeedVersion {
        match self {
            FeedPayload::Full(message) => message.version,
            FeedPayload::Delta(message) => message.version,
        }
    }
}

/// Authority side of an entity feed. One exists per subscribing peer per
/// entity, and remembers the last state that peer was sent.
pub struct FeedSender {
    subscriber: PeerId,
    resource: ResourceId,
    entity: EntityId,
    baseline: Option<(FeedVersion, EntityState)>,
    next_version: FeedVersion,
}

impl FeedSender {
    pub fn new(subscriber: PeerId, resource: ResourceId, entity: EntityId) -> Self {
        Self {
            subscriber,
            resource,
            entity,
            baseline: None,
            next_version: 0,
        }
    }

    pub fn subscriber(&self) -> PeerId {
        self.subscriber
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline_version(&self) -> Option<FeedVersion> {
        self.baseline.as_ref().map(|(version, _)| *version)
    }

    /// Forgets the baseline so the next capture is a full state.
    /// Returns whether a baseline was actually dropped.
    pub fn reset_deltas(&mut self) -> bool {
        if self.baseline.take().is_some() {
            trace!(
                "feed {} -> {} reset, next version {}",
                self.entity,
                self.subscriber,
                self.next_version
            );
            true
        } else {
            false
        }
    }

    /// Compares `current` against the baseline and produces the message the
    /// subscriber needs, advancing the baseline. Returns `None` when nothing
    /// changed.
    pub fn capture_delta(&mut self, current: &EntityState) -> Option<FeedPayload> {
        let payload = match &self.baseline {
            None => None,
            Some((baseline_version, baseline_state)) => match current.diff(baseline_state) {
                FieldDiff::Unchanged => return None,
                FieldDiff::Incompatible => None,
                FieldDiff::Changed(mask) => Some(FeedPayload::Delta(DeltaMessage {
                    resource: self.resource.clone(),
                    entity: self.entity,
                    baseline: *baseline_version,
                    version: self.next_version,
                    values: current.changed_fields(&mask),
                    changed: mask,
                })),
            },
        };

        let payload = payload.unwrap_or_else(|| {
            FeedPayload::Full(FullStateMessage {
                resource: self.resource.clone(),
                entity: self.entity,
                version: self.next_version,
                state: current.clone(),
            })
        });

        self.baseline = Some((self.next_version, current.clone()));
        self.next_version = self.next_version.wrapping_add(1);
        Some(payload)
    }
}
