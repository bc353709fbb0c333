use log::debug;

use crate::{
    entity::{entity_id::EntityId, entity_state::EntityState},
    feed::error::FeedError,
    messages::entity_messages::{DeltaMessage, FullStateMessage},
    types::{FeedVersion, PeerId},
    wrapping_number::sequence_greater_than,
};

/// Deltas dropped while awaiting a full state before the reset request is
/// sent again, in case the request or its answer was lost
pub const RESET_RETRY_AFTER: u16 = 32;

/// Mirror side of an entity feed: the last state applied from the
/// authoritative peer.
pub struct FeedReceiver {
    authority: PeerId,
    entity: EntityId,
    applied: Option<(FeedVersion, EntityState)>,
    awaiting_full: bool,
    dropped_while_awaiting: u16,
}

impl FeedReceiver {
    pub fn new(authority: PeerId, entity: EntityId) -> Self {
        Self {
            authority,
            entity,
            applied: None,
            awaiting_full: false,
            dropped_while_awaiting: 0,
        }
    }

    pub fn authority(&self) -> PeerId {
        self.authority
    }

    pub fn applied_version(&self) -> Option<FeedVersion> {
        self.applied.as_ref().map(|(version, _)| *version)
    }

    pub fn state(&self) -> Option<&EntityState> {
        self.applied.as_ref().map(|(_, state)| state)
    }

    pub fn is_awaiting_full(&self) -> bool {
        self.awaiting_full
    }

    /// Marks the feed as waiting for a full state. Returns `true` for the
    /// first call of an episode, so a single `ResetRequest` goes out, and
    /// again every [`RESET_RETRY_AFTER`] calls while still waiting.
    pub fn request_reset(&mut self) -> bool {
        if !self.awaiting_full {
            self.awaiting_full = true;
            self.dropped_while_awaiting = 0;
            return true;
        }
        self.dropped_while_awaiting += 1;
        if self.dropped_while_awaiting < RESET_RETRY_AFTER {
            return false;
        }
        self.dropped_while_awaiting = 0;
        true
    }

    /// Applies a full state. Returns `Ok(None)` when the message is a
    /// duplicate or older than what is applied.
    pub fn receive_full(
        &mut self,
        message: &FullStateMessage,
    ) -> Result<Option<&EntityState>, FeedError> {
        if let Some((version, _)) = &self.applied {
            if !sequence_greater_than(message.version, *version) {
                debug!(
                    "dropping full state {} for {}, already at {}",
                    message.version, self.entity, version
                );
                return Ok(None);
            }
        }

        self.awaiting_full = false;
        self.dropped_while_awaiting = 0;
        self.applied = Some((message.version, message.state.clone()));
        Ok(self.state())
    }

    /// Applies a delta on top of the held baseline
    pub fn receive_delta(
        &mut self,
        message: &DeltaMessage,
    ) -> Result<Option<&EntityState>, FeedError> {
        let Some((version, state)) = &self.applied else {
            return Err(FeedError::StaleFeed {
                entity: self.entity.to_string(),
                baseline: message.baseline,
                local: None,
            });
        };

        if !sequence_greater_than(message.version, *version) {
            debug!(
                "dropping delta {} for {}, already at {}",
                message.version, self.entity, version
            );
            return Ok(None);
        }

        if message.baseline != *version {
            return Err(FeedError::StaleFeed {
                entity: self.entity.to_string(),
                baseline: message.baseline,
                local: Some(*version),
            });
        }

        let updated = state
            .with_changes(&message.changed, &message.values)
            .map_err(|source| FeedError::CorruptDelta {
                entity: self.entity.to_string(),
                source,
            })?;
        self.applied = Some((message.version, updated));
        Ok(self.state())
    }
}
