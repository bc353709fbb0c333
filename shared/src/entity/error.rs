use thiserror::Error;

/// Errors raised while rebuilding an entity state from a delta
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityStateError {
    /// The diff mask flags a different number of fields than the delta carries
    #[error("Delta flags {flagged} changed fields but carries {supplied} values")]
    ChangeCountMismatch { flagged: usize, supplied: usize },

    /// The diff mask flags a field the baseline does not have
    #[error("Delta changes field {index} but the baseline only has {field_count} fields")]
    FieldOutOfRange { index: u8, field_count: usize },
}
