use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    entity::{diff_mask::DiffMask, error::EntityStateError},
    types::{EntityTypeId, PeerId},
};

/// Opaque serialized value of a single entity field
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FieldValue(Vec<u8>);

impl FieldValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for FieldValue {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serde for FieldValue {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(Vec::<u8>::de(reader)?))
    }
}

/// Outcome of comparing a state against a baseline
#[derive(Debug, PartialEq, Eq)]
pub enum FieldDiff {
    Unchanged,
    Changed(DiffMask),
    /// The well-known fields or the field layout differ, only a full state will do
    Incompatible,
}

/// Snapshot of an entity as produced by its external serializer.
///
/// `owner` and `type_id` are interpreted by the replication core, the field
/// payloads are not.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntityState {
    owner: PeerId,
    type_id: EntityTypeId,
    fields: Vec<FieldValue>,
}

impl EntityState {
    /// Maximum number of fields a diff mask can address
    pub const MAX_FIELDS: usize = u8::MAX as usize;

    pub fn new(owner: PeerId, type_id: EntityTypeId, fields: Vec<FieldValue>) -> Self {
        Self {
            owner,
            type_id,
            fields,
        }
    }

    pub fn owner(&self) -> PeerId {
        self.owner
    }

    pub fn type_id(&self) -> EntityTypeId {
        self.type_id
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    pub fn set_field(&mut self, index: usize, value: FieldValue) {
        if let Some(field) = self.fields.get_mut(index) {
            *field = value;
        }
    }

    pub fn set_owner(&mut self, owner: PeerId) {
        self.owner = owner;
    }

    /// Compares `self` against `baseline` field by field
    pub fn diff(&self, baseline: &EntityState) -> FieldDiff {
        if self.owner != baseline.owner
            || self.type_id != baseline.type_id
            || self.fields.len() != baseline.fields.len()
            || self.fields.len() > Self::MAX_FIELDS
        {
            return FieldDiff::Incompatible;
        }

        let mut mask = DiffMask::new(self.fields.len() as u8);
        for (index, (current, previous)) in self.fields.iter().zip(baseline.fields.iter()).enumerate() {
            if current != previous {
                mask.set_bit(index as u8, true);
            }
        }

        if mask.is_clear() {
            FieldDiff::Unchanged
        } else {
            FieldDiff::Changed(mask)
        }
    }

    /// Values of the fields flagged in `mask`, in ascending index order
    pub fn changed_fields(&self, mask: &DiffMask) -> Vec<FieldValue> {
        mask.set_indices()
            .into_iter()
            .filter_map(|index| self.fields.get(index as usize).cloned())
            .collect()
    }

    /// Returns a copy of `self` with the masked fields replaced by `values`
    pub fn with_changes(
        &self,
        mask: &DiffMask,
        values: &[FieldValue],
    ) -> Result<EntityState, EntityStateError> {
        let indices = mask.set_indices();
        if indices.len() != values.len() {
            return Err(EntityStateError::ChangeCountMismatch {
                flagged: indices.len(),
                supplied: values.len(),
            });
        }

        let mut output = self.clone();
        for (index, value) in indices.into_iter().zip(values.iter()) {
            let Some(field) = output.fields.get_mut(index as usize) else {
                return Err(EntityStateError::FieldOutOfRange {
                    index,
                    field_count: self.fields.len(),
                });
            };
            *field = value.clone();
        }
        Ok(output)
    }
}

impl Serde for EntityState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.owner.ser(writer);
        self.type_id.ser(writer);
        self.fields.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let owner = PeerId::de(reader)?;
        let type_id = EntityTypeId::de(reader)?;
        let fields = Vec::<FieldValue>::de(reader)?;
        Ok(Self {
            owner,
            type_id,
            fields,
        })
    }
}
