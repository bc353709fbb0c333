use std::fmt;

use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// One bit per entity field, set when the field changed since a baseline
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DiffMask {
    mask: Vec<u8>,
}

impl DiffMask {
    /// Create a new DiffMask able to hold `field_count` bits
    pub fn new(field_count: u8) -> Self {
        let byte_count = (field_count as usize).div_ceil(8);
        Self {
            mask: vec![0; byte_count],
        }
    }

    /// Gets the bit at the specified position within the DiffMask
    pub fn bit(&self, index: u8) -> Option<bool> {
        let byte = self.mask.get((index / 8) as usize)?;
        Some(byte & (1 << (index % 8)) != 0)
    }

    /// Sets the bit at the specified position within the DiffMask.
    /// Positions beyond the mask's capacity are ignored.
    pub fn set_bit(&mut self, index: u8, value: bool) {
        let Some(byte) = self.mask.get_mut((index / 8) as usize) else {
            return;
        };
        let adjusted_index = index % 8;
        let bit_mask = 1 << adjusted_index;
        if value {
            *byte |= bit_mask;
        } else {
            *byte &= !bit_mask;
        }
    }

    pub fn clear(&mut self) {
        for byte in self.mask.iter_mut() {
            *byte = 0;
        }
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    pub fn byte_count(&self) -> usize {
        self.mask.len()
    }

    /// Indices of every set bit, ascending
    pub fn set_indices(&self) -> Vec<u8> {
        let mut output = Vec::new();
        for (byte_index, byte) in self.mask.iter().enumerate() {
            for bit in 0..8_u8 {
                if byte & (1 << bit) != 0 {
                    output.push((byte_index * 8) as u8 + bit);
                }
            }
        }
        output
    }

    /// Performs a bitwise OR with another DiffMask of the same size
    pub fn or(&mut self, other: &DiffMask) {
        for (byte, other_byte) in self.mask.iter_mut().zip(other.mask.iter()) {
            *byte |= other_byte;
        }
    }
}

impl fmt::Debug for DiffMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiffMask(")?;
        for byte in &self.mask {
            write!(f, "{:08b}", byte.reverse_bits())?;
        }
        write!(f, ")")
    }
}

impl Serde for DiffMask {
    fn ser(&self, writer: &mut dyn BitWrite) {
        (self.mask.len() as u8).ser(writer);
        for byte in &self.mask {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let byte_count = u8::de(reader)?;
        // 255 fields is the most a mask can index
        if byte_count > 32 {
            return Err(SerdeErr::ValueOutOfRange {
                type_name: "DiffMask",
                value: byte_count as u64,
            });
        }
        let mut mask = Vec::with_capacity(byte_count as usize);
        for _ in 0..byte_count {
            mask.push(reader.read_byte()?);
        }
        Ok(Self { mask })
    }
}
