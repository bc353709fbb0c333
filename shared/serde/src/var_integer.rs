use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

/// Unsigned integer written in `BITS`-wide chunks, each preceded by a
/// continuation bit. Small values cost `BITS + 1` bits.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedVariableInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedVariableInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }
}

/// Signed counterpart of [`UnsignedVariableInteger`], a sign bit followed by
/// the chunked magnitude.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SignedVariableInteger<const BITS: u8> {
    value: i64,
}

impl<const BITS: u8> SignedVariableInteger<BITS> {
    pub fn new<T: Into<i64>>(value: T) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> i64 {
        self.value
    }
}

fn write_chunks(writer: &mut dyn BitWrite, mut value: u64, bits: u8) {
    loop {
        let proceed = bits < 64 && value >= (1_u64 << bits);
        writer.write_bit(proceed);
        for _ in 0..bits {
            writer.write_bit(value & 1 != 0);
            value >>= 1;
        }
        if !proceed {
            return;
        }
    }
}

fn read_chunks(reader: &mut BitReader, bits: u8) -> Result<u64, SerdeErr> {
    let mut output: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let proceed = reader.read_bit()?;
        for _ in 0..bits {
            let bit = reader.read_bit()?;
            if bit {
                if shift >= 64 {
                    return Err(SerdeErr::ValueOutOfRange {
                        type_name: "u64",
                        value: output,
                    });
                }
                output |= 1 << shift;
            }
            shift += 1;
        }
        if !proceed {
            return Ok(output);
        }
    }
}

impl<const BITS: u8> Serde for UnsignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_chunks(writer, self.value, BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            value: read_chunks(reader, BITS)?,
        })
    }
}

impl<const BITS: u8> Serde for SignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(self.value < 0);
        write_chunks(writer, self.value.unsigned_abs(), BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let negative = reader.read_bit()?;
        let magnitude = read_chunks(reader, BITS)?;
        let value = if negative {
            if magnitude > (i64::MAX as u64) + 1 {
                return Err(SerdeErr::ValueOutOfRange {
                    type_name: "i64",
                    value: magnitude,
                });
            }
            (magnitude as i64).wrapping_neg()
        } else {
            i64::try_from(magnitude).map_err(|_| SerdeErr::ValueOutOfRange {
                type_name: "i64",
                value: magnitude,
            })?
        };
        Ok(Self { value })
    }
}
