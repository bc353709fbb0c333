use crate::{
    bit_reader::BitReader,
    bit_writer::{BitCounter, BitWrite},
    error::SerdeErr,
    var_integer::UnsignedVariableInteger,
};

/// A type that can be written to and read back from a bit stream
pub trait Serde: Sized {
    fn ser(&self, writer: &mut dyn BitWrite);

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Number of bits `ser` will write
    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits()
    }
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_byte(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_byte()
    }

    fn bit_length(&self) -> u32 {
        8
    }
}

macro_rules! impl_serde_for_le_bytes {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    for byte in self.to_le_bytes() {
                        writer.write_byte(byte);
                    }
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let mut bytes = [0_u8; std::mem::size_of::<$ty>()];
                    for byte in bytes.iter_mut() {
                        *byte = reader.read_byte()?;
                    }
                    Ok(<$ty>::from_le_bytes(bytes))
                }

                fn bit_length(&self) -> u32 {
                    (std::mem::size_of::<$ty>() * 8) as u32
                }
            }
        )*
    };
}

impl_serde_for_le_bytes!(u16, u32, u64, i16, i32, i64, f32);

fn write_length(writer: &mut dyn BitWrite, length: usize) {
    UnsignedVariableInteger::<7>::new(length as u64).ser(writer);
}

fn read_length(reader: &mut BitReader) -> Result<usize, SerdeErr> {
    let length = UnsignedVariableInteger::<7>::de(reader)?.get();
    // every element costs at least one bit, so a length beyond the buffer is corrupt
    if length > (reader.bytes_remaining() as u64 + 1) * 8 {
        return Err(SerdeErr::ValueOutOfRange {
            type_name: "length",
            value: length,
        });
    }
    Ok(length as usize)
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_length(writer, self.len());
        for byte in self.as_bytes() {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader)?;
        let mut bytes = Vec::with_capacity(length);
        for _ in 0..length {
            bytes.push(reader.read_byte()?);
        }
        String::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_length(writer, self.len());
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = read_length(reader)?;
        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }
}
