use crate::error::SerdeErr;

pub struct BitReader<'b> {
    buffer: &'b [u8],
    buffer_index: usize,
    scratch: u8,
    scratch_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            buffer_index: 0,
            scratch: 0,
            scratch_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.scratch_index == 0 {
            let Some(byte) = self.buffer.get(self.buffer_index) else {
                return Err(SerdeErr::UnexpectedEnd);
            };
            self.buffer_index += 1;
            self.scratch = *byte;
            self.scratch_index = 8;
        }

        let bit = self.scratch & 1 != 0;
        self.scratch >>= 1;
        self.scratch_index -= 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    /// Number of whole bytes not yet touched by the reader.
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.buffer_index
    }
}
