use meadow_serde::{BitReader, BitWriter, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    messages::{error::MessageError, session_message::SessionMessage},
    types::PeerId,
};

/// A batch of messages from one peer, framed as `{sender, count, messages}`
#[derive(Clone, PartialEq, Debug)]
pub struct Packet {
    pub sender: PeerId,
    pub messages: Vec<SessionMessage>,
}

impl Packet {
    pub fn new(sender: PeerId, messages: Vec<SessionMessage>) -> Self {
        Self { sender, messages }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.sender.ser(&mut writer);
        UnsignedVariableInteger::<7>::new(self.messages.len() as u64).ser(&mut writer);
        for message in &self.messages {
            message.ser(&mut writer);
        }
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut reader = BitReader::new(bytes);
        let sender = PeerId::de(&mut reader)?;
        let count = UnsignedVariableInteger::<7>::de(&mut reader)?.get();
        if count > bytes.len() as u64 {
            return Err(MessageError::Decode(SerdeErr::ValueOutOfRange {
                type_name: "Packet.messages",
                value: count,
            }));
        }
        let mut messages = Vec::with_capacity(count as usize);
        for _ in 0..count {
            messages.push(SessionMessage::de(&mut reader)?);
        }
        if reader.bytes_remaining() > 0 {
            return Err(MessageError::TrailingBytes {
                remaining: reader.bytes_remaining(),
            });
        }
        Ok(Self { sender, messages })
    }
}
