use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    messages::entity_messages::{
        AuthorityTransferMessage, DeltaMessage, EntityLeftMessage, FullStateMessage,
        ResetRequest,
    },
    resource::{resource_id::ResourceId, resource_state::ResourceState},
    rpc::rpc_event::RpcEvent,
};

/// Every logical message peers exchange
#[derive(Clone, PartialEq, Debug)]
pub enum SessionMessage {
    /// Announces the sender's display name
    Hello(String),
    Subscribe(ResourceId),
    Unsubscribe(ResourceId),
    ResourceState(ResourceState),
    FullState(FullStateMessage),
    Delta(DeltaMessage),
    EntityLeft(EntityLeftMessage),
    AuthorityTransfer(AuthorityTransferMessage),
    Reset(ResetRequest),
    Rpc(RpcEvent),
}

impl SessionMessage {
    pub fn name(&self) -> &'static str {
        match self {
            SessionMessage::Hello(_) => "Hello",
            SessionMessage::Subscribe(_) => "Subscribe",
            SessionMessage::Unsubscribe(_) => "Unsubscribe",
            SessionMessage::ResourceState(_) => "ResourceState",
            SessionMessage::FullState(_) => "FullState",
            SessionMessage::Delta(_) => "Delta",
            SessionMessage::EntityLeft(_) => "EntityLeft",
            SessionMessage::AuthorityTransfer(_) => "AuthorityTransfer",
            SessionMessage::Reset(_) => "Reset",
            SessionMessage::Rpc(_) => "Rpc",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            SessionMessage::Hello(_) => 0,
            SessionMessage::Subscribe(_) => 1,
            SessionMessage::Unsubscribe(_) => 2,
            SessionMessage::ResourceState(_) => 3,
            SessionMessage::FullState(_) => 4,
            SessionMessage::Delta(_) => 5,
            SessionMessage::EntityLeft(_) => 6,
            SessionMessage::AuthorityTransfer(_) => 7,
            SessionMessage::Reset(_) => 8,
            SessionMessage::Rpc(_) => 9,
        }
    }
}

impl Serde for SessionMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.tag().ser(writer);
        match self {
            SessionMessage::Hello(name) => name.ser(writer),
            SessionMessage::Subscribe(resource) => resource.ser(writer),
            SessionMessage::Unsubscribe(resource) => resource.ser(writer),
            SessionMessage::ResourceState(state) => state.ser(writer),
            SessionMessage::FullState(message) => message.ser(writer),
            SessionMessage::Delta(message) => message.ser(writer),
            SessionMessage::EntityLeft(message) => message.ser(writer),
            SessionMessage::AuthorityTransfer(message) => message.ser(writer),
            SessionMessage::Reset(message) => message.ser(writer),
            SessionMessage::Rpc(event) => event.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let message = match u8::de(reader)? {
            0 => SessionMessage::Hello(String::de(reader)?),
            1 => SessionMessage::Subscribe(ResourceId::de(reader)?),
            2 => SessionMessage::Unsubscribe(ResourceId::de(reader)?),
            3 => SessionMessage::ResourceState(ResourceState::de(reader)?),
            4 => SessionMessage::FullState(FullStateMessage::de(reader)?),
            5 => SessionMessage::Delta(DeltaMessage::de(reader)?),
            6 => SessionMessage::EntityLeft(EntityLeftMessage::de(reader)?),
            7 => SessionMessage::AuthorityTransfer(AuthorityTransferMessage::de(reader)?),
            8 => SessionMessage::Reset(ResetRequest::de(reader)?),
            9 => SessionMessage::Rpc(RpcEvent::de(reader)?),
            tag => {
                return Err(SerdeErr::InvalidTag {
                    type_name: "SessionMessage",
                    tag,
                })
            }
        };
        Ok(message)
    }
}
