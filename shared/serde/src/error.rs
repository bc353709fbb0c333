use thiserror::Error;

/// Errors raised while decoding a bit stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The buffer ended before the value was complete
    #[error("Unexpected end of buffer while reading")]
    UnexpectedEnd,

    /// An enum discriminant outside the known range was read
    #[error("Invalid tag {tag} while reading {type_name}")]
    InvalidTag { type_name: &'static str, tag: u8 },

    /// A string payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// A variable-length integer or length prefix does not fit its target type
    #[error("Value {value} does not fit in {type_name}")]
    ValueOutOfRange { type_name: &'static str, value: u64 },
}
