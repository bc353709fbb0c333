//! # Meadow Serde
//! Bit-level serialization for the messages exchanged between session peers.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod serde;
mod var_integer;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use error::SerdeErr;
pub use serde::Serde;
pub use var_integer::{SignedVariableInteger, UnsignedVariableInteger};
