#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod error;
mod ext;
mod kind;
mod read;
pub mod read_bytes;
pub mod size;
mod value;
mod write;
pub mod write_bytes;

pub use error::Error;
pub use ext::{
    Extension, ExtensionFactory, ExtensionRegistry, RawExtension, COMPLEX32_EXTENSION,
    COMPLEX64_EXTENSION, TIME_EXTENSION,
};
pub use kind::Kind;
pub use read::Reader;
pub use read_bytes::skip;
pub use value::{append_value, read_value, Value};
pub use write::Writer;

use std::io;

/// Serialize into a caller-owned buffer; the slice half of the contract
/// generated code implements.
pub trait Marshal {
    /// Append this value's encoding to `buf`.
    fn marshal_into(&self, buf: &mut Vec<u8>) -> Result<(), Error>;

    /// A pre-computed upper bound on the encoded size: the encoder never
    /// emits more than this many bytes for `self`.
    fn msg_size(&self) -> usize;
}

/// Deserialize from a borrowed buffer, returning the remaining input.
pub trait Unmarshal<'de>: Sized {
    /// Decode one value from the front of `bytes`.
    fn unmarshal(bytes: &'de [u8]) -> Result<(Self, &'de [u8]), Error>;
}

/// Serialize through a buffered [`Writer`]; the streaming half of the
/// contract generated code implements.
pub trait Encode {
    /// Write this value's encoding to `wr`.
    fn encode<W: io::Write>(&self, wr: &mut Writer<W>) -> Result<(), Error>;
}

/// Deserialize through a buffered [`Reader`].
pub trait Decode: Sized {
    /// Read one value from `rd`.
    fn decode<R: io::Read>(rd: &mut Reader<R>) -> Result<Self, Error>;
}

/// Encode a value to a fresh buffer sized by its [`Marshal::msg_size`]
/// bound.
pub fn to_vec<T: Marshal>(value: &T) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::with_capacity(value.msg_size());
    value.marshal_into(&mut buf)?;
    Ok(buf)
}

/// Decode a value from the front of `bytes`, ignoring any trailing input.
pub fn from_slice<'de, T: Unmarshal<'de>>(bytes: &'de [u8]) -> Result<T, Error> {
    let (value, _rest) = T::unmarshal(bytes)?;
    Ok(value)
}

impl Marshal for Value {
    fn marshal_into(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        value::append_value(buf, self)
    }

    fn msg_size(&self) -> usize {
        Value::msg_size(self)
    }
}

impl<'de> Unmarshal<'de> for Value {
    fn unmarshal(bytes: &'de [u8]) -> Result<(Self, &'de [u8]), Error> {
        value::read_value(bytes)
    }
}

impl Encode for Value {
    fn encode<W: io::Write>(&self, wr: &mut Writer<W>) -> Result<(), Error> {
        wr.write_value(self)
    }
}

impl Decode for Value {
    fn decode<R: io::Read>(rd: &mut Reader<R>) -> Result<Self, Error> {
        rd.read_value()
    }
}
