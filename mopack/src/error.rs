//! Decode and encode errors, with the resumability classifier.

use core::fmt;

use crate::kind::Kind;

/// Everything that can go wrong while encoding or decoding.
///
/// Resumability is a property of the error, not a hierarchy: after a
/// resumable error the stream cursor still sits at the start of the
/// offending object, so the caller may peek at the actual kind and dispatch
/// differently, or skip past the object. After a non-resumable error the
/// framing is lost and the stream must be dropped.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Insufficient input for the current object.
    ShortBytes,
    /// A leading byte the format never assigns (`0xc1`); the stream is
    /// corrupt.
    InvalidPrefix(u8),
    /// A decoding method was applied to an object of a different kind.
    TypeMismatch {
        /// The kind the method decodes.
        wanted: Kind,
        /// The kind actually encoded.
        got: Kind,
    },
    /// A signed integer did not fit the requested width.
    IntOverflow {
        /// The decoded value (wrapped if it exceeded 64 bits signed).
        value: i64,
        /// The bit width it failed to fit.
        bits: u8,
    },
    /// An unsigned integer did not fit the requested width.
    UintOverflow {
        /// The decoded value (wrapped if it was negative).
        value: u64,
        /// The bit width it failed to fit.
        bits: u8,
    },
    /// A fixed-size array decode found the wrong element count.
    ArraySize {
        /// The expected element count.
        wanted: u32,
        /// The count on the wire.
        got: u32,
    },
    /// The wire extension type id does not match the caller's extension.
    ExtensionType {
        /// The id the caller's extension declares.
        wanted: i8,
        /// The id on the wire.
        got: i8,
    },
    /// A `str` payload that is not valid UTF-8. The cursor has not moved;
    /// the object can be re-read as `bin`.
    InvalidUtf8,
    /// A timestamp outside the range the wire encoding can carry.
    TimeOutOfRange,
    /// The sink or source failed; the stream is dead.
    Io(std::io::Error),
    /// An unreachable decoding path was triggered.
    Fatal,
}

impl Error {
    /// Whether the stream cursor is still at the start of the offending
    /// object, so decoding may continue with a different method or a skip.
    pub fn is_resumable(&self) -> bool {
        match self {
            Error::ShortBytes
            | Error::TypeMismatch { .. }
            | Error::IntOverflow { .. }
            | Error::UintOverflow { .. }
            | Error::ArraySize { .. }
            | Error::ExtensionType { .. }
            | Error::InvalidUtf8 => true,
            Error::InvalidPrefix(_) | Error::TimeOutOfRange | Error::Io(_) | Error::Fatal => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ShortBytes => f.write_str("too few bytes left to read object"),
            Error::InvalidPrefix(lead) => {
                write!(f, "unrecognized type prefix 0x{lead:02x}")
            }
            Error::TypeMismatch { wanted, got } => {
                write!(f, "attempted to decode type {got} with method for {wanted}")
            }
            Error::IntOverflow { value, bits } => {
                write!(f, "{value} overflows int{bits}")
            }
            Error::UintOverflow { value, bits } => {
                write!(f, "{value} overflows uint{bits}")
            }
            Error::ArraySize { wanted, got } => {
                write!(f, "wanted array of size {wanted}; got {got}")
            }
            Error::ExtensionType { wanted, got } => {
                write!(f, "error decoding extension: wanted type {wanted}; got type {got}")
            }
            Error::InvalidUtf8 => f.write_str("str payload is not valid UTF-8"),
            Error::TimeOutOfRange => f.write_str("timestamp out of encodable range"),
            Error::Io(err) => write!(f, "i/o: {err}"),
            Error::Fatal => f.write_str("fatal decoding error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resumability() {
        assert!(Error::ShortBytes.is_resumable());
        assert!(Error::TypeMismatch { wanted: Kind::Int, got: Kind::Map }.is_resumable());
        assert!(Error::IntOverflow { value: 300, bits: 8 }.is_resumable());
        assert!(Error::ExtensionType { wanted: 10, got: 11 }.is_resumable());
        assert!(!Error::InvalidPrefix(0xc1).is_resumable());
        assert!(!Error::Fatal.is_resumable());
    }

    #[test]
    fn messages_name_both_sides() {
        let err = Error::TypeMismatch { wanted: Kind::Float32, got: Kind::Map };
        let msg = err.to_string();
        assert!(msg.contains("map"));
        assert!(msg.contains("float32"));
    }
}
