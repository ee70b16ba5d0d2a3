//! The dynamic [`Value`]: a self-describing, owned MessagePack object for
//! paths where no concrete type is known ahead of decoding.

use std::time::SystemTime;

use num_complex::{Complex32, Complex64};

use crate::error::Error;
use crate::ext::{
    RawExtension, COMPLEX32_EXTENSION, COMPLEX64_EXTENSION, TIME_EXTENSION,
};
use crate::kind::Kind;
use crate::{read_bytes, size, write_bytes};

/// Any MessagePack object, decoded into owned storage.
///
/// Integers normalize by wire family: signed prefixes and fixints decode to
/// [`Value::Int`], unsigned prefixes to [`Value::Uint`]. Equality treats an
/// `Int` and a `Uint` carrying the same numeric value as equal, so a
/// normalize-on-re-encode round trip still compares clean. Map keys are
/// strings, as everywhere on this wire.
#[derive(Debug, Clone)]
pub enum Value {
    /// `nil`.
    Nil,
    /// A boolean.
    Bool(bool),
    /// An integer decoded from a signed encoding.
    Int(i64),
    /// An integer decoded from an unsigned encoding.
    Uint(u64),
    /// A single-precision float.
    F32(f32),
    /// A double-precision float.
    F64(f64),
    /// A UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bin(Vec<u8>),
    /// A sequence.
    Array(Vec<Value>),
    /// A string-keyed map, in wire order.
    Map(Vec<(String, Value)>),
    /// An extension with no reserved meaning.
    Ext(RawExtension),
    /// The reserved complex-of-`f32` extension.
    Complex32(Complex32),
    /// The reserved complex-of-`f64` extension.
    Complex64(Complex64),
    /// The reserved timestamp extension.
    Time(SystemTime),
}

impl Value {
    /// The wire kind this value encodes as.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::F32(_) => Kind::Float32,
            Value::F64(_) => Kind::Float64,
            Value::Str(_) => Kind::Str,
            Value::Bin(_) => Kind::Bin,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Ext(_) | Value::Complex32(_) | Value::Complex64(_) | Value::Time(_) => Kind::Ext,
        }
    }

    /// Pre-computed upper bound on the encoded size.
    pub fn msg_size(&self) -> usize {
        match self {
            Value::Nil => size::NIL,
            Value::Bool(_) => size::BOOL,
            Value::Int(_) => size::INT,
            Value::Uint(_) => size::UINT,
            Value::F32(_) => size::FLOAT32,
            Value::F64(_) => size::FLOAT64,
            Value::Str(s) => size::str_size(s.len()),
            Value::Bin(b) => size::bin_size(b.len()),
            Value::Array(els) => {
                size::ARRAY_HEADER + els.iter().map(Value::msg_size).sum::<usize>()
            }
            Value::Map(pairs) => {
                size::MAP_HEADER
                    + pairs
                        .iter()
                        .map(|(k, v)| size::str_size(k.len()) + v.msg_size())
                        .sum::<usize>()
            }
            Value::Ext(raw) => size::ext_size(raw.data.len()),
            Value::Complex32(_) => size::COMPLEX32,
            Value::Complex64(_) => size::COMPLEX64,
            Value::Time(_) => size::TIME,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Uint(a), Uint(b)) => a == b,
            (Int(a), Uint(b)) | (Uint(b), Int(a)) => *a >= 0 && *a as u64 == *b,
            (F32(a), F32(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bin(a), Bin(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Ext(a), Ext(b)) => a == b,
            (Complex32(a), Complex32(b)) => a == b,
            (Complex64(a), Complex64(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Decode the next object into an owned [`Value`].
pub fn read_value(b: &[u8]) -> Result<(Value, &[u8]), Error> {
    let kind = read_bytes::next_kind(b)?;
    log::trace!("reading {kind} into Value");
    match kind {
        Kind::Nil => read_bytes::read_nil(b).map(|rest| (Value::Nil, rest)),
        Kind::Bool => read_bytes::read_bool(b).map(|(v, rest)| (Value::Bool(v), rest)),
        Kind::Int => read_bytes::read_i64(b).map(|(v, rest)| (Value::Int(v), rest)),
        Kind::Uint => read_bytes::read_u64(b).map(|(v, rest)| (Value::Uint(v), rest)),
        Kind::Float32 => read_bytes::read_f32(b).map(|(v, rest)| (Value::F32(v), rest)),
        Kind::Float64 => read_bytes::read_f64(b).map(|(v, rest)| (Value::F64(v), rest)),
        Kind::Str => read_bytes::read_str(b).map(|(s, rest)| (Value::Str(s.to_owned()), rest)),
        Kind::Bin => read_bytes::read_bin(b).map(|(d, rest)| (Value::Bin(d.to_vec()), rest)),
        Kind::Array => {
            let (len, mut rest) = read_bytes::read_array_header(b)?;
            let mut els = Vec::with_capacity(len.min(4096) as usize);
            for _ in 0..len {
                let (el, r) = read_value(rest)?;
                els.push(el);
                rest = r;
            }
            Ok((Value::Array(els), rest))
        }
        Kind::Map => {
            let (len, mut rest) = read_bytes::read_map_header(b)?;
            let mut pairs = Vec::with_capacity(len.min(4096) as usize);
            for _ in 0..len {
                let (key, r) = read_bytes::read_str(rest)?;
                let (val, r) = read_value(r)?;
                pairs.push((key.to_owned(), val));
                rest = r;
            }
            Ok((Value::Map(pairs), rest))
        }
        Kind::Ext => match read_bytes::peek_ext_type(b)? {
            COMPLEX32_EXTENSION => {
                read_bytes::read_complex32(b).map(|(v, rest)| (Value::Complex32(v), rest))
            }
            COMPLEX64_EXTENSION => {
                read_bytes::read_complex64(b).map(|(v, rest)| (Value::Complex64(v), rest))
            }
            TIME_EXTENSION => read_bytes::read_time(b).map(|(v, rest)| (Value::Time(v), rest)),
            typ => {
                let mut raw = RawExtension { typ, data: Vec::new() };
                let rest = read_bytes::read_ext(b, &mut raw)?;
                Ok((Value::Ext(raw), rest))
            }
        },
        Kind::Invalid => Err(Error::InvalidPrefix(b[0])),
    }
}

/// Append a [`Value`] with the tightest encoding of each node.
pub fn append_value(buf: &mut Vec<u8>, v: &Value) -> Result<(), Error> {
    log::trace!("appending {} Value", v.kind());
    match v {
        Value::Nil => write_bytes::append_nil(buf),
        Value::Bool(v) => write_bytes::append_bool(buf, *v),
        Value::Int(v) => write_bytes::append_i64(buf, *v),
        Value::Uint(v) => write_bytes::append_u64(buf, *v),
        Value::F32(v) => write_bytes::append_f32(buf, *v),
        Value::F64(v) => write_bytes::append_f64(buf, *v),
        Value::Str(s) => write_bytes::append_str(buf, s),
        Value::Bin(d) => write_bytes::append_bin(buf, d),
        Value::Array(els) => {
            assert!(els.len() <= u32::MAX as usize, "array too long for array32");
            write_bytes::append_array_header(buf, els.len() as u32);
            for el in els {
                append_value(buf, el)?;
            }
        }
        Value::Map(pairs) => {
            assert!(pairs.len() <= u32::MAX as usize, "map too long for map32");
            write_bytes::append_map_header(buf, pairs.len() as u32);
            for (key, val) in pairs {
                write_bytes::append_str(buf, key);
                append_value(buf, val)?;
            }
        }
        Value::Ext(raw) => write_bytes::append_ext(buf, raw)?,
        Value::Complex32(v) => write_bytes::append_complex32(buf, *v),
        Value::Complex64(v) => write_bytes::append_complex64(buf, *v),
        Value::Time(t) => write_bytes::append_time(buf, *t)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_uint_equality_is_numeric() {
        assert_eq!(Value::Int(5), Value::Uint(5));
        assert_ne!(Value::Int(-5), Value::Uint(5));
        assert_ne!(Value::Int(5), Value::Uint(6));
    }

    #[test]
    fn encoded_size_respects_bound() {
        let v = Value::Map(vec![
            ("a".to_owned(), Value::Int(1)),
            ("blob".to_owned(), Value::Bin(vec![0; 300])),
            ("list".to_owned(), Value::Array(vec![Value::Nil, Value::Bool(true)])),
        ]);
        let mut buf = Vec::new();
        append_value(&mut buf, &v).unwrap();
        assert!(buf.len() <= v.msg_size());
    }

    #[test]
    fn value_round_trips() {
        let v = Value::Map(vec![
            ("f".to_owned(), Value::F64(3.5)),
            ("n".to_owned(), Value::Int(-49082)),
            ("u".to_owned(), Value::Uint(34908)),
            ("s".to_owned(), Value::Str("hello!".to_owned())),
            ("b".to_owned(), Value::Bin(b"blah.".to_vec())),
            ("x".to_owned(), Value::Ext(RawExtension::new(55, b"raw data!!!".to_vec()))),
        ]);
        let mut buf = Vec::new();
        append_value(&mut buf, &v).unwrap();
        let (out, rest) = read_value(&buf).unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, v);
    }
}
