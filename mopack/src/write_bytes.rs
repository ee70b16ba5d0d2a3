//! Slice-level encoders: append one MessagePack object to a growable
//! buffer, always choosing the tightest prefix that fits the value.

use std::time::SystemTime;

use num_complex::{Complex32, Complex64};

use crate::error::Error;
use crate::ext::{self, Extension, COMPLEX32_EXTENSION, COMPLEX64_EXTENSION, TIME_EXTENSION};
use crate::kind;

/// Append `nil`.
pub fn append_nil(buf: &mut Vec<u8>) {
    buf.push(kind::NIL);
}

/// Append a boolean.
pub fn append_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { kind::TRUE } else { kind::FALSE });
}

/// Append a signed integer using the tightest encoding: positive fixint,
/// negative fixint, or `int8`..`int64`.
pub fn append_i64(buf: &mut Vec<u8>, v: i64) {
    match v {
        0..=127 => buf.push(v as u8),
        -32..=-1 => buf.push(v as u8),
        -128..=-33 => {
            buf.push(kind::INT8);
            buf.push(v as i8 as u8);
        }
        _ if v >= i64::from(i16::MIN) && v <= i64::from(i16::MAX) => {
            buf.push(kind::INT16);
            buf.extend_from_slice(&(v as i16).to_be_bytes());
        }
        _ if v >= i64::from(i32::MIN) && v <= i64::from(i32::MAX) => {
            buf.push(kind::INT32);
            buf.extend_from_slice(&(v as i32).to_be_bytes());
        }
        _ => {
            buf.push(kind::INT64);
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
}

/// Append a signed 8-bit integer.
pub fn append_i8(buf: &mut Vec<u8>, v: i8) {
    append_i64(buf, i64::from(v));
}

/// Append a signed 16-bit integer.
pub fn append_i16(buf: &mut Vec<u8>, v: i16) {
    append_i64(buf, i64::from(v));
}

/// Append a signed 32-bit integer.
pub fn append_i32(buf: &mut Vec<u8>, v: i32) {
    append_i64(buf, i64::from(v));
}

/// Append an unsigned integer using the tightest encoding: positive fixint
/// or `uint8`..`uint64`.
pub fn append_u64(buf: &mut Vec<u8>, v: u64) {
    match v {
        0..=127 => buf.push(v as u8),
        128..=0xff => {
            buf.push(kind::UINT8);
            buf.push(v as u8);
        }
        0x100..=0xffff => {
            buf.push(kind::UINT16);
            buf.extend_from_slice(&(v as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(kind::UINT32);
            buf.extend_from_slice(&(v as u32).to_be_bytes());
        }
        _ => {
            buf.push(kind::UINT64);
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
}

/// Append an unsigned 8-bit integer.
pub fn append_u8(buf: &mut Vec<u8>, v: u8) {
    append_u64(buf, u64::from(v));
}

/// Append an unsigned 16-bit integer.
pub fn append_u16(buf: &mut Vec<u8>, v: u16) {
    append_u64(buf, u64::from(v));
}

/// Append an unsigned 32-bit integer.
pub fn append_u32(buf: &mut Vec<u8>, v: u32) {
    append_u64(buf, u64::from(v));
}

/// Append an IEEE-754 single-precision float.
pub fn append_f32(buf: &mut Vec<u8>, v: f32) {
    buf.push(kind::FLOAT32);
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Append an IEEE-754 double-precision float.
pub fn append_f64(buf: &mut Vec<u8>, v: f64) {
    buf.push(kind::FLOAT64);
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Append a map header for `len` key/value pairs.
pub fn append_map_header(buf: &mut Vec<u8>, len: u32) {
    match len {
        0..=15 => buf.push(kind::FIXMAP_MIN | len as u8),
        16..=0xffff => {
            buf.push(kind::MAP16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            buf.push(kind::MAP32);
            buf.extend_from_slice(&len.to_be_bytes());
        }
    }
}

/// Append an array header for `len` elements.
pub fn append_array_header(buf: &mut Vec<u8>, len: u32) {
    match len {
        0..=15 => buf.push(kind::FIXARRAY_MIN | len as u8),
        16..=0xffff => {
            buf.push(kind::ARRAY16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            buf.push(kind::ARRAY32);
            buf.extend_from_slice(&len.to_be_bytes());
        }
    }
}

/// Append a UTF-8 string.
///
/// # Panics
///
/// Panics if the string is longer than `u32::MAX` bytes, which the wire
/// format cannot carry.
pub fn append_str(buf: &mut Vec<u8>, v: &str) {
    let len = v.len();
    assert!(len <= u32::MAX as usize, "string too long for str32");
    match len {
        0..=31 => buf.push(kind::FIXSTR_MIN | len as u8),
        32..=0xff => {
            buf.push(kind::STR8);
            buf.push(len as u8);
        }
        0x100..=0xffff => {
            buf.push(kind::STR16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            buf.push(kind::STR32);
            buf.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }
    buf.extend_from_slice(v.as_bytes());
}

/// Append raw bytes as `bin`.
///
/// # Panics
///
/// Panics if the slice is longer than `u32::MAX` bytes.
pub fn append_bin(buf: &mut Vec<u8>, v: &[u8]) {
    let len = v.len();
    assert!(len <= u32::MAX as usize, "byte slice too long for bin32");
    match len {
        0..=0xff => {
            buf.push(kind::BIN8);
            buf.push(len as u8);
        }
        0x100..=0xffff => {
            buf.push(kind::BIN16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            buf.push(kind::BIN32);
            buf.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }
    buf.extend_from_slice(v);
}

/// Append an extension with the shortest header for its payload length:
/// `fixext*` for 1/2/4/8/16, otherwise `ext8`/`ext16`/`ext32`. A
/// zero-length payload uses `ext8` with a zero length byte, since the
/// format has no `fixext0`.
///
/// # Panics
///
/// Panics if the payload is longer than `u32::MAX` bytes.
pub fn append_ext<E: Extension + ?Sized>(buf: &mut Vec<u8>, e: &E) -> Result<(), Error> {
    let len = e.len();
    assert!(len <= u32::MAX as usize, "extension payload too long for ext32");
    let typ = e.ext_type() as u8;
    match len {
        0 => {
            buf.push(kind::EXT8);
            buf.push(0);
            buf.push(typ);
        }
        1 => {
            buf.push(kind::FIXEXT1);
            buf.push(typ);
        }
        2 => {
            buf.push(kind::FIXEXT2);
            buf.push(typ);
        }
        4 => {
            buf.push(kind::FIXEXT4);
            buf.push(typ);
        }
        8 => {
            buf.push(kind::FIXEXT8);
            buf.push(typ);
        }
        16 => {
            buf.push(kind::FIXEXT16);
            buf.push(typ);
        }
        _ if len <= 0xff => {
            buf.push(kind::EXT8);
            buf.push(len as u8);
            buf.push(typ);
        }
        _ if len <= 0xffff => {
            buf.push(kind::EXT16);
            buf.extend_from_slice(&(len as u16).to_be_bytes());
            buf.push(typ);
        }
        _ => {
            buf.push(kind::EXT32);
            buf.extend_from_slice(&(len as u32).to_be_bytes());
            buf.push(typ);
        }
    }
    let start = buf.len();
    buf.resize(start + len, 0);
    e.marshal_binary_to(&mut buf[start..])
}

/// Append a timestamp as the reserved fixext8 payload.
pub fn append_time(buf: &mut Vec<u8>, t: SystemTime) -> Result<(), Error> {
    let payload = ext::time_payload(t)?;
    buf.push(kind::FIXEXT8);
    buf.push(TIME_EXTENSION as u8);
    buf.extend_from_slice(&payload);
    Ok(())
}

/// Append a complex number of `f32` components as the reserved fixext8
/// payload.
pub fn append_complex32(buf: &mut Vec<u8>, v: Complex32) {
    buf.push(kind::FIXEXT8);
    buf.push(COMPLEX32_EXTENSION as u8);
    buf.extend_from_slice(&ext::complex32_payload(v));
}

/// Append a complex number of `f64` components as the reserved fixext16
/// payload.
pub fn append_complex64(buf: &mut Vec<u8>, v: Complex64) {
    buf.push(kind::FIXEXT16);
    buf.push(COMPLEX64_EXTENSION as u8);
    buf.extend_from_slice(&ext::complex64_payload(v));
}
