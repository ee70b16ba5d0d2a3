//! Zero-copy slice decoders.
//!
//! Every reader takes an input slice and returns the decoded value together
//! with the remaining input. String and byte results borrow from the input
//! slice, so their lifetime is coupled to the caller's buffer; nothing is
//! copied. On error the input has not been consumed: the caller still holds
//! the slice positioned at the offending object.

use std::time::SystemTime;

use num_complex::{Complex32, Complex64};

use crate::error::Error;
use crate::ext::{self, Extension, COMPLEX32_EXTENSION, COMPLEX64_EXTENSION, TIME_EXTENSION};
use crate::kind::*;

fn lead(b: &[u8]) -> Result<u8, Error> {
    b.first().copied().ok_or(Error::ShortBytes)
}

fn take(b: &[u8], n: usize) -> Result<(&[u8], &[u8]), Error> {
    if b.len() < n {
        return Err(Error::ShortBytes);
    }
    Ok(b.split_at(n))
}

/// Fixed-width payload following a one-byte prefix.
fn payload<const N: usize>(b: &[u8]) -> Result<([u8; N], &[u8]), Error> {
    if b.len() < 1 + N {
        return Err(Error::ShortBytes);
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&b[1..1 + N]);
    Ok((arr, &b[1 + N..]))
}

pub(crate) fn mismatch(wanted: Kind, lead: u8) -> Error {
    match Kind::of(lead) {
        Kind::Invalid => Error::InvalidPrefix(lead),
        got => Error::TypeMismatch { wanted, got },
    }
}

/// Classify the next object without consuming anything.
///
/// `0xc1` classifies as [`Kind::Invalid`]; every reader rejects it with
/// [`Error::InvalidPrefix`].
pub fn next_kind(b: &[u8]) -> Result<Kind, Error> {
    Ok(Kind::of(lead(b)?))
}

/// Read `nil`.
pub fn read_nil(b: &[u8]) -> Result<&[u8], Error> {
    let l = lead(b)?;
    if l != NIL {
        return Err(mismatch(Kind::Nil, l));
    }
    Ok(&b[1..])
}

/// Read a boolean.
pub fn read_bool(b: &[u8]) -> Result<(bool, &[u8]), Error> {
    match lead(b)? {
        FALSE => Ok((false, &b[1..])),
        TRUE => Ok((true, &b[1..])),
        l => Err(mismatch(Kind::Bool, l)),
    }
}

pub(crate) enum IntAny {
    Signed(i64),
    Unsigned(u64),
}

/// Decode any valid integer encoding, signed or unsigned, at any width.
/// `wanted` only shapes the mismatch error.
pub(crate) fn read_int_any(b: &[u8], wanted: Kind) -> Result<(IntAny, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        0x00..=POS_FIXINT_MAX => Ok((IntAny::Signed(i64::from(l)), &b[1..])),
        NEG_FIXINT_MIN..=0xff => Ok((IntAny::Signed(i64::from(l as i8)), &b[1..])),
        INT8 => {
            let (p, rest) = payload::<1>(b)?;
            Ok((IntAny::Signed(i64::from(p[0] as i8)), rest))
        }
        INT16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((IntAny::Signed(i64::from(i16::from_be_bytes(p))), rest))
        }
        INT32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((IntAny::Signed(i64::from(i32::from_be_bytes(p))), rest))
        }
        INT64 => {
            let (p, rest) = payload::<8>(b)?;
            Ok((IntAny::Signed(i64::from_be_bytes(p)), rest))
        }
        UINT8 => {
            let (p, rest) = payload::<1>(b)?;
            Ok((IntAny::Unsigned(u64::from(p[0])), rest))
        }
        UINT16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((IntAny::Unsigned(u64::from(u16::from_be_bytes(p))), rest))
        }
        UINT32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((IntAny::Unsigned(u64::from(u32::from_be_bytes(p))), rest))
        }
        UINT64 => {
            let (p, rest) = payload::<8>(b)?;
            Ok((IntAny::Unsigned(u64::from_be_bytes(p)), rest))
        }
        _ => Err(mismatch(wanted, l)),
    }
}

/// Total encoded width (prefix included) of an integer object, or `None`
/// for a non-integer prefix.
pub(crate) fn int_total_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=POS_FIXINT_MAX | NEG_FIXINT_MIN..=0xff => Some(1),
        INT8 | UINT8 => Some(2),
        INT16 | UINT16 => Some(3),
        INT32 | UINT32 => Some(5),
        INT64 | UINT64 => Some(9),
        _ => None,
    }
}

/// Read a signed 64-bit integer. Accepts any valid integer encoding whose
/// value fits, regardless of wire width or signedness.
pub fn read_i64(b: &[u8]) -> Result<(i64, &[u8]), Error> {
    match read_int_any(b, Kind::Int)? {
        (IntAny::Signed(v), rest) => Ok((v, rest)),
        (IntAny::Unsigned(u), rest) => match i64::try_from(u) {
            Ok(v) => Ok((v, rest)),
            Err(_) => Err(Error::IntOverflow { value: u as i64, bits: 64 }),
        },
    }
}

/// Read a signed 32-bit integer, overflow-checked.
pub fn read_i32(b: &[u8]) -> Result<(i32, &[u8]), Error> {
    let (v, rest) = read_i64(b)?;
    match i32::try_from(v) {
        Ok(v) => Ok((v, rest)),
        Err(_) => Err(Error::IntOverflow { value: v, bits: 32 }),
    }
}

/// Read a signed 16-bit integer, overflow-checked.
pub fn read_i16(b: &[u8]) -> Result<(i16, &[u8]), Error> {
    let (v, rest) = read_i64(b)?;
    match i16::try_from(v) {
        Ok(v) => Ok((v, rest)),
        Err(_) => Err(Error::IntOverflow { value: v, bits: 16 }),
    }
}

/// Read a signed 8-bit integer, overflow-checked.
pub fn read_i8(b: &[u8]) -> Result<(i8, &[u8]), Error> {
    let (v, rest) = read_i64(b)?;
    match i8::try_from(v) {
        Ok(v) => Ok((v, rest)),
        Err(_) => Err(Error::IntOverflow { value: v, bits: 8 }),
    }
}

/// Read an unsigned 64-bit integer. Accepts any valid integer encoding of a
/// nonnegative value.
pub fn read_u64(b: &[u8]) -> Result<(u64, &[u8]), Error> {
    match read_int_any(b, Kind::Uint)? {
        (IntAny::Unsigned(u), rest) => Ok((u, rest)),
        (IntAny::Signed(v), rest) => match u64::try_from(v) {
            Ok(u) => Ok((u, rest)),
            Err(_) => Err(Error::UintOverflow { value: v as u64, bits: 64 }),
        },
    }
}

/// Read an unsigned 32-bit integer, overflow-checked.
pub fn read_u32(b: &[u8]) -> Result<(u32, &[u8]), Error> {
    let (u, rest) = read_u64(b)?;
    match u32::try_from(u) {
        Ok(u) => Ok((u, rest)),
        Err(_) => Err(Error::UintOverflow { value: u, bits: 32 }),
    }
}

/// Read an unsigned 16-bit integer, overflow-checked.
pub fn read_u16(b: &[u8]) -> Result<(u16, &[u8]), Error> {
    let (u, rest) = read_u64(b)?;
    match u16::try_from(u) {
        Ok(u) => Ok((u, rest)),
        Err(_) => Err(Error::UintOverflow { value: u, bits: 16 }),
    }
}

/// Read an unsigned 8-bit integer, overflow-checked.
pub fn read_u8(b: &[u8]) -> Result<(u8, &[u8]), Error> {
    let (u, rest) = read_u64(b)?;
    match u8::try_from(u) {
        Ok(u) => Ok((u, rest)),
        Err(_) => Err(Error::UintOverflow { value: u, bits: 8 }),
    }
}

/// Read a single-precision float. Only the `float32` prefix is accepted.
pub fn read_f32(b: &[u8]) -> Result<(f32, &[u8]), Error> {
    let l = lead(b)?;
    if l != FLOAT32 {
        return Err(mismatch(Kind::Float32, l));
    }
    let (p, rest) = payload::<4>(b)?;
    Ok((f32::from_be_bytes(p), rest))
}

/// Read a double-precision float. Only the `float64` prefix is accepted.
pub fn read_f64(b: &[u8]) -> Result<(f64, &[u8]), Error> {
    let l = lead(b)?;
    if l != FLOAT64 {
        return Err(mismatch(Kind::Float64, l));
    }
    let (p, rest) = payload::<8>(b)?;
    Ok((f64::from_be_bytes(p), rest))
}

pub(crate) fn str_header(b: &[u8]) -> Result<(usize, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        FIXSTR_MIN..=FIXSTR_MAX => Ok(((l & 0x1f) as usize, &b[1..])),
        STR8 => {
            let (p, rest) = payload::<1>(b)?;
            Ok((p[0] as usize, rest))
        }
        STR16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((u16::from_be_bytes(p) as usize, rest))
        }
        STR32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((u32::from_be_bytes(p) as usize, rest))
        }
        _ => Err(mismatch(Kind::Str, l)),
    }
}

/// Read a string, borrowing the payload from the input.
pub fn read_str(b: &[u8]) -> Result<(&str, &[u8]), Error> {
    let (len, rest) = str_header(b)?;
    let (data, rest) = take(rest, len)?;
    let s = core::str::from_utf8(data).map_err(|_| Error::InvalidUtf8)?;
    Ok((s, rest))
}

pub(crate) fn bin_header(b: &[u8]) -> Result<(usize, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        BIN8 => {
            let (p, rest) = payload::<1>(b)?;
            Ok((p[0] as usize, rest))
        }
        BIN16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((u16::from_be_bytes(p) as usize, rest))
        }
        BIN32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((u32::from_be_bytes(p) as usize, rest))
        }
        _ => Err(mismatch(Kind::Bin, l)),
    }
}

/// Read a `bin` payload, borrowing it from the input.
pub fn read_bin(b: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let (len, rest) = bin_header(b)?;
    take(rest, len)
}

/// Read an array header, returning the element count.
pub fn read_array_header(b: &[u8]) -> Result<(u32, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        FIXARRAY_MIN..=FIXARRAY_MAX => Ok((u32::from(l & 0x0f), &b[1..])),
        ARRAY16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((u32::from(u16::from_be_bytes(p)), rest))
        }
        ARRAY32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((u32::from_be_bytes(p), rest))
        }
        _ => Err(mismatch(Kind::Array, l)),
    }
}

/// Read an array header that must announce exactly `wanted` elements; the
/// fixed-size array decode path of generated code.
pub fn read_sized_array_header(b: &[u8], wanted: u32) -> Result<&[u8], Error> {
    let (got, rest) = read_array_header(b)?;
    if got != wanted {
        return Err(Error::ArraySize { wanted, got });
    }
    Ok(rest)
}

/// Read a map header, returning the pair count.
pub fn read_map_header(b: &[u8]) -> Result<(u32, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        FIXMAP_MIN..=FIXMAP_MAX => Ok((u32::from(l & 0x0f), &b[1..])),
        MAP16 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((u32::from(u16::from_be_bytes(p)), rest))
        }
        MAP32 => {
            let (p, rest) = payload::<4>(b)?;
            Ok((u32::from_be_bytes(p), rest))
        }
        _ => Err(mismatch(Kind::Map, l)),
    }
}

/// Parse an extension header: payload size, wire type id, input past the
/// header.
pub(crate) fn ext_header(b: &[u8]) -> Result<(usize, i8, &[u8]), Error> {
    let l = lead(b)?;
    match l {
        FIXEXT1 | FIXEXT2 | FIXEXT4 | FIXEXT8 | FIXEXT16 => {
            let (p, rest) = payload::<1>(b)?;
            let sz = match l {
                FIXEXT1 => 1,
                FIXEXT2 => 2,
                FIXEXT4 => 4,
                FIXEXT8 => 8,
                _ => 16,
            };
            Ok((sz, p[0] as i8, rest))
        }
        EXT8 => {
            let (p, rest) = payload::<2>(b)?;
            Ok((p[0] as usize, p[1] as i8, rest))
        }
        EXT16 => {
            let (p, rest) = payload::<3>(b)?;
            Ok((u16::from_be_bytes([p[0], p[1]]) as usize, p[2] as i8, rest))
        }
        EXT32 => {
            let (p, rest) = payload::<5>(b)?;
            Ok((
                u32::from_be_bytes([p[0], p[1], p[2], p[3]]) as usize,
                p[4] as i8,
                rest,
            ))
        }
        _ => Err(mismatch(Kind::Ext, l)),
    }
}

/// Peek at the type id of the next extension object without consuming it.
pub fn peek_ext_type(b: &[u8]) -> Result<i8, Error> {
    ext_header(b).map(|(_, typ, _)| typ)
}

/// Read the next object into `e` as an extension.
///
/// The wire type id is checked against `e.ext_type()` before any payload is
/// touched; a mismatch is [`Error::ExtensionType`] and the input is not
/// consumed. On match, exactly the payload slice is handed to
/// [`Extension::unmarshal_binary`], including a zero-length `ext8`, which
/// still invokes the unmarshal with an empty slice.
pub fn read_ext<'a, E: Extension + ?Sized>(b: &'a [u8], e: &mut E) -> Result<&'a [u8], Error> {
    let (sz, typ, rest) = ext_header(b)?;
    if typ != e.ext_type() {
        return Err(Error::ExtensionType { wanted: e.ext_type(), got: typ });
    }
    let (data, rest) = take(rest, sz)?;
    e.unmarshal_binary(data)?;
    Ok(rest)
}

/// Read a timestamp from the reserved fixext8 payload.
pub fn read_time(b: &[u8]) -> Result<(SystemTime, &[u8]), Error> {
    let l = lead(b)?;
    if l != FIXEXT8 {
        return Err(mismatch(Kind::Ext, l));
    }
    let (p, rest) = payload::<9>(b)?;
    let typ = p[0] as i8;
    if typ != TIME_EXTENSION {
        return Err(Error::ExtensionType { wanted: TIME_EXTENSION, got: typ });
    }
    Ok((ext::time_from_payload(&p[1..]), rest))
}

/// Read a complex number of `f32` components from the reserved fixext8
/// payload.
pub fn read_complex32(b: &[u8]) -> Result<(Complex32, &[u8]), Error> {
    let l = lead(b)?;
    if l != FIXEXT8 {
        return Err(mismatch(Kind::Ext, l));
    }
    let (p, rest) = payload::<9>(b)?;
    let typ = p[0] as i8;
    if typ != COMPLEX32_EXTENSION {
        return Err(Error::ExtensionType { wanted: COMPLEX32_EXTENSION, got: typ });
    }
    Ok((ext::complex32_from_payload(&p[1..]), rest))
}

/// Read a complex number of `f64` components from the reserved fixext16
/// payload.
pub fn read_complex64(b: &[u8]) -> Result<(Complex64, &[u8]), Error> {
    let l = lead(b)?;
    if l != FIXEXT16 {
        return Err(mismatch(Kind::Ext, l));
    }
    let (p, rest) = payload::<17>(b)?;
    let typ = p[0] as i8;
    if typ != COMPLEX64_EXTENSION {
        return Err(Error::ExtensionType { wanted: COMPLEX64_EXTENSION, got: typ });
    }
    Ok((ext::complex64_from_payload(&p[1..]), rest))
}

fn advance(b: &[u8], n: usize) -> Result<&[u8], Error> {
    if b.len() < n {
        return Err(Error::ShortBytes);
    }
    Ok(&b[n..])
}

/// Advance past the next well-formed object, returning the remaining input.
///
/// Iterative: a count of outstanding objects stands in for the work stack.
/// Each iteration retires one prefix, and arrays and maps add their element
/// count (pairs count twice). Time is linear in the encoded size.
pub fn skip(mut b: &[u8]) -> Result<&[u8], Error> {
    let mut outstanding: u64 = 1;
    while outstanding > 0 {
        outstanding -= 1;
        let l = lead(b)?;
        match l {
            0x00..=POS_FIXINT_MAX | NEG_FIXINT_MIN..=0xff | NIL | FALSE | TRUE => {
                b = &b[1..];
            }
            INT8 | UINT8 => b = advance(b, 2)?,
            INT16 | UINT16 => b = advance(b, 3)?,
            INT32 | UINT32 | FLOAT32 => b = advance(b, 5)?,
            INT64 | UINT64 | FLOAT64 => b = advance(b, 9)?,
            FIXSTR_MIN..=FIXSTR_MAX => b = advance(b, 1 + (l & 0x1f) as usize)?,
            STR8 | BIN8 => {
                let (p, _) = payload::<1>(b)?;
                b = advance(b, 2 + p[0] as usize)?;
            }
            STR16 | BIN16 => {
                let (p, _) = payload::<2>(b)?;
                b = advance(b, 3 + u16::from_be_bytes(p) as usize)?;
            }
            STR32 | BIN32 => {
                let (p, _) = payload::<4>(b)?;
                b = advance(b, 5 + u32::from_be_bytes(p) as usize)?;
            }
            FIXEXT1 => b = advance(b, 3)?,
            FIXEXT2 => b = advance(b, 4)?,
            FIXEXT4 => b = advance(b, 6)?,
            FIXEXT8 => b = advance(b, 10)?,
            FIXEXT16 => b = advance(b, 18)?,
            EXT8 => {
                let (p, _) = payload::<1>(b)?;
                b = advance(b, 3 + p[0] as usize)?;
            }
            EXT16 => {
                let (p, _) = payload::<2>(b)?;
                b = advance(b, 4 + u16::from_be_bytes(p) as usize)?;
            }
            EXT32 => {
                let (p, _) = payload::<4>(b)?;
                b = advance(b, 6 + u32::from_be_bytes(p) as usize)?;
            }
            FIXARRAY_MIN..=FIXARRAY_MAX => {
                b = &b[1..];
                outstanding = outstanding.saturating_add(u64::from(l & 0x0f));
            }
            ARRAY16 => {
                let (p, rest) = payload::<2>(b)?;
                b = rest;
                outstanding = outstanding.saturating_add(u64::from(u16::from_be_bytes(p)));
            }
            ARRAY32 => {
                let (p, rest) = payload::<4>(b)?;
                b = rest;
                outstanding = outstanding.saturating_add(u64::from(u32::from_be_bytes(p)));
            }
            FIXMAP_MIN..=FIXMAP_MAX => {
                b = &b[1..];
                outstanding = outstanding.saturating_add(2 * u64::from(l & 0x0f));
            }
            MAP16 => {
                let (p, rest) = payload::<2>(b)?;
                b = rest;
                outstanding = outstanding.saturating_add(2 * u64::from(u16::from_be_bytes(p)));
            }
            MAP32 => {
                let (p, rest) = payload::<4>(b)?;
                b = rest;
                outstanding = outstanding.saturating_add(2 * u64::from(u32::from_be_bytes(p)));
            }
            NEVER_USED => return Err(Error::InvalidPrefix(l)),
        }
    }
    Ok(b)
}
