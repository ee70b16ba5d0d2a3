//! The buffered streaming decoder.

use std::io::{self, Read};
use std::time::SystemTime;

use num_complex::{Complex32, Complex64};

use crate::error::Error;
use crate::ext::{
    Extension, RawExtension, COMPLEX32_EXTENSION, COMPLEX64_EXTENSION, TIME_EXTENSION,
};
use crate::kind::*;
use crate::read_bytes;
use crate::value::Value;

const DEFAULT_CAPACITY: usize = 4096;

/// A MessagePack decoder over any [`std::io::Read`] source.
///
/// The reader maintains a sliding window over the source. [`Reader::peek`]
/// exposes the next `k` bytes without consuming them; the returned slice is
/// stable until the next consuming call or a larger peek. Every typed read
/// is peek–decode–advance, so a failed read leaves the cursor at the start
/// of the offending object and resumable errors mean what they say.
pub struct Reader<R: Read> {
    src: R,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
}

impl<R: Read> Reader<R> {
    /// A reader with the default buffer capacity.
    pub fn new(src: R) -> Self {
        Reader { src, buf: Vec::new(), pos: 0, end: 0 }
    }

    /// Discard the buffer and return the source. Unread buffered bytes are
    /// lost.
    pub fn into_inner(self) -> R {
        self.src
    }

    fn fill_to(&mut self, n: usize) -> Result<(), Error> {
        if self.end - self.pos >= n {
            return Ok(());
        }
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
        if self.buf.len() < n {
            self.buf.resize(n.max(DEFAULT_CAPACITY), 0);
        }
        while self.end < n {
            match self.src.read(&mut self.buf[self.end..]) {
                Ok(0) => return Err(Error::ShortBytes),
                Ok(got) => self.end += got,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// The next `n` bytes of the stream, without consuming them.
    ///
    /// Fails with [`Error::ShortBytes`] if the source ends before `n` bytes
    /// are available; a peek of exactly the remaining length succeeds.
    pub fn peek(&mut self, n: usize) -> Result<&[u8], Error> {
        self.fill_to(n)?;
        Ok(&self.buf[self.pos..self.pos + n])
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(self.end - self.pos >= n);
        self.pos += n;
    }

    /// Drop `n` bytes, reading past the buffer if necessary.
    fn discard(&mut self, n: usize) -> Result<(), Error> {
        let buffered = self.end - self.pos;
        if n <= buffered {
            self.pos += n;
            return Ok(());
        }
        let mut left = n - buffered;
        self.pos = 0;
        self.end = 0;
        if self.buf.is_empty() {
            self.buf.resize(DEFAULT_CAPACITY, 0);
        }
        while left > 0 {
            let want = left.min(self.buf.len());
            match self.src.read(&mut self.buf[..want]) {
                Ok(0) => return Err(Error::ShortBytes),
                Ok(got) => left -= got,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Advance the stream by `n` bytes, invalidating any peeked slice.
    ///
    /// Bytes beyond the buffer are read from the source and dropped.
    pub fn skip_bytes(&mut self, n: usize) -> Result<(), Error> {
        self.discard(n)
    }

    /// Classify the next object without consuming anything.
    pub fn next_kind(&mut self) -> Result<Kind, Error> {
        Ok(Kind::of(self.peek(1)?[0]))
    }

    /// Read `nil`.
    pub fn read_nil(&mut self) -> Result<(), Error> {
        let lead = self.peek(1)?[0];
        if lead != NIL {
            return Err(read_bytes::mismatch(Kind::Nil, lead));
        }
        self.consume(1);
        Ok(())
    }

    /// Read a boolean.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.peek(1)?[0] {
            FALSE => {
                self.consume(1);
                Ok(false)
            }
            TRUE => {
                self.consume(1);
                Ok(true)
            }
            lead => Err(read_bytes::mismatch(Kind::Bool, lead)),
        }
    }

    fn int_window(&mut self, wanted: Kind) -> Result<usize, Error> {
        let lead = self.peek(1)?[0];
        let width = read_bytes::int_total_width(lead)
            .ok_or_else(|| read_bytes::mismatch(wanted, lead))?;
        self.fill_to(width)?;
        Ok(width)
    }

    /// Read a signed 64-bit integer; any valid integer encoding is accepted.
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        let width = self.int_window(Kind::Int)?;
        let (v, _) = read_bytes::read_i64(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read a signed 32-bit integer, overflow-checked.
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        let width = self.int_window(Kind::Int)?;
        let (v, _) = read_bytes::read_i32(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read a signed 16-bit integer, overflow-checked.
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        let width = self.int_window(Kind::Int)?;
        let (v, _) = read_bytes::read_i16(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read a signed 8-bit integer, overflow-checked.
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        let width = self.int_window(Kind::Int)?;
        let (v, _) = read_bytes::read_i8(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read an unsigned 64-bit integer; any valid integer encoding of a
    /// nonnegative value is accepted.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let width = self.int_window(Kind::Uint)?;
        let (v, _) = read_bytes::read_u64(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read an unsigned 32-bit integer, overflow-checked.
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let width = self.int_window(Kind::Uint)?;
        let (v, _) = read_bytes::read_u32(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read an unsigned 16-bit integer, overflow-checked.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let width = self.int_window(Kind::Uint)?;
        let (v, _) = read_bytes::read_u16(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read an unsigned 8-bit integer, overflow-checked.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let width = self.int_window(Kind::Uint)?;
        let (v, _) = read_bytes::read_u8(self.peek(width)?)?;
        self.consume(width);
        Ok(v)
    }

    /// Read a single-precision float.
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let lead = self.peek(1)?[0];
        if lead != FLOAT32 {
            return Err(read_bytes::mismatch(Kind::Float32, lead));
        }
        let (v, _) = read_bytes::read_f32(self.peek(5)?)?;
        self.consume(5);
        Ok(v)
    }

    /// Read a double-precision float.
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        let lead = self.peek(1)?[0];
        if lead != FLOAT64 {
            return Err(read_bytes::mismatch(Kind::Float64, lead));
        }
        let (v, _) = read_bytes::read_f64(self.peek(9)?)?;
        self.consume(9);
        Ok(v)
    }

    fn str_header_width(lead: u8) -> Option<usize> {
        match lead {
            FIXSTR_MIN..=FIXSTR_MAX => Some(1),
            STR8 => Some(2),
            STR16 => Some(3),
            STR32 => Some(5),
            _ => None,
        }
    }

    /// Read a string into owned storage.
    pub fn read_str(&mut self) -> Result<String, Error> {
        let lead = self.peek(1)?[0];
        let hw = Self::str_header_width(lead)
            .ok_or_else(|| read_bytes::mismatch(Kind::Str, lead))?;
        let (len, _) = read_bytes::str_header(self.peek(hw)?)?;
        let total = hw + len;
        let window = self.peek(total)?;
        let s = core::str::from_utf8(&window[hw..])
            .map_err(|_| Error::InvalidUtf8)?
            .to_owned();
        self.consume(total);
        Ok(s)
    }

    fn bin_header_width(lead: u8) -> Option<usize> {
        match lead {
            BIN8 => Some(2),
            BIN16 => Some(3),
            BIN32 => Some(5),
            _ => None,
        }
    }

    /// Read a `bin` payload into owned storage.
    pub fn read_bin(&mut self) -> Result<Vec<u8>, Error> {
        let lead = self.peek(1)?[0];
        let hw = Self::bin_header_width(lead)
            .ok_or_else(|| read_bytes::mismatch(Kind::Bin, lead))?;
        let (len, _) = read_bytes::bin_header(self.peek(hw)?)?;
        let total = hw + len;
        let window = self.peek(total)?;
        let data = window[hw..].to_vec();
        self.consume(total);
        Ok(data)
    }

    fn collection_header_width(lead: u8) -> usize {
        match lead {
            ARRAY16 | MAP16 => 3,
            ARRAY32 | MAP32 => 5,
            _ => 1,
        }
    }

    /// Read an array header, returning the element count.
    pub fn read_array_header(&mut self) -> Result<u32, Error> {
        let lead = self.peek(1)?[0];
        if !matches!(lead, FIXARRAY_MIN..=FIXARRAY_MAX | ARRAY16 | ARRAY32) {
            return Err(read_bytes::mismatch(Kind::Array, lead));
        }
        let hw = Self::collection_header_width(lead);
        let (len, _) = read_bytes::read_array_header(self.peek(hw)?)?;
        self.consume(hw);
        Ok(len)
    }

    /// Read an array header that must announce exactly `wanted` elements.
    pub fn read_sized_array_header(&mut self, wanted: u32) -> Result<(), Error> {
        let lead = self.peek(1)?[0];
        if !matches!(lead, FIXARRAY_MIN..=FIXARRAY_MAX | ARRAY16 | ARRAY32) {
            return Err(read_bytes::mismatch(Kind::Array, lead));
        }
        let hw = Self::collection_header_width(lead);
        let (got, _) = read_bytes::read_array_header(self.peek(hw)?)?;
        if got != wanted {
            return Err(Error::ArraySize { wanted, got });
        }
        self.consume(hw);
        Ok(())
    }

    /// Read a map header, returning the pair count.
    pub fn read_map_header(&mut self) -> Result<u32, Error> {
        let lead = self.peek(1)?[0];
        if !matches!(lead, FIXMAP_MIN..=FIXMAP_MAX | MAP16 | MAP32) {
            return Err(read_bytes::mismatch(Kind::Map, lead));
        }
        let hw = Self::collection_header_width(lead);
        let (len, _) = read_bytes::read_map_header(self.peek(hw)?)?;
        self.consume(hw);
        Ok(len)
    }

    fn ext_header_width(lead: u8) -> Option<usize> {
        match lead {
            FIXEXT1 | FIXEXT2 | FIXEXT4 | FIXEXT8 | FIXEXT16 => Some(2),
            EXT8 => Some(3),
            EXT16 => Some(4),
            EXT32 => Some(6),
            _ => None,
        }
    }

    /// Peek at the type id of the next extension object without consuming
    /// it.
    pub fn peek_ext_type(&mut self) -> Result<i8, Error> {
        let lead = self.peek(1)?[0];
        let hw = Self::ext_header_width(lead)
            .ok_or_else(|| read_bytes::mismatch(Kind::Ext, lead))?;
        let (_, typ, _) = read_bytes::ext_header(self.peek(hw)?)?;
        Ok(typ)
    }

    /// Read the next object into `e` as an extension. The wire type id is
    /// checked before the payload is required; a mismatch leaves the cursor
    /// in place. A zero-length extension still invokes
    /// [`Extension::unmarshal_binary`] with an empty slice.
    pub fn read_ext<E: Extension + ?Sized>(&mut self, e: &mut E) -> Result<(), Error> {
        let lead = self.peek(1)?[0];
        let hw = Self::ext_header_width(lead)
            .ok_or_else(|| read_bytes::mismatch(Kind::Ext, lead))?;
        let (sz, typ, _) = read_bytes::ext_header(self.peek(hw)?)?;
        if typ != e.ext_type() {
            return Err(Error::ExtensionType { wanted: e.ext_type(), got: typ });
        }
        let total = hw + sz;
        let window = self.peek(total)?;
        e.unmarshal_binary(&window[hw..])?;
        self.consume(total);
        Ok(())
    }

    /// Read a timestamp from the reserved fixext8 payload.
    pub fn read_time(&mut self) -> Result<SystemTime, Error> {
        let lead = self.peek(1)?[0];
        if lead != FIXEXT8 {
            return Err(read_bytes::mismatch(Kind::Ext, lead));
        }
        let (t, _) = read_bytes::read_time(self.peek(10)?)?;
        self.consume(10);
        Ok(t)
    }

    /// Read a complex number of `f32` components.
    pub fn read_complex32(&mut self) -> Result<Complex32, Error> {
        let lead = self.peek(1)?[0];
        if lead != FIXEXT8 {
            return Err(read_bytes::mismatch(Kind::Ext, lead));
        }
        let (v, _) = read_bytes::read_complex32(self.peek(10)?)?;
        self.consume(10);
        Ok(v)
    }

    /// Read a complex number of `f64` components.
    pub fn read_complex64(&mut self) -> Result<Complex64, Error> {
        let lead = self.peek(1)?[0];
        if lead != FIXEXT16 {
            return Err(read_bytes::mismatch(Kind::Ext, lead));
        }
        let (v, _) = read_bytes::read_complex64(self.peek(18)?)?;
        self.consume(18);
        Ok(v)
    }

    /// Advance past the next well-formed object.
    ///
    /// Iterative, like the slice [`crate::read_bytes::skip`]: one
    /// outstanding-object count stands in for the work stack, and payloads
    /// are discarded without being buffered wholesale.
    pub fn skip(&mut self) -> Result<(), Error> {
        let mut outstanding: u64 = 1;
        while outstanding > 0 {
            outstanding -= 1;
            let lead = self.peek(1)?[0];
            match lead {
                0x00..=POS_FIXINT_MAX | NEG_FIXINT_MIN..=0xff | NIL | FALSE | TRUE => {
                    self.discard(1)?
                }
                INT8 | UINT8 => self.discard(2)?,
                INT16 | UINT16 => self.discard(3)?,
                INT32 | UINT32 | FLOAT32 => self.discard(5)?,
                INT64 | UINT64 | FLOAT64 => self.discard(9)?,
                FIXSTR_MIN..=FIXSTR_MAX => self.discard(1 + (lead & 0x1f) as usize)?,
                STR8 | BIN8 => {
                    let len = self.peek(2)?[1] as usize;
                    self.discard(2 + len)?;
                }
                STR16 | BIN16 => {
                    let w = self.peek(3)?;
                    let len = u16::from_be_bytes([w[1], w[2]]) as usize;
                    self.discard(3 + len)?;
                }
                STR32 | BIN32 => {
                    let w = self.peek(5)?;
                    let len = u32::from_be_bytes([w[1], w[2], w[3], w[4]]) as usize;
                    self.discard(5 + len)?;
                }
                FIXEXT1 => self.discard(3)?,
                FIXEXT2 => self.discard(4)?,
                FIXEXT4 => self.discard(6)?,
                FIXEXT8 => self.discard(10)?,
                FIXEXT16 => self.discard(18)?,
                EXT8 => {
                    let len = self.peek(2)?[1] as usize;
                    self.discard(3 + len)?;
                }
                EXT16 => {
                    let w = self.peek(3)?;
                    let len = u16::from_be_bytes([w[1], w[2]]) as usize;
                    self.discard(4 + len)?;
                }
                EXT32 => {
                    let w = self.peek(5)?;
                    let len = u32::from_be_bytes([w[1], w[2], w[3], w[4]]) as usize;
                    self.discard(6 + len)?;
                }
                FIXARRAY_MIN..=FIXARRAY_MAX => {
                    self.consume(1);
                    outstanding = outstanding.saturating_add(u64::from(lead & 0x0f));
                }
                ARRAY16 => {
                    let w = self.peek(3)?;
                    let len = u64::from(u16::from_be_bytes([w[1], w[2]]));
                    self.consume(3);
                    outstanding = outstanding.saturating_add(len);
                }
                ARRAY32 => {
                    let w = self.peek(5)?;
                    let len = u64::from(u32::from_be_bytes([w[1], w[2], w[3], w[4]]));
                    self.consume(5);
                    outstanding = outstanding.saturating_add(len);
                }
                FIXMAP_MIN..=FIXMAP_MAX => {
                    self.consume(1);
                    outstanding = outstanding.saturating_add(2 * u64::from(lead & 0x0f));
                }
                MAP16 => {
                    let w = self.peek(3)?;
                    let len = u64::from(u16::from_be_bytes([w[1], w[2]]));
                    self.consume(3);
                    outstanding = outstanding.saturating_add(2 * len);
                }
                MAP32 => {
                    let w = self.peek(5)?;
                    let len = u64::from(u32::from_be_bytes([w[1], w[2], w[3], w[4]]));
                    self.consume(5);
                    outstanding = outstanding.saturating_add(2 * len);
                }
                NEVER_USED => return Err(Error::InvalidPrefix(lead)),
            }
        }
        Ok(())
    }

    /// Read the next object into an owned [`Value`].
    pub fn read_value(&mut self) -> Result<Value, Error> {
        match self.next_kind()? {
            Kind::Nil => {
                self.read_nil()?;
                Ok(Value::Nil)
            }
            Kind::Bool => self.read_bool().map(Value::Bool),
            Kind::Int => self.read_i64().map(Value::Int),
            Kind::Uint => self.read_u64().map(Value::Uint),
            Kind::Float32 => self.read_f32().map(Value::F32),
            Kind::Float64 => self.read_f64().map(Value::F64),
            Kind::Str => self.read_str().map(Value::Str),
            Kind::Bin => self.read_bin().map(Value::Bin),
            Kind::Array => {
                let len = self.read_array_header()?;
                let mut els = Vec::with_capacity(len.min(4096) as usize);
                for _ in 0..len {
                    els.push(self.read_value()?);
                }
                Ok(Value::Array(els))
            }
            Kind::Map => {
                let len = self.read_map_header()?;
                let mut pairs = Vec::with_capacity(len.min(4096) as usize);
                for _ in 0..len {
                    let key = self.read_str()?;
                    let val = self.read_value()?;
                    pairs.push((key, val));
                }
                Ok(Value::Map(pairs))
            }
            Kind::Ext => match self.peek_ext_type()? {
                COMPLEX32_EXTENSION => self.read_complex32().map(Value::Complex32),
                COMPLEX64_EXTENSION => self.read_complex64().map(Value::Complex64),
                TIME_EXTENSION => self.read_time().map(Value::Time),
                typ => {
                    let mut raw = RawExtension { typ, data: Vec::new() };
                    self.read_ext(&mut raw)?;
                    Ok(Value::Ext(raw))
                }
            },
            Kind::Invalid => Err(Error::InvalidPrefix(self.peek(1)?[0])),
        }
    }
}
