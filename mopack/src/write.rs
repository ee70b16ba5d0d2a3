//! The buffered streaming encoder.

use std::io::Write;
use std::time::SystemTime;

use num_complex::{Complex32, Complex64};

use crate::error::Error;
use crate::ext::Extension;
use crate::value::{self, Value};
use crate::{size, write_bytes};

const DEFAULT_CAPACITY: usize = 2048;

/// A MessagePack encoder over any [`std::io::Write`] sink.
///
/// Writes accumulate in an internal buffer and reach the sink on
/// [`Writer::flush`] or whenever the buffer cannot hold the next object.
/// If a flush fails the buffer is reset and the error surfaces as
/// [`Error::Io`]; the sink may have received a partial frame, so the writer
/// must be discarded.
///
/// A writer is single-threaded: it owns its buffer and offset and is not
/// meant to be shared.
pub struct Writer<W: Write> {
    sink: W,
    buf: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// A writer with the default buffer capacity.
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_CAPACITY)
    }

    /// A writer with the given buffer capacity.
    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        Writer { sink, buf: Vec::with_capacity(capacity.max(size::UINT)) }
    }

    /// Bytes accumulated but not yet flushed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Ensure `n` contiguous writable bytes, flushing to the sink if the
    /// buffer cannot hold them, and return the offset where they begin.
    /// On error the buffered bytes are untouched from the caller's
    /// perspective: nothing has been appended yet.
    fn require(&mut self, n: usize) -> Result<usize, Error> {
        if self.buf.len() + n > self.buf.capacity() {
            self.flush()?;
            if n > self.buf.capacity() {
                self.buf.reserve(n);
            }
        }
        Ok(self.buf.len())
    }

    /// Write the buffered bytes to the sink and reset the buffer.
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let res = self.sink.write_all(&self.buf);
        self.buf.clear();
        res.map_err(Error::Io)
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> Result<W, Error> {
        self.flush()?;
        Ok(self.sink)
    }

    /// Write `nil`.
    pub fn write_nil(&mut self) -> Result<(), Error> {
        self.require(size::NIL)?;
        write_bytes::append_nil(&mut self.buf);
        Ok(())
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, v: bool) -> Result<(), Error> {
        self.require(size::BOOL)?;
        write_bytes::append_bool(&mut self.buf, v);
        Ok(())
    }

    /// Write a signed integer with the tightest prefix.
    pub fn write_i64(&mut self, v: i64) -> Result<(), Error> {
        self.require(size::INT)?;
        write_bytes::append_i64(&mut self.buf, v);
        Ok(())
    }

    /// Write a signed 8-bit integer.
    pub fn write_i8(&mut self, v: i8) -> Result<(), Error> {
        self.write_i64(i64::from(v))
    }

    /// Write a signed 16-bit integer.
    pub fn write_i16(&mut self, v: i16) -> Result<(), Error> {
        self.write_i64(i64::from(v))
    }

    /// Write a signed 32-bit integer.
    pub fn write_i32(&mut self, v: i32) -> Result<(), Error> {
        self.write_i64(i64::from(v))
    }

    /// Write an unsigned integer with the tightest prefix.
    pub fn write_u64(&mut self, v: u64) -> Result<(), Error> {
        self.require(size::UINT)?;
        write_bytes::append_u64(&mut self.buf, v);
        Ok(())
    }

    /// Write an unsigned 8-bit integer.
    pub fn write_u8(&mut self, v: u8) -> Result<(), Error> {
        self.write_u64(u64::from(v))
    }

    /// Write an unsigned 16-bit integer.
    pub fn write_u16(&mut self, v: u16) -> Result<(), Error> {
        self.write_u64(u64::from(v))
    }

    /// Write an unsigned 32-bit integer.
    pub fn write_u32(&mut self, v: u32) -> Result<(), Error> {
        self.write_u64(u64::from(v))
    }

    /// Write a single-precision float.
    pub fn write_f32(&mut self, v: f32) -> Result<(), Error> {
        self.require(size::FLOAT32)?;
        write_bytes::append_f32(&mut self.buf, v);
        Ok(())
    }

    /// Write a double-precision float.
    pub fn write_f64(&mut self, v: f64) -> Result<(), Error> {
        self.require(size::FLOAT64)?;
        write_bytes::append_f64(&mut self.buf, v);
        Ok(())
    }

    /// Write a map header for `len` key/value pairs.
    pub fn write_map_header(&mut self, len: u32) -> Result<(), Error> {
        self.require(size::MAP_HEADER)?;
        write_bytes::append_map_header(&mut self.buf, len);
        Ok(())
    }

    /// Write an array header for `len` elements.
    pub fn write_array_header(&mut self, len: u32) -> Result<(), Error> {
        self.require(size::ARRAY_HEADER)?;
        write_bytes::append_array_header(&mut self.buf, len);
        Ok(())
    }

    /// Write a string.
    pub fn write_str(&mut self, v: &str) -> Result<(), Error> {
        self.require(size::str_size(v.len()))?;
        write_bytes::append_str(&mut self.buf, v);
        Ok(())
    }

    /// Write raw bytes as `bin`.
    pub fn write_bin(&mut self, v: &[u8]) -> Result<(), Error> {
        self.require(size::bin_size(v.len()))?;
        write_bytes::append_bin(&mut self.buf, v);
        Ok(())
    }

    /// Write an extension with the shortest header for its payload.
    pub fn write_ext<E: Extension + ?Sized>(&mut self, e: &E) -> Result<(), Error> {
        self.require(size::ext_size(e.len()))?;
        write_bytes::append_ext(&mut self.buf, e)
    }

    /// Write a timestamp as the reserved fixext8 payload.
    pub fn write_time(&mut self, t: SystemTime) -> Result<(), Error> {
        self.require(size::TIME)?;
        write_bytes::append_time(&mut self.buf, t)
    }

    /// Write a complex number of `f32` components.
    pub fn write_complex32(&mut self, v: Complex32) -> Result<(), Error> {
        self.require(size::COMPLEX32)?;
        write_bytes::append_complex32(&mut self.buf, v);
        Ok(())
    }

    /// Write a complex number of `f64` components.
    pub fn write_complex64(&mut self, v: Complex64) -> Result<(), Error> {
        self.require(size::COMPLEX64)?;
        write_bytes::append_complex64(&mut self.buf, v);
        Ok(())
    }

    /// Write a dynamic [`Value`].
    pub fn write_value(&mut self, v: &Value) -> Result<(), Error> {
        self.require(v.msg_size())?;
        value::append_value(&mut self.buf, v)
    }
}
