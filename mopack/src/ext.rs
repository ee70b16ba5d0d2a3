//! The extension subsystem: application-typed opaque payloads tagged with a
//! signed 8-bit type id.
//!
//! Ids `3`, `4`, and `5` are reserved for complex numbers and timestamps;
//! MessagePack itself reserves the negative range. User extensions implement
//! [`Extension`] and register a factory in an [`ExtensionRegistry`] so the
//! dynamic decode paths can materialize them by wire id.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use num_complex::{Complex32, Complex64};

use crate::error::Error;

/// Extension id reserved for complex numbers with `f32` components.
pub const COMPLEX32_EXTENSION: i8 = 3;
/// Extension id reserved for complex numbers with `f64` components.
pub const COMPLEX64_EXTENSION: i8 = 4;
/// Extension id reserved for timestamps.
pub const TIME_EXTENSION: i8 = 5;

/// A type with its own binary encoding, transported as an extension payload.
pub trait Extension {
    /// The type id identifying this extension on the wire. Negative ids are
    /// reserved by the MessagePack specification.
    fn ext_type(&self) -> i8;

    /// The exact length of the encoded payload.
    fn len(&self) -> usize;

    /// Whether the encoded payload is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the payload into `buf`, which has length [`Extension::len`].
    fn marshal_binary_to(&self, buf: &mut [u8]) -> Result<(), Error>;

    /// Replace this value with one decoded from `data`.
    ///
    /// The decoder calls this with exactly the payload slice, which may be
    /// empty: a zero-length extension decode still lands here with `&[]`.
    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), Error>;
}

/// An extension kept as raw bytes, for applications that defer decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtension {
    /// The wire type id.
    pub typ: i8,
    /// The undecoded payload.
    pub data: Vec<u8>,
}

impl RawExtension {
    /// A raw extension with the given id and payload.
    pub fn new(typ: i8, data: impl Into<Vec<u8>>) -> Self {
        RawExtension { typ, data: data.into() }
    }
}

impl Extension for RawExtension {
    fn ext_type(&self) -> i8 {
        self.typ
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn marshal_binary_to(&self, buf: &mut [u8]) -> Result<(), Error> {
        buf.copy_from_slice(&self.data);
        Ok(())
    }

    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), Error> {
        self.data.clear();
        self.data.extend_from_slice(data);
        Ok(())
    }
}

/// Constructs a fresh zero value of a registered extension.
pub type ExtensionFactory = fn() -> Box<dyn Extension>;

/// Maps extension type ids to factories for the decode-into-dynamic paths.
///
/// The registry is an explicit value, not process state: build it during
/// startup, then share it immutably with every reader that needs it. `&self`
/// access makes concurrent readers safe by construction.
#[derive(Default)]
pub struct ExtensionRegistry {
    factories: BTreeMap<i8, ExtensionFactory>,
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for extension id `typ`.
    ///
    /// # Panics
    ///
    /// Panics if `typ` is one of the reserved ids (`3`, `4`, `5`) or has
    /// already been registered. Both are configuration errors made by the
    /// program, not runtime conditions, and fail fast.
    pub fn register(&mut self, typ: i8, factory: ExtensionFactory) {
        if let COMPLEX32_EXTENSION | COMPLEX64_EXTENSION | TIME_EXTENSION = typ {
            panic!("mopack: forbidden extension type {typ} (3, 4, and 5 are reserved)");
        }
        if self.factories.insert(typ, factory).is_some() {
            panic!("mopack: extension type {typ} registered more than once");
        }
        log::debug!("registered extension type {typ}");
    }

    /// Whether a factory is registered for `typ`.
    pub fn contains(&self, typ: i8) -> bool {
        self.factories.contains_key(&typ)
    }

    /// Decode the next object in `bytes` into a freshly constructed
    /// extension, returning it with the remaining input.
    ///
    /// Unregistered ids decode into a [`RawExtension`].
    pub fn read_bytes<'a>(&self, bytes: &'a [u8]) -> Result<(Box<dyn Extension>, &'a [u8]), Error> {
        let typ = crate::read_bytes::peek_ext_type(bytes)?;
        let mut ext = self.instantiate(typ);
        let rest = crate::read_bytes::read_ext(bytes, &mut *ext)?;
        Ok((ext, rest))
    }

    /// Decode the next object from a [`crate::Reader`] into a freshly
    /// constructed extension.
    ///
    /// Unregistered ids decode into a [`RawExtension`].
    pub fn read<R: std::io::Read>(
        &self,
        rd: &mut crate::read::Reader<R>,
    ) -> Result<Box<dyn Extension>, Error> {
        let typ = rd.peek_ext_type()?;
        let mut ext = self.instantiate(typ);
        rd.read_ext(&mut *ext)?;
        Ok(ext)
    }

    fn instantiate(&self, typ: i8) -> Box<dyn Extension> {
        match self.factories.get(&typ) {
            Some(factory) => factory(),
            None => Box::new(RawExtension { typ, data: Vec::new() }),
        }
    }
}

// Reserved payload layouts. Timestamps are fixext8: seconds since the epoch
// as u32 BE, then nanoseconds as u32 BE. Complex numbers are fixext8 /
// fixext16: the real component, then the imaginary, IEEE-754 BE.

pub(crate) fn time_payload(t: SystemTime) -> Result<[u8; 8], Error> {
    let since_epoch = t.duration_since(UNIX_EPOCH).map_err(|_| Error::TimeOutOfRange)?;
    let secs = u32::try_from(since_epoch.as_secs()).map_err(|_| Error::TimeOutOfRange)?;
    let mut payload = [0u8; 8];
    payload[..4].copy_from_slice(&secs.to_be_bytes());
    payload[4..].copy_from_slice(&since_epoch.subsec_nanos().to_be_bytes());
    Ok(payload)
}

pub(crate) fn time_from_payload(payload: &[u8]) -> SystemTime {
    let secs = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let nanos = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    UNIX_EPOCH + Duration::new(u64::from(secs), nanos)
}

pub(crate) fn complex32_payload(v: Complex32) -> [u8; 8] {
    let mut payload = [0u8; 8];
    payload[..4].copy_from_slice(&v.re.to_be_bytes());
    payload[4..].copy_from_slice(&v.im.to_be_bytes());
    payload
}

pub(crate) fn complex32_from_payload(payload: &[u8]) -> Complex32 {
    Complex32::new(
        f32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
        f32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]),
    )
}

pub(crate) fn complex64_payload(v: Complex64) -> [u8; 16] {
    let mut payload = [0u8; 16];
    payload[..8].copy_from_slice(&v.re.to_be_bytes());
    payload[8..].copy_from_slice(&v.im.to_be_bytes());
    payload
}

pub(crate) fn complex64_from_payload(payload: &[u8]) -> Complex64 {
    let mut re = [0u8; 8];
    let mut im = [0u8; 8];
    re.copy_from_slice(&payload[..8]);
    im.copy_from_slice(&payload[8..16]);
    Complex64::new(f64::from_be_bytes(re), f64::from_be_bytes(im))
}
