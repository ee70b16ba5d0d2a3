//! The element tree: the intermediate representation linking a record's
//! shape to its wire encoding plan.
//!
//! [`Elem`] is a tagged sum, matched per variant; emitters walk it through
//! the [`crate::sink`] visitor. A resolved tree contains no
//! [`Base::Ident`] leaf that was not reported unresolved.

use core::fmt;

/// The base kinds a leaf can reduce to.
///
/// `Uint` and `Int` are the platform-width integers (`usize`/`isize`);
/// `Complex32`/`Complex64` carry two `f32`/`f64` components. `Ident` is an
/// identifier the first pass could not reduce; the resolver rewrites or
/// reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    /// A UTF-8 string.
    String,
    /// A byte slice, encoded as `bin`.
    Bytes,
    /// A single byte.
    Byte,
    /// Platform-width signed integer.
    Int,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Platform-width unsigned integer.
    Uint,
    /// 8-bit unsigned integer.
    Uint8,
    /// 16-bit unsigned integer.
    Uint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// 64-bit unsigned integer.
    Uint64,
    /// A boolean.
    Bool,
    /// Single-precision float.
    Float32,
    /// Double-precision float.
    Float64,
    /// Complex number of two `f32` components.
    Complex32,
    /// Complex number of two `f64` components.
    Complex64,
    /// A timestamp.
    Time,
    /// The dynamic any-value kind.
    Any,
    /// An extension payload.
    Ext,
    /// An identifier not yet reduced to a known kind.
    Ident,
}

impl Base {
    /// Map a host-language spelling to its base kind; unknown spellings are
    /// [`Base::Ident`].
    pub fn from_name(name: &str) -> Base {
        match name {
            "String" | "str" => Base::String,
            "byte" => Base::Byte,
            "bool" => Base::Bool,
            "i8" => Base::Int8,
            "i16" => Base::Int16,
            "i32" => Base::Int32,
            "i64" => Base::Int64,
            "isize" => Base::Int,
            "u8" => Base::Uint8,
            "u16" => Base::Uint16,
            "u32" => Base::Uint32,
            "u64" => Base::Uint64,
            "usize" => Base::Uint,
            "f32" => Base::Float32,
            "f64" => Base::Float64,
            "Complex32" => Base::Complex32,
            "Complex64" => Base::Complex64,
            "SystemTime" => Base::Time,
            "Value" => Base::Any,
            "Extension" | "RawExtension" => Base::Ext,
            _ => Base::Ident,
        }
    }

    /// The codec operation stem for this kind: emitters form
    /// `write_{stem}` / `read_{stem}` / `append_{stem}` from it. `Ident`
    /// has none; those fields delegate to the named type's own
    /// encode/decode methods.
    pub fn method_suffix(&self) -> Option<&'static str> {
        match self {
            Base::String => Some("str"),
            Base::Bytes => Some("bin"),
            Base::Byte | Base::Uint8 => Some("u8"),
            Base::Int | Base::Int64 => Some("i64"),
            Base::Int8 => Some("i8"),
            Base::Int16 => Some("i16"),
            Base::Int32 => Some("i32"),
            Base::Uint | Base::Uint64 => Some("u64"),
            Base::Uint16 => Some("u16"),
            Base::Uint32 => Some("u32"),
            Base::Bool => Some("bool"),
            Base::Float32 => Some("f32"),
            Base::Float64 => Some("f64"),
            Base::Complex32 => Some("complex32"),
            Base::Complex64 => Some("complex64"),
            Base::Time => Some("time"),
            Base::Any => Some("value"),
            Base::Ext => Some("ext"),
            Base::Ident => None,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One node of the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Elem {
    /// A pointer around an inner element.
    Ptr(Ptr),
    /// A growable sequence.
    Slice(Slice),
    /// A fixed-size array.
    Array(Array),
    /// A string-keyed map.
    Map(Map),
    /// A record.
    Struct(Struct),
    /// A leaf of a base kind.
    Base(BaseElem),
}

/// A pointer. The inner element is never itself a pointer: pointers
/// collapse at ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct Ptr {
    /// The pointed-to element.
    pub value: Box<Elem>,
}

/// A growable sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// The element type.
    pub els: Box<Elem>,
}

/// A fixed-size array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// The declared length as opaque text: a literal or a named constant.
    pub size: String,
    /// The element type.
    pub els: Box<Elem>,
}

/// A string-keyed map. Keys are always strings on this wire; non-string
/// maps are rejected at ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    /// The value type.
    pub value: Box<Elem>,
}

/// A record and its encodable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    /// The declared name; empty for inline anonymous records.
    pub name: String,
    /// Whether the record encodes as a positional array instead of a
    /// string-keyed map.
    pub as_tuple: bool,
    /// The fields, in declaration order.
    pub fields: Vec<StructField>,
}

/// One encodable field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// The field's name in the source record.
    pub name: String,
    /// The wire key.
    pub tag: String,
    /// The field's element.
    pub elem: Elem,
}

/// A leaf of the tree: a base kind, possibly reached through a named alias
/// or a user-supplied shim pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseElem {
    /// The base kind.
    pub base: Base,
    /// The textual name, when the kind is [`Base::Ident`] or a known base
    /// was reached via a named alias.
    pub ident: Option<String>,
    /// Whether emitted code needs an explicit conversion through the base
    /// kind.
    pub convert: bool,
    /// User converter from the field's type to the base kind.
    pub shim_to_base: Option<String>,
    /// User converter from the base kind back to the field's type.
    pub shim_from_base: Option<String>,
}

impl BaseElem {
    /// A plain leaf of the given kind.
    pub fn new(base: Base) -> Self {
        BaseElem { base, ident: None, convert: false, shim_to_base: None, shim_from_base: None }
    }

    /// A leaf for an unreduced identifier.
    pub fn ident(name: impl Into<String>) -> Self {
        BaseElem {
            base: Base::Ident,
            ident: Some(name.into()),
            convert: false,
            shim_to_base: None,
            shim_from_base: None,
        }
    }
}

impl Elem {
    /// The leaf, if this node is one.
    pub fn as_base(&self) -> Option<&BaseElem> {
        match self {
            Elem::Base(b) => Some(b),
            _ => None,
        }
    }

    /// The record, if this node is one.
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Elem::Struct(s) => Some(s),
            _ => None,
        }
    }
}
