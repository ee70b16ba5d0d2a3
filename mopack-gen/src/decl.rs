//! The normalized type-declaration stream the pipeline consumes.
//!
//! Producers (source parsers, schema-file readers, runtime metadata) all
//! conform by emitting these plain values; nothing here knows where a
//! declaration came from. Type references use the host language's Rust
//! spellings (`u32`, `String`, `SystemTime`, ...); anything unrecognized is
//! an opaque identifier resolved in the second pass.

use core::fmt;

/// One named declaration in a compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    /// The declared name.
    pub name: String,
    /// The outer shape of the declaration.
    pub shape: Shape,
}

impl TypeDecl {
    /// A declaration with the given name and shape.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        TypeDecl { name: name.into(), shape }
    }
}

/// The outer shape of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A record with named fields; the only shape that produces code.
    Record(Vec<FieldDecl>),
    /// A named alias of another type.
    Alias(TypeRef),
    /// A fixed-size array type.
    Array {
        /// The declared length: a literal or a named constant.
        size: ArraySize,
        /// The element type.
        elem: TypeRef,
    },
    /// A growable sequence type.
    Slice(TypeRef),
    /// A pointer type.
    Pointer(TypeRef),
    /// A map type.
    Map {
        /// The key type; only strings survive ingest.
        key: TypeRef,
        /// The value type.
        value: TypeRef,
    },
}

/// One field declaration inside a record.
///
/// `names` is usually a single name; an inline multi-name declaration
/// carries several, and an embedded (anonymous) field carries none; its
/// name derives from the type expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// The declared names; empty for an embedded field.
    pub names: Vec<String>,
    /// The field's type expression.
    pub ty: TypeRef,
    /// The raw wire-key tag, if the source carried one.
    pub tag: Option<String>,
}

impl FieldDecl {
    /// A single-name field with no tag.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldDecl { names: vec![name.into()], ty, tag: None }
    }

    /// A single-name field with a wire-key tag.
    pub fn tagged(name: impl Into<String>, ty: TypeRef, tag: impl Into<String>) -> Self {
        FieldDecl { names: vec![name.into()], ty, tag: Some(tag.into()) }
    }

    /// An embedded (anonymous) field.
    pub fn embedded(ty: TypeRef) -> Self {
        FieldDecl { names: Vec::new(), ty, tag: None }
    }

    /// An inline multi-name field sharing one type.
    pub fn multi<I, S>(names: I, ty: TypeRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldDecl { names: names.into_iter().map(Into::into).collect(), ty, tag: None }
    }
}

/// A type expression as a producer sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// A bare name: a builtin spelling or a local identifier.
    Named(String),
    /// A module-qualified name.
    Path {
        /// The module path, `::`-joined.
        module: String,
        /// The final name.
        name: String,
    },
    /// A pointer to another type.
    Pointer(Box<TypeRef>),
    /// A growable sequence of another type.
    Slice(Box<TypeRef>),
    /// A fixed-size array of another type.
    Array {
        /// The declared length.
        size: ArraySize,
        /// The element type.
        elem: Box<TypeRef>,
    },
    /// A map from `key` to `value`.
    Map {
        /// The key type.
        key: Box<TypeRef>,
        /// The value type.
        value: Box<TypeRef>,
    },
    /// An inline anonymous record.
    Record(Vec<FieldDecl>),
    /// The dynamic any-value type.
    Any,
}

impl TypeRef {
    /// A bare named reference.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// A pointer to `inner`.
    pub fn pointer(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    /// A slice of `elem`.
    pub fn slice(elem: TypeRef) -> Self {
        TypeRef::Slice(Box::new(elem))
    }

    /// An array of `elem` with the given size.
    pub fn array(size: ArraySize, elem: TypeRef) -> Self {
        TypeRef::Array { size, elem: Box::new(elem) }
    }

    /// A map from `key` to `value`.
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map { key: Box::new(key), value: Box::new(value) }
    }
}

/// A declared array length: a literal or a named constant. Emission treats
/// both as opaque text.
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySize {
    /// A literal length.
    Literal(u64),
    /// A named constant.
    Named(String),
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArraySize::Literal(n) => write!(f, "{n}"),
            ArraySize::Named(name) => f.write_str(name),
        }
    }
}
