//! The contract between a resolved tree and a code emitter.
//!
//! An emitter implements [`Sink`] and drives [`walk`]; each callback
//! receives one node's data and decides whether to walk deeper. The core
//! never calls back into the emitter: rendering is a pure function of the
//! resolved tree plus the emitter's own naming strategy for temporaries.

use crate::elem::{BaseElem, Elem, StructField};

/// A visitor over the element-tree variants.
pub trait Sink {
    /// A pointer around `value`.
    fn ptr(&mut self, value: &Elem);
    /// A growable sequence of `els`.
    fn slice(&mut self, els: &Elem);
    /// A fixed-size array of `els`; `size` is opaque text, a literal or a
    /// named constant.
    fn array(&mut self, size: &str, els: &Elem);
    /// A string-keyed map with `value` values.
    fn map(&mut self, value: &Elem);
    /// A record with its wire fields.
    fn record(&mut self, name: &str, as_tuple: bool, fields: &[StructField]);
    /// A leaf: base kind, alias name, conversion flag, and shims live on
    /// the [`BaseElem`].
    fn base(&mut self, base: &BaseElem);
}

/// Dispatch one node to the sink.
pub fn walk<S: Sink + ?Sized>(elem: &Elem, sink: &mut S) {
    match elem {
        Elem::Ptr(p) => sink.ptr(&p.value),
        Elem::Slice(s) => sink.slice(&s.els),
        Elem::Array(a) => sink.array(&a.size, &a.els),
        Elem::Map(m) => sink.map(&m.value),
        Elem::Struct(s) => sink.record(&s.name, s.as_tuple, &s.fields),
        Elem::Base(b) => sink.base(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{FieldDecl, Shape, TypeDecl, TypeRef};
    use crate::ingest::{elaborate, register};
    use crate::session::Session;

    /// A sink that renders operation stems depth-first, the way a real
    /// emitter names codec calls.
    #[derive(Default)]
    struct Stems(Vec<String>);

    impl Sink for Stems {
        fn ptr(&mut self, value: &Elem) {
            self.0.push("ptr".into());
            walk(value, self);
        }

        fn slice(&mut self, els: &Elem) {
            self.0.push("slice".into());
            walk(els, self);
        }

        fn array(&mut self, size: &str, els: &Elem) {
            self.0.push(format!("array[{size}]"));
            walk(els, self);
        }

        fn map(&mut self, value: &Elem) {
            self.0.push("map".into());
            walk(value, self);
        }

        fn record(&mut self, name: &str, _as_tuple: bool, fields: &[StructField]) {
            self.0.push(format!("struct {name}"));
            for field in fields {
                walk(&field.elem, self);
            }
        }

        fn base(&mut self, base: &BaseElem) {
            match base.base.method_suffix() {
                Some(stem) => self.0.push(format!("write_{stem}")),
                None => self.0.push(format!("delegate {}", base.ident.as_deref().unwrap_or(""))),
            }
        }
    }

    #[test]
    fn a_sink_sees_every_node_once() {
        let decl = TypeDecl::new(
            "Packet",
            Shape::Record(vec![
                FieldDecl::new("id", TypeRef::named("u64")),
                FieldDecl::new("tags", TypeRef::slice(TypeRef::named("String"))),
                FieldDecl::new(
                    "meta",
                    TypeRef::map(TypeRef::named("String"), TypeRef::named("Value")),
                ),
            ]),
        );
        let mut session = Session::new();
        register(&mut session, &decl);
        let elem = elaborate(&mut session, &decl).unwrap();

        let mut stems = Stems::default();
        walk(&elem, &mut stems);
        assert_eq!(
            stems.0,
            [
                "ptr",
                "struct Packet",
                "write_u64",
                "slice",
                "write_str",
                "map",
                "write_value",
            ]
        );
    }
}
