//! Turning declarations into element trees.
//!
//! Two passes over a compilation unit. [`register`] records what every
//! declared name reduces to, so references can be rewritten later.
//! [`elaborate`] builds the element tree for each record, expanding
//! multi-name fields, deriving embedded-field names, and applying the
//! wire-key tag grammar:
//!
//! - `name`: the wire key
//! - `-`: omit the field
//! - `name,extension`: the field is an extension payload
//! - `name,as:T,using:to/from`: transport through `T` with user shims
//!
//! Unknown fragments warn without failing the record.

use crate::decl::{FieldDecl, Shape, TypeDecl, TypeRef};
use crate::elem::{Array, Base, BaseElem, Elem, Map, Ptr, Slice, Struct, StructField};
use crate::session::Session;

/// Pass 1: record the outer kind of a declaration in the session's ident
/// table. Records register as [`Base::Ident`]; an alias of a known base
/// registers as that base; a byte-slice declaration registers as
/// [`Base::Bytes`]; other slices, arrays, pointers, and maps are external
/// value types from a referrer's perspective and register as
/// [`Base::Ident`].
pub fn register(session: &mut Session, decl: &TypeDecl) {
    let base = match &decl.shape {
        Shape::Record(_) => Base::Ident,
        Shape::Alias(ty) => alias_base(ty),
        Shape::Slice(elem) if is_byte(elem) => Base::Bytes,
        Shape::Array { .. } | Shape::Slice(_) | Shape::Pointer(_) | Shape::Map { .. } => {
            Base::Ident
        }
    };
    session.set_ident(&decl.name, base);
}

fn alias_base(ty: &TypeRef) -> Base {
    match ty {
        TypeRef::Named(name) => Base::from_name(name),
        TypeRef::Slice(elem) if is_byte(elem) => Base::Bytes,
        TypeRef::Path { module, name } if is_system_time(module, name) => Base::Time,
        TypeRef::Any => Base::Any,
        _ => Base::Ident,
    }
}

fn is_byte(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::Named(name) if name == "u8" || name == "byte")
}

fn is_system_time(module: &str, name: &str) -> bool {
    name == "SystemTime" && (module == "std::time" || module == "time")
}

/// Pass 2: build the element tree for a record declaration.
///
/// Non-record shapes produce nothing; they are not codegen targets. The
/// result is the record's [`Struct`] wrapped in a [`Ptr`]. A record whose
/// fields all fall away is dropped with a warning, though it keeps its
/// pass-1 registration and counts as processed.
pub fn elaborate(session: &mut Session, decl: &TypeDecl) -> Option<Elem> {
    let field_decls = match &decl.shape {
        Shape::Record(fields) => fields,
        _ => return None,
    };
    log::trace!("elaborating record {}", decl.name);
    let fields = parse_fields(session, &decl.name, field_decls);
    session.mark_processed(&decl.name);
    if fields.is_empty() {
        session.warn(&decl.name, None, "record has no usable fields; dropped");
        return None;
    }
    Some(Elem::Ptr(Ptr {
        value: Box::new(Elem::Struct(Struct {
            name: decl.name.clone(),
            as_tuple: false,
            fields,
        })),
    }))
}

fn parse_fields(session: &mut Session, decl: &str, field_decls: &[FieldDecl]) -> Vec<StructField> {
    let mut out = Vec::new();
    for field in field_decls {
        match field.names.as_slice() {
            [] => {
                // embedded: the name derives from the type expression
                let Some(name) = embedded_name(&field.ty) else {
                    session.warn(decl, None, "embedded field of unsupported type; skipped");
                    continue;
                };
                parse_field(session, decl, &name, field, &mut out);
            }
            [name] => parse_field(session, decl, name, field, &mut out),
            names => {
                // inline multi-name declaration: one field per name, elem
                // parsed from the shared type, wire key = name
                for name in names {
                    let Some(elem) = parse_type_ref(session, decl, &field.ty) else {
                        session.warn(decl, Some(name.as_str()), "unsupported field type; skipped");
                        continue;
                    };
                    out.push(StructField { name: name.clone(), tag: name.clone(), elem });
                }
            }
        }
    }
    out
}

fn parse_field(
    session: &mut Session,
    decl: &str,
    name: &str,
    field: &FieldDecl,
    out: &mut Vec<StructField>,
) {
    let mut wire_key: Option<String> = None;
    let mut flag_extension = false;

    if let Some(raw) = &field.tag {
        let frags: Vec<&str> = raw.split(',').collect();
        match frags.as_slice() {
            [_] => {}
            [_, "extension"] => flag_extension = true,
            [key, as_frag, using_frag]
                if as_frag.starts_with("as:") && using_frag.starts_with("using:") =>
            {
                // explicit type shim: transport through a base kind with
                // user converters
                match parse_shim(as_frag, using_frag) {
                    Some((base, to, from)) => {
                        let ident = match base {
                            Base::Ident => {
                                Some(as_frag.trim_start_matches("as:").to_owned())
                            }
                            _ => None,
                        };
                        let tag = if key.is_empty() { name.to_owned() } else { (*key).to_owned() };
                        out.push(StructField {
                            name: name.to_owned(),
                            tag,
                            elem: Elem::Base(BaseElem {
                                base,
                                ident,
                                convert: true,
                                shim_to_base: Some(to),
                                shim_from_base: Some(from),
                            }),
                        });
                    }
                    None => {
                        session.warn(decl, Some(name), format!("couldn't parse shim tag {raw:?}"));
                    }
                }
                return;
            }
            [_, rest @ ..] => {
                for frag in rest {
                    session.warn(decl, Some(name), format!("unknown tag fragment {frag:?}"));
                }
            }
            [] => {}
        }
        if let Some(key) = frags.first() {
            if !key.is_empty() {
                wire_key = Some((*key).to_owned());
            }
        }
    }

    let tag = wire_key.unwrap_or_else(|| name.to_owned());
    if tag == "-" {
        // deliberately omitted
        return;
    }

    let Some(mut elem) = parse_type_ref(session, decl, &field.ty) else {
        session.warn(decl, Some(name), "unsupported field type; skipped");
        return;
    };

    if flag_extension {
        // an extension field must be a base type or a pointer to one
        let base = match &mut elem {
            Elem::Base(b) => Some(b),
            Elem::Ptr(p) => match p.value.as_mut() {
                Elem::Base(b) => Some(b),
                _ => None,
            },
            _ => None,
        };
        match base {
            Some(b) => b.base = Base::Ext,
            None => {
                session.warn(decl, Some(name), "field couldn't be cast as an extension; skipped");
                return;
            }
        }
    }

    out.push(StructField { name: name.to_owned(), tag, elem });
}

fn embedded_name(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Named(name) => Some(name.clone()),
        TypeRef::Pointer(inner) => embedded_name(inner),
        // qualified names and everything else: we can't reasonably know
        // their final name
        _ => None,
    }
}

fn parse_shim(as_frag: &str, using_frag: &str) -> Option<(Base, String, String)> {
    let ty = as_frag.strip_prefix("as:")?;
    let using = using_frag.strip_prefix("using:")?;
    let (to, from) = using.split_once('/')?;
    if ty.is_empty() || to.is_empty() || from.is_empty() {
        return None;
    }
    Some((Base::from_name(ty), to.to_owned(), from.to_owned()))
}

/// Translate a type expression into an element; `None` means unsupported.
fn parse_type_ref(session: &mut Session, decl: &str, ty: &TypeRef) -> Option<Elem> {
    match ty {
        TypeRef::Named(name) => {
            let base = Base::from_name(name);
            let elem = match base {
                Base::Ident => BaseElem::ident(name.clone()),
                _ => BaseElem::new(base),
            };
            Some(Elem::Base(elem))
        }
        TypeRef::Path { module, name } if is_system_time(module, name) => {
            Some(Elem::Base(BaseElem::new(Base::Time)))
        }
        TypeRef::Path { module, name } => {
            Some(Elem::Base(BaseElem::ident(format!("{module}::{name}"))))
        }
        TypeRef::Any => Some(Elem::Base(BaseElem::new(Base::Any))),
        TypeRef::Slice(elem) if is_byte(elem) => Some(Elem::Base(BaseElem::new(Base::Bytes))),
        TypeRef::Slice(elem) => {
            let els = parse_type_ref(session, decl, elem)?;
            Some(Elem::Slice(Slice { els: Box::new(els) }))
        }
        TypeRef::Array { size, elem } => {
            let els = parse_type_ref(session, decl, elem)?;
            Some(Elem::Array(Array { size: size.to_string(), els: Box::new(els) }))
        }
        TypeRef::Pointer(inner) => {
            let value = parse_type_ref(session, decl, inner)?;
            // pointers collapse: a pointer's value is never itself a pointer
            match value {
                Elem::Ptr(ptr) => Some(Elem::Ptr(ptr)),
                other => Some(Elem::Ptr(Ptr { value: Box::new(other) })),
            }
        }
        TypeRef::Map { key, value } => {
            // map keys are strings on the wire; everything else is rejected
            if !matches!(&**key, TypeRef::Named(name) if name == "String" || name == "str") {
                return None;
            }
            let value = parse_type_ref(session, decl, value)?;
            Some(Elem::Map(Map { value: Box::new(value) }))
        }
        TypeRef::Record(field_decls) => {
            let fields = parse_fields(session, decl, field_decls);
            if fields.is_empty() {
                return None;
            }
            Some(Elem::Struct(Struct { name: String::new(), as_tuple: false, fields }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ArraySize;

    fn record(name: &str, fields: Vec<FieldDecl>) -> TypeDecl {
        TypeDecl::new(name, Shape::Record(fields))
    }

    #[test]
    fn registration_reduces_outer_shapes() {
        let mut session = Session::new();
        register(&mut session, &record("Foo", vec![]));
        register(&mut session, &TypeDecl::new("Celsius", Shape::Alias(TypeRef::named("f64"))));
        register(&mut session, &TypeDecl::new("Blob", Shape::Slice(TypeRef::named("u8"))));
        register(&mut session, &TypeDecl::new("Names", Shape::Slice(TypeRef::named("String"))));

        assert_eq!(session.ident("Foo"), Some(Base::Ident));
        assert_eq!(session.ident("Celsius"), Some(Base::Float64));
        assert_eq!(session.ident("Blob"), Some(Base::Bytes));
        assert_eq!(session.ident("Names"), Some(Base::Ident));
    }

    #[test]
    fn pointers_collapse_at_ingest() {
        let mut session = Session::new();
        let decl = record(
            "Deep",
            vec![FieldDecl::new("p", TypeRef::pointer(TypeRef::pointer(TypeRef::named("u8"))))],
        );
        let elem = elaborate(&mut session, &decl).unwrap();
        let Elem::Ptr(outer) = elem else { panic!("record not wrapped in Ptr") };
        let field = &outer.value.as_struct().unwrap().fields[0];
        let Elem::Ptr(p) = &field.elem else { panic!("field not a Ptr") };
        assert!(matches!(&*p.value, Elem::Base(b) if b.base == Base::Uint8));
    }

    #[test]
    fn non_string_map_keys_are_rejected() {
        let mut session = Session::new();
        let decl = record(
            "M",
            vec![FieldDecl::new("m", TypeRef::map(TypeRef::named("u32"), TypeRef::named("bool")))],
        );
        assert!(elaborate(&mut session, &decl).is_none());
        assert_eq!(session.diagnostics().len(), 2); // field skipped + record dropped
    }

    #[test]
    fn fixed_array_sizes_stay_opaque() {
        let mut session = Session::new();
        let decl = record(
            "A",
            vec![FieldDecl::new(
                "xs",
                TypeRef::array(ArraySize::Named("WIDTH".into()), TypeRef::named("f32")),
            )],
        );
        let elem = elaborate(&mut session, &decl).unwrap();
        let Elem::Ptr(outer) = elem else { unreachable!() };
        let field = &outer.value.as_struct().unwrap().fields[0];
        let Elem::Array(arr) = &field.elem else { panic!("not an array") };
        assert_eq!(arr.size, "WIDTH");
    }
}
