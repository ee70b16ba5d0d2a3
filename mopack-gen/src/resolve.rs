//! The second pass: rewriting identifier references against the session
//! tables and collecting the names that stay external.

use crate::elem::{Base, BaseElem, Elem};
use crate::session::Session;

/// Walk an elaborated tree and resolve every [`Base::Ident`] leaf:
///
/// 1. a name in the processed table is left alone; the emitter delegates
///    to that type's generated methods;
/// 2. a registered name that reduced to a known base is rewritten to that
///    base with `convert` set, keeping the alias name for the explicit
///    conversion in emitted code;
/// 3. anything else is returned as unresolved; the emitter assumes the
///    name satisfies the encode/decode contract by itself.
///
/// A named struct whose name was never registered is reported unresolved
/// too; anonymous inline records are not references and pass through.
pub fn resolve(session: &Session, elem: &mut Elem) -> Vec<String> {
    match elem {
        Elem::Ptr(p) => resolve(session, &mut p.value),
        Elem::Slice(s) => resolve(session, &mut s.els),
        Elem::Array(a) => resolve(session, &mut a.els),
        Elem::Map(m) => resolve(session, &mut m.value),
        Elem::Struct(s) => {
            let mut out = Vec::new();
            if !s.name.is_empty() && session.ident(&s.name).is_none() {
                out.push(s.name.clone());
            }
            for field in &mut s.fields {
                out.extend(resolve(session, &mut field.elem));
            }
            out
        }
        Elem::Base(b) => {
            if b.base != Base::Ident {
                return Vec::new();
            }
            let Some(name) = b.ident.clone() else {
                return Vec::new();
            };
            if session.is_processed(&name) {
                // the emitter delegates to the generated methods
                return Vec::new();
            }
            match session.ident(&name) {
                Some(base) if base != Base::Ident => {
                    // a named alias of a known base: lower one level and
                    // require an explicit conversion
                    log::trace!("resolved {name} to {base}");
                    *b = BaseElem {
                        base,
                        ident: Some(name),
                        convert: true,
                        shim_to_base: b.shim_to_base.take(),
                        shim_from_base: b.shim_from_base.take(),
                    };
                    Vec::new()
                }
                _ => vec![name],
            }
        }
    }
}
