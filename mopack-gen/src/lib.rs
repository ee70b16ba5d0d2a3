#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod decl;
mod diag;
mod elem;
mod ingest;
mod resolve;
mod session;
pub mod sink;

pub use decl::{ArraySize, FieldDecl, Shape, TypeDecl, TypeRef};
pub use diag::{Diagnostic, Severity};
pub use elem::{Array, Base, BaseElem, Elem, Map, Ptr, Slice, Struct, StructField};
pub use ingest::{elaborate, register};
pub use resolve::resolve;
pub use session::Session;
pub use sink::{walk, Sink};

use indexmap::IndexSet;

/// Everything a pipeline run produces.
#[derive(Debug)]
pub struct Outcome {
    /// One resolved element tree per surviving record, in declaration
    /// order.
    pub elems: Vec<Elem>,
    /// Names the resolver could not reduce, deduplicated in first-seen
    /// order. The emitter assumes each satisfies the encode/decode
    /// contract by name.
    pub unresolved: Vec<String>,
    /// The diagnostics accumulated across both passes.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the whole pipeline over one compilation unit: register every
/// declaration, elaborate each record, resolve references, and report.
pub fn process(decls: &[TypeDecl]) -> Outcome {
    let mut session = Session::new();
    for decl in decls {
        register(&mut session, decl);
    }

    let mut elems = Vec::new();
    for decl in decls {
        if let Some(elem) = elaborate(&mut session, decl) {
            elems.push(elem);
        }
    }

    let mut unresolved = IndexSet::new();
    for elem in &mut elems {
        unresolved.extend(resolve(&session, elem));
    }

    Outcome {
        elems,
        unresolved: unresolved.into_iter().collect(),
        diagnostics: session.into_diagnostics(),
    }
}
