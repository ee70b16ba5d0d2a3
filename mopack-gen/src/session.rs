//! The per-run [`Session`]: compilation-unit scope as an explicit value.
//!
//! A session owns the two tables that used to be process globals in older
//! toolkits of this shape: the ident table (every declared name and the
//! base kind it reduces to) and the processed table (records for which
//! code has been materialized), plus the diagnostics that accumulate
//! along the way. Create one per compilation unit, thread it through
//! register → elaborate → resolve, and drop it when the run ends.

use indexmap::{IndexMap, IndexSet};

use crate::diag::Diagnostic;
use crate::elem::Base;

/// Pipeline state for one compilation unit.
#[derive(Default)]
pub struct Session {
    idents: IndexMap<String, Base>,
    processed: IndexSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    /// A fresh session with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The base kind a declared name reduces to, if the name was
    /// registered in pass 1.
    pub fn ident(&self, name: &str) -> Option<Base> {
        self.idents.get(name).copied()
    }

    pub(crate) fn set_ident(&mut self, name: &str, base: Base) {
        self.idents.insert(name.to_owned(), base);
    }

    /// Whether code has been materialized for `name`.
    pub fn is_processed(&self, name: &str) -> bool {
        self.processed.contains(name)
    }

    pub(crate) fn mark_processed(&mut self, name: &str) {
        self.processed.insert(name.to_owned());
    }

    /// The diagnostics accumulated so far, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn warn(&mut self, decl: &str, field: Option<&str>, detail: impl Into<String>) {
        let diag = Diagnostic::warning(decl, field, detail);
        log::warn!("{diag}");
        self.diagnostics.push(diag);
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
