//! Structured diagnostics from ingest and resolution.
//!
//! Warnings never abort a run; they accumulate on the session and are also
//! emitted through `log`. Fatal configuration errors (reserved or duplicate
//! extension ids) live in the codec crate and fail fast there.

use core::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The declaration or field was skipped or adjusted; the run continues.
    Warning,
    /// The run cannot produce output for this declaration.
    Error,
}

/// One diagnostic: the declaration it concerns, the field if any, and a
/// one-line classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Warning or error.
    pub severity: Severity,
    /// The declaration being processed.
    pub decl: String,
    /// The field within the declaration, when field-scoped.
    pub field: Option<String>,
    /// A one-line classification of what happened.
    pub detail: String,
}

impl Diagnostic {
    /// A field- or declaration-scoped warning.
    pub fn warning(decl: &str, field: Option<&str>, detail: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            decl: decl.to_owned(),
            field: field.map(str::to_owned),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.field {
            Some(field) => write!(f, "{severity}: {}.{field}: {}", self.decl, self.detail),
            None => write!(f, "{severity}: {}: {}", self.decl, self.detail),
        }
    }
}
