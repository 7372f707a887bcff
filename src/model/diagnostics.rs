//! Per-routine diagnostics
//!
//! Data-quality problems in a routine's text or metadata never interrupt
//! extraction. They are collected here, attached to the routine's signature and
//! echoed through `tracing` for verbose runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The routine has no definition text
    MissingDefinition,
    /// No CREATE/ALTER header was found in the text
    HeaderNotLocated,
    /// The header's name or schema differs from the catalog's (renamed routine)
    HeaderNameMismatch,
    /// The header declares a procedure for a function or the reverse
    HeaderKindMismatch,
    /// The parameter list opened with `(` that never closed
    UnbalancedParentheses,
    /// A declaration fragment could not be parsed and was skipped
    MalformedDeclaration,
    /// The text declares the same parameter name twice
    DuplicateDeclaration,
    /// The catalog lists the same parameter name twice
    DuplicateCatalogParameter,
    /// Text declares OUTPUT but the catalog does not
    OutputFlagMismatch,
    /// Text declares a parameter the catalog does not know
    TextOnlyParameter,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingDefinition => "missing definition",
            DiagnosticKind::HeaderNotLocated => "header not located",
            DiagnosticKind::HeaderNameMismatch => "header name mismatch",
            DiagnosticKind::HeaderKindMismatch => "header kind mismatch",
            DiagnosticKind::UnbalancedParentheses => "unbalanced parentheses",
            DiagnosticKind::MalformedDeclaration => "malformed declaration",
            DiagnosticKind::DuplicateDeclaration => "duplicate declaration",
            DiagnosticKind::DuplicateCatalogParameter => "duplicate catalog parameter",
            DiagnosticKind::OutputFlagMismatch => "output flag mismatch",
            DiagnosticKind::TextOnlyParameter => "text-only parameter",
        };
        f.write_str(name)
    }
}

/// One diagnostic for one routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    /// `schema.name` of the routine
    pub routine: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}] {}: {}", severity, self.kind, self.routine, self.message)
    }
}

/// Collector for the diagnostics of a single routine
#[derive(Debug)]
pub struct Diagnostics {
    routine: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(routine: impl Into<String>) -> Self {
        Self {
            routine: routine.into(),
            entries: Vec::new(),
        }
    }

    pub fn info(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Info, kind, message.into());
    }

    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message.into());
    }

    fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: String) {
        match severity {
            Severity::Info => debug!(routine = %self.routine, %kind, "{}", message),
            Severity::Warning => warn!(routine = %self.routine, %kind, "{}", message),
        }
        self.entries.push(Diagnostic {
            severity,
            kind,
            message,
            routine: self.routine.clone(),
        });
    }

    pub fn routine(&self) -> &str {
        &self.routine
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
