//! Routine signature model and reconciliation

mod diagnostics;
mod elements;
mod reconciler;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use elements::*;
pub use reconciler::{reconcile, ReconcileInput};
