//! Multi-source parameter reconciliation
//!
//! Merges three views of a routine's parameters into one list:
//!
//! | Field                                  | Authority                                   |
//! |----------------------------------------|---------------------------------------------|
//! | existence, ordinal, type, size, output | catalog row; text only when no rows at all  |
//! | default literal, has-default           | default row; otherwise the text default     |
//! | readonly                               | text                                        |
//!
//! Catalog parameters come first in ordinal order. Parameters found only in the
//! text follow, numbered above the highest catalog ordinal. For functions the
//! ordinal-0 catalog row is the return value and is never matched against an
//! `@` declaration.

use std::collections::HashSet;

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::elements::{
    CatalogParameter, DeclarationSet, DefaultInfo, DefaultInfoMap, ParameterDeclaration,
    ResolvedParameter, RoutineDefinition, SourceFlag, RETURN_VALUE_NAME,
};
use crate::parser::identifier_utils::parameter_key;

/// Inputs for reconciling one routine
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub routine: &'a RoutineDefinition,
    /// Catalog rows of this routine, in any order
    pub catalog: &'a [CatalogParameter],
    /// Pre-parsed defaults of this routine, when that source is available
    pub defaults: Option<&'a DefaultInfoMap>,
    /// Declarations recovered from the definition text
    pub declarations: &'a DeclarationSet,
    /// Return type recovered from a `RETURNS` clause
    pub return_type: Option<&'a str>,
}

/// Merge catalog rows, default rows and text declarations into the final,
/// ordinal-ordered parameter list.
pub fn reconcile(
    input: ReconcileInput<'_>,
    diagnostics: &mut Diagnostics,
) -> Vec<ResolvedParameter> {
    let is_function = input.routine.kind.is_function();

    let mut rows: Vec<&CatalogParameter> = input.catalog.iter().collect();
    rows.sort_by_key(|row| row.ordinal);

    let mut resolved = Vec::with_capacity(rows.len() + input.declarations.len());
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        if is_function && row.ordinal == 0 {
            resolved.push(resolve_return_value(row, input.return_type));
            continue;
        }

        if !seen.insert(parameter_key(&row.name)) {
            diagnostics.warning(
                DiagnosticKind::DuplicateCatalogParameter,
                format!(
                    "catalog lists {} more than once; ordinal {} ignored",
                    row.name, row.ordinal
                ),
            );
            continue;
        }

        let declaration = input.declarations.get(&row.name);
        if let Some(declaration) = declaration {
            if declaration.is_output && !row.is_output {
                diagnostics.info(
                    DiagnosticKind::OutputFlagMismatch,
                    format!(
                        "{} is declared OUTPUT in text but not in the catalog",
                        row.name
                    ),
                );
            }
        }
        let default_info = input.defaults.and_then(|d| d.get(&row.name));
        resolved.push(resolve_catalog_parameter(row, declaration, default_info));
    }

    let catalog_present = !input.catalog.is_empty();
    let mut next_ordinal = input
        .catalog
        .iter()
        .map(|row| row.ordinal)
        .max()
        .unwrap_or(0)
        .max(0)
        + 1;

    for declaration in input.declarations.iter() {
        if !seen.insert(parameter_key(&declaration.name)) {
            continue;
        }
        if catalog_present {
            diagnostics.info(
                DiagnosticKind::TextOnlyParameter,
                format!(
                    "{} is declared in text but missing from the catalog",
                    declaration.name
                ),
            );
        }
        let default_info = input.defaults.and_then(|d| d.get(&declaration.name));
        resolved.push(resolve_text_parameter(declaration, default_info, next_ordinal));
        next_ordinal += 1;
    }

    resolved
}

fn resolve_return_value(row: &CatalogParameter, return_type: Option<&str>) -> ResolvedParameter {
    ResolvedParameter {
        name: RETURN_VALUE_NAME.to_string(),
        type_from_catalog: Some(row.system_type.clone()),
        type_from_text: Some(
            return_type
                .map(str::to_string)
                .unwrap_or_else(|| row.system_type.clone()),
        ),
        max_length: Some(row.max_length),
        precision: Some(row.precision),
        scale: Some(row.scale),
        declared_size: None,
        is_output: true,
        is_readonly: false,
        default_value: None,
        has_default: false,
        ordinal: 0,
        source: if return_type.is_some() {
            SourceFlag::Both
        } else {
            SourceFlag::Catalog
        },
        declaration_text: None,
    }
}

fn resolve_catalog_parameter(
    row: &CatalogParameter,
    declaration: Option<&ParameterDeclaration>,
    default_info: Option<&DefaultInfo>,
) -> ResolvedParameter {
    let (default_value, has_default) = resolve_default(declaration, default_info);
    ResolvedParameter {
        name: row.name.clone(),
        type_from_catalog: Some(row.system_type.clone()),
        type_from_text: declaration.map(|d| d.type_text.clone()),
        max_length: Some(row.max_length),
        precision: Some(row.precision),
        scale: Some(row.scale),
        declared_size: declaration.and_then(|d| d.size),
        is_output: row.is_output,
        is_readonly: declaration.is_some_and(|d| d.is_readonly),
        default_value,
        has_default,
        ordinal: row.ordinal,
        source: if declaration.is_some() {
            SourceFlag::Both
        } else {
            SourceFlag::Catalog
        },
        declaration_text: declaration.map(|d| d.raw_text.clone()),
    }
}

fn resolve_text_parameter(
    declaration: &ParameterDeclaration,
    default_info: Option<&DefaultInfo>,
    ordinal: i32,
) -> ResolvedParameter {
    let (default_value, has_default) = resolve_default(Some(declaration), default_info);
    ResolvedParameter {
        name: declaration.name.clone(),
        type_from_catalog: None,
        type_from_text: Some(declaration.type_text.clone()),
        max_length: None,
        precision: None,
        scale: None,
        declared_size: declaration.size,
        is_output: declaration.is_output,
        is_readonly: declaration.is_readonly,
        default_value,
        has_default,
        ordinal,
        source: SourceFlag::TextOnly,
        declaration_text: Some(declaration.raw_text.clone()),
    }
}

/// Default row first, text default second.
fn resolve_default(
    declaration: Option<&ParameterDeclaration>,
    default_info: Option<&DefaultInfo>,
) -> (Option<String>, bool) {
    match default_info {
        Some(info) => (info.default_value.clone(), info.is_optional),
        None => {
            let value = declaration.and_then(|d| d.default_value.clone());
            let has_default = value.is_some();
            (value, has_default)
        }
    }
}
