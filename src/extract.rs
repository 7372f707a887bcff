//! Signature extraction
//!
//! [`extract_routine_signature`] runs the four stages for a single routine:
//! comment normalization, header location, declaration parsing and
//! reconciliation against catalog metadata. It is pure and never fails; every
//! data problem becomes a diagnostic on the returned signature.
//!
//! [`extract_signatures`] drives a whole snapshot, in parallel for larger
//! batches.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::catalog::{CatalogSnapshot, NamePatternSet, SignatureCache};
use crate::error::SqlSigError;
use crate::model::{
    reconcile, CatalogParameter, DeclarationSet, DefaultInfoMap, DiagnosticKind, Diagnostics,
    ReconcileInput, RoutineDefinition, RoutineSignature,
};
use crate::parser::{
    extract_comment_block, locate_header, locate_return_type, parse_parameter_list,
    strip_comments, HeaderObjectKind, LocatedHeader,
};
use crate::util::snippet;
use crate::ExtractOptions;

const EXAMPLE_BLOCK_TAG: &str = "code";
const DESCRIPTION_BLOCK_TAG: &str = "help.description";

/// Minimum number of routines before extraction switches to rayon
const PARALLEL_THRESHOLD: usize = 8;

/// One selected routine with its rows, ready for extraction
struct RoutineInputs<'a> {
    routine: &'a RoutineDefinition,
    catalog: &'a [CatalogParameter],
    defaults: Option<&'a DefaultInfoMap>,
}

impl RoutineInputs<'_> {
    fn extract(&self) -> RoutineSignature {
        extract_routine_signature(self.routine, self.catalog, self.defaults)
    }

    fn fingerprint(&self) -> String {
        fingerprint_inputs(self.routine, self.catalog, self.defaults)
    }
}

/// Extract signatures for every routine of `snapshot` selected by the name
/// patterns in `options`, in snapshot order.
pub fn extract_signatures(
    snapshot: &CatalogSnapshot,
    options: &ExtractOptions,
) -> Result<Vec<RoutineSignature>> {
    let patterns = NamePatternSet::new(&options.name_patterns)?;
    ensure_unique_ids(snapshot)?;

    let parameters = snapshot.parameters_by_routine();
    let defaults = snapshot.defaults_by_routine();
    let inputs = select_inputs(snapshot, &patterns, &parameters, defaults.as_ref());

    let signatures: Vec<RoutineSignature> = if inputs.len() >= PARALLEL_THRESHOLD {
        inputs.par_iter().map(RoutineInputs::extract).collect()
    } else {
        inputs.iter().map(RoutineInputs::extract).collect()
    };

    Ok(signatures)
}

/// Like [`extract_signatures`], reusing signatures from `cache` whose inputs
/// are unchanged. `options.refresh` bypasses the cache; either way the cache
/// is updated with every signature returned.
pub fn extract_signatures_cached(
    snapshot: &CatalogSnapshot,
    options: &ExtractOptions,
    cache: &mut SignatureCache,
) -> Result<Vec<RoutineSignature>> {
    let patterns = NamePatternSet::new(&options.name_patterns)?;
    ensure_unique_ids(snapshot)?;

    let parameters = snapshot.parameters_by_routine();
    let defaults = snapshot.defaults_by_routine();
    let inputs = select_inputs(snapshot, &patterns, &parameters, defaults.as_ref());

    let lookup = |input: &RoutineInputs<'_>| -> RoutineSignature {
        let cached = if options.refresh {
            None
        } else {
            cache.get_fresh(input.routine.object_id, &input.fingerprint())
        };
        match cached {
            Some(signature) => signature.clone(),
            None => input.extract(),
        }
    };

    let signatures: Vec<RoutineSignature> = if inputs.len() >= PARALLEL_THRESHOLD {
        inputs.par_iter().map(lookup).collect()
    } else {
        inputs.iter().map(lookup).collect()
    };

    for signature in &signatures {
        cache.insert(signature.clone());
    }

    Ok(signatures)
}

fn ensure_unique_ids(snapshot: &CatalogSnapshot) -> Result<()> {
    let mut seen = HashSet::with_capacity(snapshot.routines.len());
    for routine in &snapshot.routines {
        if !seen.insert(routine.object_id) {
            return Err(SqlSigError::DuplicateRoutineId {
                object_id: routine.object_id,
            }
            .into());
        }
    }
    Ok(())
}

fn select_inputs<'a>(
    snapshot: &'a CatalogSnapshot,
    patterns: &NamePatternSet,
    parameters: &'a BTreeMap<i64, Vec<CatalogParameter>>,
    defaults: Option<&'a BTreeMap<i64, DefaultInfoMap>>,
) -> Vec<RoutineInputs<'a>> {
    snapshot
        .routines
        .iter()
        .filter(|routine| patterns.matches(routine))
        .map(|routine| RoutineInputs {
            routine,
            catalog: parameters
                .get(&routine.object_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            defaults: defaults.and_then(|d| d.get(&routine.object_id)),
        })
        .collect()
}

/// Extract the resolved signature of one routine.
///
/// `catalog` holds this routine's catalog rows (possibly empty), `defaults`
/// its pre-parsed default rows when that source is available.
pub fn extract_routine_signature(
    routine: &RoutineDefinition,
    catalog: &[CatalogParameter],
    defaults: Option<&DefaultInfoMap>,
) -> RoutineSignature {
    let qualified_name = routine.qualified_name();
    let mut diagnostics = Diagnostics::new(qualified_name.as_str());
    let fingerprint = fingerprint_inputs(routine, catalog, defaults);

    let mut declarations = DeclarationSet::new();
    let mut return_type = None;
    let mut embedded_example = None;
    let mut embedded_description = None;

    match routine.definition.as_deref().filter(|d| !d.trim().is_empty()) {
        None => {
            diagnostics.info(
                DiagnosticKind::MissingDefinition,
                "definition text unavailable; using catalog metadata only",
            );
        }
        Some(definition) => {
            embedded_example = extract_comment_block(definition, EXAMPLE_BLOCK_TAG);
            embedded_description = extract_comment_block(definition, DESCRIPTION_BLOCK_TAG);

            let normalized = strip_comments(definition);
            debug!(
                routine = %qualified_name,
                chars = normalized.len(),
                "comments stripped"
            );

            match locate_header(&normalized) {
                None => {
                    diagnostics.warning(
                        DiagnosticKind::HeaderNotLocated,
                        format!(
                            "no CREATE/ALTER header found near '{}'",
                            snippet(&normalized, 60)
                        ),
                    );
                }
                Some(header) => {
                    debug!(
                        routine = %qualified_name,
                        header_name = %header.name,
                        list = %snippet(&header.parameter_list, 80),
                        "header located"
                    );
                    if !header.balanced {
                        diagnostics.warning(
                            DiagnosticKind::UnbalancedParentheses,
                            "parameter list opens with '(' that is never closed",
                        );
                    }
                    check_header_identity(routine, &header, &mut diagnostics);

                    declarations = parse_parameter_list(&header.parameter_list, &mut diagnostics);
                    debug!(
                        routine = %qualified_name,
                        declarations = declarations.len(),
                        "declarations parsed"
                    );
                }
            }

            if routine.kind.is_function() {
                return_type = locate_return_type(&normalized);
            }
        }
    }

    let parameters = reconcile(
        ReconcileInput {
            routine,
            catalog,
            defaults,
            declarations: &declarations,
            return_type: return_type.as_deref(),
        },
        &mut diagnostics,
    );
    debug!(
        routine = %qualified_name,
        parameters = parameters.len(),
        diagnostics = diagnostics.len(),
        "signature resolved"
    );

    RoutineSignature {
        object_id: routine.object_id,
        schema: routine.schema.clone(),
        name: routine.name.clone(),
        kind: routine.kind,
        parameters,
        diagnostics: diagnostics.into_vec(),
        embedded_example,
        embedded_description,
        fingerprint,
    }
}

/// Compare the header's name, schema and object kind with the catalog's.
///
/// A mismatch usually means the routine was renamed or recreated after its
/// text was written; the declarations are still used.
fn check_header_identity(
    routine: &RoutineDefinition,
    header: &LocatedHeader,
    diagnostics: &mut Diagnostics,
) {
    let schema_differs = header
        .schema
        .as_deref()
        .is_some_and(|schema| !schema.eq_ignore_ascii_case(&routine.schema));
    if schema_differs || !header.name.eq_ignore_ascii_case(&routine.name) {
        let declared = match &header.schema {
            Some(schema) => format!("{}.{}", schema, header.name),
            None => header.name.clone(),
        };
        diagnostics.info(
            DiagnosticKind::HeaderNameMismatch,
            format!(
                "header declares '{}' but the routine is '{}'",
                declared,
                routine.qualified_name()
            ),
        );
    }

    let header_is_function = header.object_kind == HeaderObjectKind::Function;
    if header_is_function != routine.kind.is_function() {
        diagnostics.info(
            DiagnosticKind::HeaderKindMismatch,
            format!(
                "header declares a {} but the catalog lists {}",
                if header_is_function { "function" } else { "procedure" },
                routine.kind.type_code()
            ),
        );
    }
}

/// SHA-256 over everything that influences a routine's signature, as upper
/// case hex.
pub fn fingerprint_inputs(
    routine: &RoutineDefinition,
    catalog: &[CatalogParameter],
    defaults: Option<&DefaultInfoMap>,
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(routine.object_id.to_le_bytes());
    hash_field(&mut hasher, &routine.schema);
    hash_field(&mut hasher, &routine.name);
    hash_field(&mut hasher, routine.kind.type_code());
    match &routine.definition {
        Some(definition) => {
            hasher.update([1u8]);
            hash_field(&mut hasher, definition);
        }
        None => hasher.update([0u8]),
    }

    for row in catalog {
        hash_field(&mut hasher, &row.name);
        hash_field(&mut hasher, &row.system_type);
        hasher.update(row.max_length.to_le_bytes());
        hasher.update([row.precision, row.scale, u8::from(row.is_output)]);
        hasher.update(row.ordinal.to_le_bytes());
    }

    match defaults {
        Some(defaults) => {
            hasher.update([1u8]);
            for info in defaults.iter() {
                hash_field(&mut hasher, &info.parameter_name);
                hasher.update([u8::from(info.is_optional)]);
                hash_field(&mut hasher, info.default_value.as_deref().unwrap_or(""));
            }
        }
        None => hasher.update([0u8]),
    }

    format!("{:X}", hasher.finalize())
}

fn hash_field(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0u8]);
}
