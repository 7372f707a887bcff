//! rust-sqlsig: T-SQL routine signature extraction
//!
//! This library recovers the parameter signatures of SQL Server stored
//! procedures and functions by reading their definition text and reconciling
//! what it finds with the catalog's parameter metadata and pre-parsed
//! default information.

pub mod catalog;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod util;

use std::path::PathBuf;

use anyhow::Result;

pub use error::SqlSigError;
pub use extract::{
    extract_routine_signature, extract_signatures, extract_signatures_cached, fingerprint_inputs,
};

/// Options for extracting a batch of signatures
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// SQL `LIKE` patterns selecting routines by name; empty selects all
    pub name_patterns: Vec<String>,
    /// Ignore cached signatures and extract everything again
    pub refresh: bool,
    /// Enable verbose output
    pub verbose: bool,
}

/// Options for inspecting a catalog snapshot
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Path to the JSON catalog snapshot
    pub snapshot_path: PathBuf,
    /// Output path for the signatures (stdout when not set)
    pub output_path: Option<PathBuf>,
    /// Only report the routine with this name (`name` or `schema.name`)
    pub routine: Option<String>,
    /// Signature cache file reused between runs
    pub cache_path: Option<PathBuf>,
    pub extract: ExtractOptions,
}

/// Extract and write the signatures of a catalog snapshot
pub fn inspect_snapshot(options: InspectOptions) -> Result<Vec<model::RoutineSignature>> {
    let verbose = options.extract.verbose;
    if verbose {
        eprintln!("Loading snapshot: {}", options.snapshot_path.display());
    }

    // Step 1: Load the snapshot
    let snapshot = catalog::load_snapshot(&options.snapshot_path)?;

    if verbose {
        eprintln!(
            "Found {} routines, {} parameter rows, {}",
            snapshot.routines.len(),
            snapshot.parameters.len(),
            match &snapshot.defaults {
                Some(defaults) => format!("{} default rows", defaults.len()),
                None => "no default source".to_string(),
            }
        );
    }

    // Step 2: Extract, through the cache when one is configured
    let mut signatures = match &options.cache_path {
        Some(cache_path) => {
            let mut cache = catalog::load_cache(cache_path)?;
            if verbose {
                eprintln!("Loaded {} cached signatures", cache.len());
            }
            let signatures =
                extract::extract_signatures_cached(&snapshot, &options.extract, &mut cache)?;
            catalog::save_cache(&cache, cache_path)?;
            signatures
        }
        None => extract::extract_signatures(&snapshot, &options.extract)?,
    };

    // Step 3: Narrow to a single routine if requested
    if let Some(routine) = &options.routine {
        signatures.retain(|s| routine_name_matches(routine, &s.schema, &s.name));
        if signatures.is_empty() {
            return Err(SqlSigError::RoutineNotFound {
                name: routine.clone(),
            }
            .into());
        }
    }

    if verbose {
        let with_diagnostics = signatures
            .iter()
            .filter(|s| !s.diagnostics.is_empty())
            .count();
        eprintln!(
            "Extracted {} signatures ({} with diagnostics)",
            signatures.len(),
            with_diagnostics
        );
        for diagnostic in signatures.iter().flat_map(|s| &s.diagnostics) {
            eprintln!("  {}", diagnostic);
        }
    }

    // Step 4: Write the signatures
    catalog::write_signatures(&signatures, options.output_path.as_deref())?;

    if verbose {
        if let Some(output_path) = &options.output_path {
            eprintln!("Wrote signatures: {}", output_path.display());
        }
    }

    Ok(signatures)
}

/// Match `name` or `schema.name` (brackets optional) against a routine.
fn routine_name_matches(requested: &str, schema: &str, name: &str) -> bool {
    let cleaned: String = requested
        .trim()
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .collect();
    match cleaned.split_once('.') {
        Some((s, n)) => s.eq_ignore_ascii_case(schema) && n.eq_ignore_ascii_case(name),
        None => cleaned.eq_ignore_ascii_case(name),
    }
}
