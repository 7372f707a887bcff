//! Common test utilities for rust-sqlsig tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rust_sqlsig::catalog::CatalogSnapshot;
use rust_sqlsig::model::{CatalogParameter, DefaultInfo, RoutineDefinition, RoutineKind};
use rust_sqlsig::{ExtractOptions, InspectOptions};

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Write `snapshot` as JSON and return its path
    pub fn write_snapshot(&self, snapshot: &CatalogSnapshot) -> PathBuf {
        let path = self.dir.join("snapshot.json");
        let json = serde_json::to_string_pretty(snapshot).expect("Failed to serialize snapshot");
        std::fs::write(&path, json).expect("Failed to write snapshot");
        path
    }

    /// Write raw snapshot text and return its path
    pub fn write_raw_snapshot(&self, content: &str) -> PathBuf {
        let path = self.dir.join("raw_snapshot.json");
        std::fs::write(&path, content).expect("Failed to write snapshot");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Inspect options writing to `output.json` inside the context
    pub fn inspect_options(&self, snapshot_path: &Path) -> InspectOptions {
        InspectOptions {
            snapshot_path: snapshot_path.to_path_buf(),
            output_path: Some(self.path("output.json")),
            routine: None,
            cache_path: None,
            extract: ExtractOptions::default(),
        }
    }
}

pub fn procedure(object_id: i64, name: &str, definition: &str) -> RoutineDefinition {
    routine(object_id, "dbo", name, RoutineKind::Procedure, Some(definition))
}

pub fn scalar_function(object_id: i64, name: &str, definition: &str) -> RoutineDefinition {
    routine(object_id, "dbo", name, RoutineKind::ScalarFunction, Some(definition))
}

pub fn routine(
    object_id: i64,
    schema: &str,
    name: &str,
    kind: RoutineKind,
    definition: Option<&str>,
) -> RoutineDefinition {
    RoutineDefinition {
        object_id,
        schema: schema.to_string(),
        name: name.to_string(),
        kind,
        definition: definition.map(str::to_string),
    }
}

/// Catalog row with plausible size fields for common system types
pub fn param(object_id: i64, name: &str, system_type: &str, ordinal: i32) -> CatalogParameter {
    let (max_length, precision, scale) = match system_type {
        "int" => (4, 10, 0),
        "bigint" => (8, 19, 0),
        "bit" => (1, 1, 0),
        "decimal" => (9, 18, 2),
        "nvarchar" => (100, 0, 0),
        "varchar" => (50, 0, 0),
        "datetime" => (8, 23, 3),
        _ => (0, 0, 0),
    };
    CatalogParameter {
        object_id,
        name: name.to_string(),
        system_type: system_type.to_string(),
        max_length,
        precision,
        scale,
        is_output: false,
        ordinal,
    }
}

pub fn output_param(
    object_id: i64,
    name: &str,
    system_type: &str,
    ordinal: i32,
) -> CatalogParameter {
    CatalogParameter {
        is_output: true,
        ..param(object_id, name, system_type, ordinal)
    }
}

pub fn default_info(object_id: i64, name: &str, value: Option<&str>) -> DefaultInfo {
    DefaultInfo {
        object_id,
        parameter_name: name.to_string(),
        is_optional: value.is_some(),
        default_value: value.map(str::to_string),
    }
}

/// Options selecting every routine
pub fn all_routines() -> ExtractOptions {
    ExtractOptions::default()
}

/// Options selecting routines by `LIKE` patterns
pub fn matching(patterns: &[&str]) -> ExtractOptions {
    ExtractOptions {
        name_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        ..ExtractOptions::default()
    }
}
