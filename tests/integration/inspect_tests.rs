//! End-to-end tests for snapshot inspection
//!
//! Snapshot files are written to a temp directory, inspected through
//! `inspect_snapshot` and the written JSON is read back.

use pretty_assertions::assert_eq;

use rust_sqlsig::catalog::CatalogSnapshot;
use rust_sqlsig::model::RoutineSignature;
use rust_sqlsig::{inspect_snapshot, SqlSigError};

use crate::common::{param, procedure, TestContext};

fn snapshot() -> CatalogSnapshot {
    CatalogSnapshot {
        routines: vec![
            procedure(
                10,
                "usp_GetCustomer",
                "/* help.description\nReturns one customer.\n*/\nCREATE PROCEDURE [dbo].[usp_GetCustomer]\n    @CustomerId INT\nAS\nSELECT 1",
            ),
            procedure(
                11,
                "usp_SaveCustomer",
                "CREATE PROCEDURE dbo.usp_SaveCustomer @CustomerId INT, @Name NVARCHAR(100) = N'' AS SELECT 1",
            ),
        ],
        parameters: vec![
            param(10, "@CustomerId", "int", 1),
            param(11, "@CustomerId", "int", 1),
            param(11, "@Name", "nvarchar", 2),
        ],
        defaults: Some(Vec::new()),
    }
}

fn read_output(ctx: &TestContext) -> Vec<RoutineSignature> {
    let json = std::fs::read_to_string(ctx.path("output.json")).expect("output should exist");
    serde_json::from_str(&json).expect("output should be valid JSON")
}

#[test]
fn test_inspect_writes_signatures() {
    let ctx = TestContext::new();
    let snapshot_path = ctx.write_snapshot(&snapshot());

    let returned = inspect_snapshot(ctx.inspect_options(&snapshot_path)).unwrap();
    let written = read_output(&ctx);
    assert_eq!(written, returned);
    assert_eq!(written.len(), 2);

    assert_eq!(
        written[0].embedded_description.as_deref(),
        Some("Returns one customer.")
    );
    assert_eq!(
        written[1].parameter("@Name").unwrap().default_value.as_deref(),
        Some("N''")
    );
}

#[test]
fn test_inspect_single_routine() {
    let ctx = TestContext::new();
    let snapshot_path = ctx.write_snapshot(&snapshot());

    let mut options = ctx.inspect_options(&snapshot_path);
    options.routine = Some("[dbo].[usp_SaveCustomer]".to_string());
    let signatures = inspect_snapshot(options).unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0].object_id, 11);
}

#[test]
fn test_inspect_unknown_routine_fails() {
    let ctx = TestContext::new();
    let snapshot_path = ctx.write_snapshot(&snapshot());

    let mut options = ctx.inspect_options(&snapshot_path);
    options.routine = Some("usp_Missing".to_string());
    let err = inspect_snapshot(options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SqlSigError>(),
        Some(SqlSigError::RoutineNotFound { .. })
    ));
    assert!(!ctx.path("output.json").exists());
}

#[test]
fn test_inspect_reads_catalog_column_names() {
    let ctx = TestContext::new();
    let snapshot_path = ctx.write_raw_snapshot(
        r#"{
  "routines": [
    {
      "ObjectId": 7,
      "SchemaName": "dbo",
      "ObjectName": "HasRole",
      "ObjectTypeShort": "FN",
      "DefinitionText": "CREATE FUNCTION dbo.HasRole(@Role sysname) RETURNS bit AS BEGIN RETURN 1 END"
    }
  ],
  "parameters": [
    {"object_id": 7, "ParameterNameSys": "", "SystemType": "bit", "MaxLengthBytes": 1,
     "Precision": 1, "Scale": 0, "IsOutputSys": true, "ParameterOrder": 0},
    {"object_id": 7, "ParameterNameSys": "@Role", "SystemType": "nvarchar", "MaxLengthBytes": 256,
     "Precision": 0, "Scale": 0, "IsOutputSys": false, "ParameterOrder": 1}
  ]
}"#,
    );

    let signatures = inspect_snapshot(ctx.inspect_options(&snapshot_path)).unwrap();
    let has_role = &signatures[0];
    assert_eq!(has_role.parameters.len(), 2);
    assert!(has_role.parameters[0].is_return_value());
    assert_eq!(has_role.parameters[0].type_from_text.as_deref(), Some("bit"));

    let role = &has_role.parameters[1];
    assert_eq!(role.type_from_catalog.as_deref(), Some("nvarchar"));
    assert_eq!(role.type_from_text.as_deref(), Some("sysname"));
    assert_eq!(role.max_length, Some(256));
}

#[test]
fn test_inspect_missing_snapshot_fails() {
    let ctx = TestContext::new();
    let err = inspect_snapshot(ctx.inspect_options(&ctx.path("absent.json"))).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SqlSigError>(),
        Some(SqlSigError::SnapshotReadError { .. })
    ));
}

#[test]
fn test_inspect_cache_file_is_written_and_reused() {
    let ctx = TestContext::new();
    let snapshot_path = ctx.write_snapshot(&snapshot());
    let cache_path = ctx.path("cache").join("signatures.json");

    let mut options = ctx.inspect_options(&snapshot_path);
    options.cache_path = Some(cache_path.clone());
    let first = inspect_snapshot(options.clone()).unwrap();
    assert!(cache_path.exists());

    // Tamper with the cached copy; an unchanged routine is served from it
    let mut cached: Vec<RoutineSignature> =
        serde_json::from_str(&std::fs::read_to_string(&cache_path).unwrap()).unwrap();
    cached[0].embedded_example = Some("cached".to_string());
    std::fs::write(&cache_path, serde_json::to_string(&cached).unwrap()).unwrap();

    let second = inspect_snapshot(options.clone()).unwrap();
    assert_eq!(second[0].embedded_example.as_deref(), Some("cached"));

    options.extract.refresh = true;
    let refreshed = inspect_snapshot(options).unwrap();
    assert_eq!(refreshed, first);
}
