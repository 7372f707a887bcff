//! Unit tests for signature resolution
//!
//! These tests drive single routines through `extract_routine_signature` and
//! check how text, catalog rows and default rows are merged.

use pretty_assertions::assert_eq;

use rust_sqlsig::extract_routine_signature;
use rust_sqlsig::model::{
    CatalogParameter, DefaultInfo, DefaultInfoMap, DiagnosticKind, RoutineDefinition, RoutineKind,
    Severity, SizeSpec, SourceFlag, RETURN_VALUE_NAME,
};

fn procedure(definition: Option<&str>) -> RoutineDefinition {
    RoutineDefinition {
        object_id: 100,
        schema: "dbo".to_string(),
        name: "usp_Orders".to_string(),
        kind: RoutineKind::Procedure,
        definition: definition.map(str::to_string),
    }
}

fn row(name: &str, system_type: &str, max_length: i32, ordinal: i32) -> CatalogParameter {
    CatalogParameter {
        object_id: 100,
        name: name.to_string(),
        system_type: system_type.to_string(),
        max_length,
        precision: 0,
        scale: 0,
        is_output: false,
        ordinal,
    }
}

fn kinds(signature: &rust_sqlsig::model::RoutineSignature) -> Vec<DiagnosticKind> {
    signature.diagnostics.iter().map(|d| d.kind).collect()
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_catalog_type_and_size_win() {
    // Text was edited after deployment; the catalog reflects what is compiled
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @Code varchar(10), @Qty smallint AS SELECT 1",
    ));
    let catalog = vec![row("@Code", "nvarchar", 40, 1), row("@Qty", "int", 4, 2)];

    let signature = extract_routine_signature(&routine, &catalog, None);
    let code = signature.parameter("@code").unwrap();
    assert_eq!(code.type_from_catalog.as_deref(), Some("nvarchar"));
    assert_eq!(code.type_from_text.as_deref(), Some("varchar(10)"));
    assert_eq!(code.max_length, Some(40));
    assert_eq!(code.declared_size, Some(SizeSpec::Length(10)));
    assert_eq!(code.ordinal, 1);
    assert_eq!(code.source, SourceFlag::Both);
}

#[test]
fn test_output_flag_comes_from_catalog() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @Total money OUTPUT AS SELECT 1",
    ));
    let signature = extract_routine_signature(&routine, &[row("@Total", "money", 8, 1)], None);

    assert!(!signature.parameters[0].is_output);
    assert_eq!(kinds(&signature), vec![DiagnosticKind::OutputFlagMismatch]);
    assert_eq!(signature.diagnostics[0].severity, Severity::Info);
}

#[test]
fn test_catalog_order_decides_positions() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @b int, @a int AS SELECT 1",
    ));
    let catalog = vec![row("@b", "int", 4, 2), row("@a", "int", 4, 1)];
    let signature = extract_routine_signature(&routine, &catalog, None);

    let names: Vec<&str> = signature.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@a", "@b"]);
}

#[test]
fn test_default_rows_override_text() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @PageSize int = 50, @Page int = 1 AS SELECT 1",
    ));
    let catalog = vec![row("@PageSize", "int", 4, 1), row("@Page", "int", 4, 2)];
    let defaults: DefaultInfoMap = vec![
        DefaultInfo {
            object_id: 100,
            parameter_name: "@PageSize".to_string(),
            is_optional: true,
            default_value: Some("25".to_string()),
        },
        DefaultInfo {
            object_id: 100,
            parameter_name: "@Page".to_string(),
            is_optional: false,
            default_value: None,
        },
    ]
    .into_iter()
    .collect();

    let signature = extract_routine_signature(&routine, &catalog, Some(&defaults));
    let page_size = signature.parameter("@PageSize").unwrap();
    assert_eq!(page_size.default_value.as_deref(), Some("25"));
    assert!(page_size.has_default);

    let page = signature.parameter("@Page").unwrap();
    assert_eq!(page.default_value, None);
    assert!(!page.has_default);
}

// ============================================================================
// Text-only and catalog-only parameters
// ============================================================================

#[test]
fn test_text_only_parameter_follows_catalog() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @a int, @added bit = 0, @b int AS SELECT 1",
    ));
    let catalog = vec![row("@a", "int", 4, 1), row("@b", "int", 4, 2)];
    let signature = extract_routine_signature(&routine, &catalog, None);

    assert_eq!(signature.parameters.len(), 3);
    let added = signature.parameter("@added").unwrap();
    assert_eq!(added.source, SourceFlag::TextOnly);
    assert_eq!(added.ordinal, 3);
    assert_eq!(added.type_from_catalog, None);
    assert_eq!(added.max_length, None);
    assert!(added.has_default);
    assert_eq!(kinds(&signature), vec![DiagnosticKind::TextOnlyParameter]);
}

#[test]
fn test_catalog_only_parameter_is_kept() {
    let routine = procedure(Some("CREATE PROCEDURE dbo.usp_Orders @a int AS SELECT 1"));
    let catalog = vec![row("@a", "int", 4, 1), row("@hidden", "int", 4, 2)];
    let signature = extract_routine_signature(&routine, &catalog, None);

    let hidden = signature.parameter("@hidden").unwrap();
    assert_eq!(hidden.source, SourceFlag::Catalog);
    assert_eq!(hidden.type_from_text, None);
    assert_eq!(hidden.declaration_text, None);
}

#[test]
fn test_text_alone_when_catalog_is_empty() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @x int, @y nvarchar(20) = N'none' OUTPUT AS SELECT 1",
    ));
    let signature = extract_routine_signature(&routine, &[], None);

    assert!(signature.diagnostics.is_empty());
    let ordinals: Vec<i32> = signature.parameters.iter().map(|p| p.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2]);
    assert!(signature.parameters[1].is_output);
    assert_eq!(signature.parameters[1].default_value.as_deref(), Some("N'none'"));
}

// ============================================================================
// Degenerate inputs
// ============================================================================

#[test]
fn test_empty_parameter_list() {
    let routine = procedure(Some("CREATE PROCEDURE dbo.usp_Orders AS SELECT 1"));
    let signature = extract_routine_signature(&routine, &[], None);
    assert!(signature.parameters.is_empty());
    assert!(signature.diagnostics.is_empty());
}

#[test]
fn test_absent_definition_is_informational_only() {
    let routine = procedure(None);
    let signature = extract_routine_signature(&routine, &[], None);
    assert!(signature.parameters.is_empty());
    assert_eq!(signature.diagnostics.len(), 1);
    assert_eq!(signature.diagnostics[0].severity, Severity::Info);
}

#[test]
fn test_malformed_fragment_yields_exactly_one_diagnostic() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders @a int, @b date, @oops, @c money AS SELECT 1",
    ));
    let signature = extract_routine_signature(&routine, &[], None);

    let names: Vec<&str> = signature.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@a", "@b", "@c"]);
    assert_eq!(kinds(&signature), vec![DiagnosticKind::MalformedDeclaration]);
    assert!(signature.diagnostics[0].message.contains("@oops"));
    assert_eq!(signature.diagnostics[0].routine, "dbo.usp_Orders");
}

#[test]
fn test_repeated_extraction_is_identical() {
    let routine = procedure(Some(
        "CREATE PROCEDURE dbo.usp_Orders (@a int = 1, @a int = 2, @b varchar(3) = 'x AS', @c = 1) AS SELECT 1",
    ));
    let catalog = vec![row("@a", "int", 4, 1), row("@z", "int", 4, 2)];
    let first = extract_routine_signature(&routine, &catalog, None);
    let second = extract_routine_signature(&routine, &catalog, None);
    assert_eq!(first, second);
    assert!(!first.diagnostics.is_empty());
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_inline_function_reports_table_return() {
    let routine = RoutineDefinition {
        object_id: 100,
        schema: "dbo".to_string(),
        name: "fn_Orders".to_string(),
        kind: RoutineKind::InlineTableFunction,
        definition: Some(
            "CREATE FUNCTION dbo.fn_Orders(@since date) RETURNS TABLE AS RETURN (SELECT 1 AS x)"
                .to_string(),
        ),
    };
    let catalog = vec![row("", "table type", 0, 0), row("@since", "date", 3, 1)];
    let signature = extract_routine_signature(&routine, &catalog, None);

    assert_eq!(signature.parameters.len(), 2);
    let ret = &signature.parameters[0];
    assert_eq!(ret.name, RETURN_VALUE_NAME);
    assert_eq!(ret.type_from_text.as_deref(), Some("TABLE"));
    assert!(ret.is_output);
    assert!(!ret.has_default);

    let required: Vec<&str> = signature
        .required_parameters()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(required, vec!["@since"]);
}
