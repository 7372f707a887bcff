//! Routine and parameter model types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostic;
use crate::parser::identifier_utils::parameter_key;

/// Display name of the return-value pseudo-parameter of a function
pub const RETURN_VALUE_NAME: &str = "[Return Value]";

/// Kind of routine, as recorded by the catalog (`sys.objects.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutineKind {
    #[serde(alias = "P", alias = "SQL_STORED_PROCEDURE")]
    Procedure,
    #[serde(alias = "FN", alias = "SQL_SCALAR_FUNCTION")]
    ScalarFunction,
    #[serde(alias = "IF", alias = "SQL_INLINE_TABLE_VALUED_FUNCTION")]
    InlineTableFunction,
    #[serde(alias = "TF", alias = "SQL_TABLE_VALUED_FUNCTION")]
    TableFunction,
}

impl RoutineKind {
    /// Functions reserve ordinal 0 for their return value.
    pub fn is_function(&self) -> bool {
        !matches!(self, RoutineKind::Procedure)
    }

    /// Catalog type code (`P`, `FN`, `IF`, `TF`)
    pub fn type_code(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "P",
            RoutineKind::ScalarFunction => "FN",
            RoutineKind::InlineTableFunction => "IF",
            RoutineKind::TableFunction => "TF",
        }
    }
}

/// A procedure or function whose signature is extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineDefinition {
    /// Catalog object id; keys catalog and default rows to this routine
    #[serde(alias = "ObjectId")]
    pub object_id: i64,
    #[serde(alias = "SchemaName")]
    pub schema: String,
    #[serde(alias = "ObjectName")]
    pub name: String,
    #[serde(alias = "ObjectTypeShort")]
    pub kind: RoutineKind,
    /// Full `CREATE ...` text; absent for encrypted or inaccessible modules
    #[serde(default, alias = "DefinitionText")]
    pub definition: Option<String>,
}

impl RoutineDefinition {
    /// Identifier used in diagnostics (`schema.name`)
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A parameter row from the catalog (`sys.parameters`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogParameter {
    pub object_id: i64,
    /// Parameter name including `@`; empty for a function's return value
    #[serde(alias = "ParameterNameSys")]
    pub name: String,
    #[serde(alias = "SystemType")]
    pub system_type: String,
    /// Maximum length in bytes, -1 for MAX types
    #[serde(alias = "MaxLengthBytes")]
    pub max_length: i32,
    #[serde(alias = "Precision")]
    pub precision: u8,
    #[serde(alias = "Scale")]
    pub scale: u8,
    #[serde(alias = "IsOutputSys")]
    pub is_output: bool,
    #[serde(alias = "ParameterOrder")]
    pub ordinal: i32,
}

/// Pre-parsed default information for one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultInfo {
    pub object_id: i64,
    pub parameter_name: String,
    pub is_optional: bool,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// Default information for one routine, looked up by parameter name
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultInfoMap {
    entries: BTreeMap<String, DefaultInfo>,
}

impl DefaultInfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row; a later row for the same name replaces an earlier one.
    pub fn insert(&mut self, info: DefaultInfo) {
        self.entries.insert(parameter_key(&info.parameter_name), info);
    }

    pub fn get(&self, parameter_name: &str) -> Option<&DefaultInfo> {
        self.entries.get(&parameter_key(parameter_name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in name order
    pub fn iter(&self) -> impl Iterator<Item = &DefaultInfo> {
        self.entries.values()
    }
}

impl FromIterator<DefaultInfo> for DefaultInfoMap {
    fn from_iter<I: IntoIterator<Item = DefaultInfo>>(iter: I) -> Self {
        let mut map = Self::new();
        for info in iter {
            map.insert(info);
        }
        map
    }
}

/// Size specifier written after a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeSpec {
    /// `(MAX)`
    Max,
    /// `(n)`
    Length(u32),
    /// `(p, s)`
    PrecisionScale { precision: u32, scale: u32 },
}

/// A parameter declaration recovered from definition text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    /// Name including the leading `@`
    pub name: String,
    /// Type as written, e.g. `decimal(10,2)` or `[dbo].[IdList]`
    pub type_text: String,
    pub size: Option<SizeSpec>,
    /// Default literal as written; NULL is normalized to upper case
    pub default_value: Option<String>,
    pub is_output: bool,
    pub is_readonly: bool,
    /// The declaration text this record was parsed from
    pub raw_text: String,
}

/// Ordered, case-insensitively keyed set of parsed declarations.
///
/// Inserting a name that is already present replaces the earlier declaration
/// in place, keeping its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSet {
    entries: Vec<ParameterDeclaration>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration, returning the one it replaced.
    pub fn insert(&mut self, declaration: ParameterDeclaration) -> Option<ParameterDeclaration> {
        let key = parameter_key(&declaration.name);
        match self
            .entries
            .iter_mut()
            .find(|d| parameter_key(&d.name) == key)
        {
            Some(existing) => Some(std::mem::replace(existing, declaration)),
            None => {
                self.entries.push(declaration);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDeclaration> {
        let key = parameter_key(name);
        self.entries.iter().find(|d| parameter_key(&d.name) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a resolved parameter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFlag {
    /// Catalog row only (no matching declaration in text)
    Catalog,
    /// Declared in text but unknown to the catalog
    TextOnly,
    /// Catalog row with a matching text declaration
    Both,
}

/// Final, reconciled view of one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParameter {
    pub name: String,
    pub type_from_catalog: Option<String>,
    pub type_from_text: Option<String>,
    /// Catalog max length in bytes
    pub max_length: Option<i32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    /// Size specifier as declared in text
    pub declared_size: Option<SizeSpec>,
    pub is_output: bool,
    pub is_readonly: bool,
    pub default_value: Option<String>,
    pub has_default: bool,
    pub ordinal: i32,
    pub source: SourceFlag,
    /// Declaration text the text-derived fields came from
    pub declaration_text: Option<String>,
}

impl ResolvedParameter {
    pub fn is_return_value(&self) -> bool {
        self.name == RETURN_VALUE_NAME
    }
}

/// Everything extracted for one routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSignature {
    pub object_id: i64,
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
    /// Parameters in ordinal order
    pub parameters: Vec<ResolvedParameter>,
    pub diagnostics: Vec<Diagnostic>,
    /// Body of a `/* code ... */` block
    pub embedded_example: Option<String>,
    /// Body of a `/* help.description ... */` block
    pub embedded_description: Option<String>,
    /// SHA-256 over the routine's definition, catalog rows and default rows
    pub fingerprint: String,
}

impl RoutineSignature {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Look up a parameter case-insensitively.
    pub fn parameter(&self, name: &str) -> Option<&ResolvedParameter> {
        let key = parameter_key(name);
        self.parameters.iter().find(|p| parameter_key(&p.name) == key)
    }

    /// Parameters a caller must supply: no default, not the return value.
    pub fn required_parameters(&self) -> impl Iterator<Item = &ResolvedParameter> {
        self.parameters
            .iter()
            .filter(|p| !p.is_return_value() && !p.has_default)
    }
}
