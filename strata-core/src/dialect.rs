//! The per-backend dialect capability.
//!
//! A [`Dialect`] supplies every backend-specific SQL fragment and type-mapping
//! table the shared provider algorithms need: identifier quoting, the
//! identity-retrieval clause, date/string conversion, NULL coalescing,
//! catalog queries, and the catalog-name ↔ logical-type maps. Drivers provide
//! the metadata; the rest of the codebase consumes it without hardcoding
//! per-backend logic.

use crate::types::{DbType, HostType};

/// Closed set of date rendering styles for date-to-string conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// MM/DD/YYYY
    MmDdYyyy,
    /// MM-DD-YYYY
    MmDdYyyyHyphen,
    /// Mon DD, YYYY
    MonDdYyyy,
    /// No conversion applied.
    Unformatted,
}

/// Date component for date-part extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Day,
    Month,
    Year,
}

/// Portable SQL operations with backend-specific names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlFunction {
    Substring,
    IfNull,
    CurrentDate,
    Concat,
}

/// Supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    SqlServer,
    Postgres,
}

impl Backend {
    /// Human-readable backend name.
    pub fn name(self) -> &'static str {
        match self {
            Backend::SqlServer => "SQL Server",
            Backend::Postgres => "PostgreSQL",
        }
    }
}

/// Backend-specific SQL fragments and type mapping, implemented once per
/// backend. Fragments from different backends need not be textually equal,
/// only semantically equivalent.
pub trait Dialect: Send + Sync {
    /// Which backend family this dialect speaks.
    fn backend(&self) -> Backend;

    /// Prefix for named parameters in generated SQL.
    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    /// Wildcard character for LIKE patterns.
    fn wildcard(&self) -> &'static str {
        "%"
    }

    /// The backend's conventional default schema.
    fn default_schema(&self) -> &'static str;

    /// Quote a single identifier.
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Schema-qualified table reference, falling back to the backend default
    /// schema when none is supplied.
    fn qualify_table(&self, schema: Option<&str>, table: &str) -> String;

    /// Locking hint appended after the FROM clause of generated reads, or
    /// empty when the backend does not use one.
    fn select_lock_hint(&self) -> &'static str {
        ""
    }

    /// Clause appended to an INSERT to recover the generated key in the same
    /// round trip.
    fn identity_fetch_clause(&self, identity_column: &str) -> String;

    /// Preferred logical type for plain string parameters.
    fn string_parameter_type(&self) -> DbType {
        DbType::VarChar
    }

    /// Convert any column reference to character data.
    fn convert_to_char(&self, column: &str) -> String;

    /// Render a date column as a string in the requested format.
    fn date_to_string_for_column(&self, column: &str, format: DateFormat) -> String;

    /// Render a date literal as a string in the requested format.
    fn date_to_string_for_value(&self, value: &str, format: DateFormat) -> String;

    /// Date-literal syntax usable where the backend expects a date.
    fn string_to_date(&self, date: &str) -> String {
        format!("'{}' ", date)
    }

    /// Date-literal syntax for BETWEEN bounds.
    fn to_date(&self, date: &str, _format: DateFormat) -> String {
        format!("'{}'", date)
    }

    /// Date-only rendering of a date column.
    fn date_only(&self, column: &str) -> String;

    /// Two-argument NULL-coalescing expression.
    fn if_null(&self, check: &str, fallback: &str) -> String;

    /// Bare name of the NULL-coalescing function.
    fn if_null_function(&self) -> &'static str;

    /// Function or expression returning the current date.
    fn current_date_function(&self) -> &'static str;

    /// Extract a date part from a date literal.
    fn date_part(&self, date: &str, part: DatePart) -> String;

    /// Extract the year from a date literal.
    fn year_of(&self, date: &str) -> String;

    /// Conditional expression: `column == equals ? then : otherwise`, with an
    /// output alias.
    fn case_when(
        &self,
        column: &str,
        equals: &str,
        then: &str,
        otherwise: &str,
        alias: &str,
    ) -> String {
        format!(
            " (CASE {} WHEN {} THEN {} ELSE {} END) {} ",
            column, equals, then, otherwise, alias
        )
    }

    /// Backend name for a portable SQL operation.
    fn function_name(&self, function: SqlFunction) -> &'static str;

    /// Catalog query listing (name, schema) for every table, ordered by name.
    fn table_list_query(&self, schema: &str) -> String;

    /// Catalog query listing (name, schema) for every view, ordered by name.
    fn view_list_query(&self, schema: &str) -> String;

    /// Catalog query selecting the column definition of a table or view.
    ///
    /// `table` may be bare or schema-qualified; a qualified name is split on
    /// the first `.` and overrides `default_schema`.
    fn table_definition_query(&self, table: &str, default_schema: &str) -> String;

    /// The backend's "what schema am I in" introspection query.
    fn session_schema_query(&self) -> &'static str;

    /// Map a catalog type name to the logical type. Total: unrecognized
    /// names fall back to `DbType::VarChar` so an unknown type never aborts
    /// introspection of an otherwise-valid table.
    fn logical_type(&self, catalog_name: &str) -> DbType;

    /// Map a catalog type name to the host representation. Total, with the
    /// string fallback.
    fn host_type(&self, catalog_name: &str) -> HostType;

    /// Native type name for a logical type. Total over `DbType`.
    fn native_type_name(&self, db_type: DbType) -> &'static str;
}

/// Split a possibly schema-qualified relation name on the first `.`,
/// stripping any quoting brackets, and fall back to `default_schema` for a
/// bare name.
pub fn split_qualified_name(name: &str, default_schema: &str) -> (String, String) {
    let cleaned: String = name.chars().filter(|c| *c != '[' && *c != ']').collect();
    let default_schema: String = default_schema
        .chars()
        .filter(|c| *c != '[' && *c != ']')
        .collect();
    match cleaned.split_once('.') {
        Some((schema, table)) => (schema.to_string(), table.to_string()),
        None => (default_schema, cleaned),
    }
}

/// Derive a bind-safe parameter name from a column name: anything outside
/// `[A-Za-z0-9_]` becomes an underscore.
pub fn safe_parameter_name(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Heuristic uniqueness-violation detection from backend error text.
///
/// Both supported engines mention "duplicate key" in their unique-constraint
/// messages. Matching text rather than an error code is fragile but preserved
/// for compatibility; see DESIGN.md.
pub fn is_duplicate_key_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("duplicate key")
}
