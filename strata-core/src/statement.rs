//! Parameterized INSERT and SELECT construction.
//!
//! These builders are pure: they produce SQL text plus a bound
//! [`ParameterCollection`] and perform no I/O, so every generated shape can be
//! unit tested without a backend.

use uuid::Uuid;

use crate::dialect::{Dialect, safe_parameter_name};
use crate::entity::EntityAdapter;
use crate::error::{Result, StrataError};
use crate::param::{Parameter, ParameterCollection};
use crate::schema::TableColumn;
use crate::types::{DbType, DbValue};

/// SQL text plus the parameters bound to it.
#[derive(Debug, Clone)]
pub struct BuiltStatement {
    /// Generated SQL with named placeholders.
    pub sql: String,
    /// Parameters, exactly one per placeholder, in placeholder order.
    pub parameters: ParameterCollection,
}

/// Build one bound parameter for a column from an entity.
///
/// Switches on the column's logical type to apply the null-sentinel rule, so
/// the produced parameter's wire type always matches the declared column
/// type. Logical types outside the closed insertable set fail with an
/// unsupported-type error. When a GUID column is also the primary key and the
/// extracted value is the empty sentinel, a fresh identifier is generated
/// client-side instead of deferring to the backend.
pub fn create_parameter<E>(
    entity: &E,
    column: &TableColumn,
    adapter: &dyn EntityAdapter<E>,
) -> Result<Parameter> {
    match column.db_type {
        DbType::VarChar
        | DbType::NVarChar
        | DbType::Char
        | DbType::Int16
        | DbType::Int32
        | DbType::Int64
        | DbType::Double
        | DbType::Decimal
        | DbType::DateTime
        | DbType::Bit
        | DbType::Blob
        | DbType::Image
        | DbType::VarBinary
        | DbType::Guid => {}
        other => return Err(StrataError::TypeNotSupported(other)),
    }

    let extracted = adapter.extract(entity, &column.name);
    if let Some(host) = extracted.host_type() {
        if host != column.db_type.host_type() {
            return Err(StrataError::type_conversion(format!(
                "value for column '{}' does not match its declared type {}",
                column.name, column.db_type
            )));
        }
    }

    let value = if column.db_type == DbType::Guid
        && column.is_primary_key
        && matches!(extracted, DbValue::Uuid(id) if id.is_nil())
    {
        DbValue::Uuid(Uuid::new_v4())
    } else {
        extracted.resolve_null(column.db_type, column.nullable_as_ref)
    };

    Ok(Parameter::input(
        safe_parameter_name(&column.name),
        column.db_type,
        value,
    ))
}

/// Assemble `INSERT INTO <qualified> (<cols>) VALUES (<params>)` over the
/// insertable columns, with one bound parameter per column.
pub fn build_insert<E>(
    dialect: &dyn Dialect,
    schema: Option<&str>,
    table: &str,
    columns: &[TableColumn],
    entity: &E,
    adapter: &dyn EntityAdapter<E>,
) -> Result<BuiltStatement> {
    let prefix = dialect.parameter_prefix();
    let mut parameters = ParameterCollection::new();
    let mut column_list = String::new();
    let mut value_list = String::new();

    for column in columns.iter().filter(|c| c.is_insertable()) {
        let parameter = create_parameter(entity, column, adapter)?;
        if !column_list.is_empty() {
            column_list.push_str(", ");
            value_list.push_str(", ");
        }
        column_list.push_str(&column.name);
        value_list.push_str(prefix);
        value_list.push_str(&parameter.name);
        parameters.push(parameter);
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.qualify_table(schema, table),
        column_list,
        value_list
    );

    Ok(BuiltStatement { sql, parameters })
}

/// One predicate of a generated SELECT.
#[derive(Debug, Clone)]
pub enum Criterion {
    /// `column = @param`
    Equals(Parameter),
    /// `column BETWEEN @from AND @to`
    Between {
        column: String,
        low: Parameter,
        high: Parameter,
    },
}

/// Conjunctive predicates for a generated SELECT.
#[derive(Debug, Clone, Default)]
pub struct SelectCriteria {
    items: Vec<Criterion>,
}

impl SelectCriteria {
    /// No predicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate on the parameter's source column.
    pub fn push_equals(&mut self, parameter: Parameter) {
        self.items.push(Criterion::Equals(parameter));
    }

    /// Add a BETWEEN predicate over a pair of bound values.
    pub fn push_between(&mut self, column: &str, db_type: DbType, low: DbValue, high: DbValue) {
        let base = safe_parameter_name(column);
        self.items.push(Criterion::Between {
            column: column.to_string(),
            low: Parameter::input(format!("{}_from", base), db_type, low),
            high: Parameter::input(format!("{}_to", base), db_type, high),
        });
    }

    /// Whether any predicate was added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate predicates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.items.iter()
    }
}

/// Assemble `SELECT <cols> FROM <qualified> [lock-hint] [WHERE ...]
/// [ORDER BY ...]` with one bound parameter per predicate value.
pub fn build_select(
    dialect: &dyn Dialect,
    schema: Option<&str>,
    table: &str,
    select_columns: &[&str],
    criteria: &SelectCriteria,
    order_by: &[&str],
) -> BuiltStatement {
    let prefix = dialect.parameter_prefix();
    let mut parameters = ParameterCollection::new();

    let mut sql = format!(
        "SELECT {} FROM {}",
        select_columns.join(", "),
        dialect.qualify_table(schema, table)
    );

    let hint = dialect.select_lock_hint();
    if !hint.is_empty() {
        sql.push(' ');
        sql.push_str(hint);
    }

    if !criteria.is_empty() {
        sql.push_str(" WHERE ");
        let mut first = true;
        for criterion in criteria.iter() {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            match criterion {
                Criterion::Equals(parameter) => {
                    sql.push_str(&format!("{} = {}{}", parameter.name, prefix, parameter.name));
                    parameters.push(parameter.clone());
                }
                Criterion::Between { column, low, high } => {
                    sql.push_str(&format!(
                        "{} BETWEEN {}{} AND {}{}",
                        column, prefix, low.name, prefix, high.name
                    ));
                    parameters.push(low.clone());
                    parameters.push(high.clone());
                }
            }
        }
    }

    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by.join(", "));
    }

    BuiltStatement { sql, parameters }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Backend, DateFormat, DatePart, SqlFunction};
    use crate::types::HostType;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Minimal dialect for exercising the builders without a backend crate.
    struct PlainDialect;

    impl Dialect for PlainDialect {
        fn backend(&self) -> Backend {
            Backend::Postgres
        }
        fn default_schema(&self) -> &'static str {
            "public"
        }
        fn quote_identifier(&self, identifier: &str) -> String {
            format!("\"{}\"", identifier)
        }
        fn qualify_table(&self, schema: Option<&str>, table: &str) -> String {
            format!("{}.{}", schema.unwrap_or(self.default_schema()), table)
        }
        fn identity_fetch_clause(&self, identity_column: &str) -> String {
            format!("RETURNING {}", identity_column)
        }
        fn convert_to_char(&self, column: &str) -> String {
            format!("CAST({} AS VARCHAR)", column)
        }
        fn date_to_string_for_column(&self, column: &str, _format: DateFormat) -> String {
            column.to_string()
        }
        fn date_to_string_for_value(&self, value: &str, _format: DateFormat) -> String {
            value.to_string()
        }
        fn date_only(&self, column: &str) -> String {
            column.to_string()
        }
        fn if_null(&self, check: &str, fallback: &str) -> String {
            format!("COALESCE({}, {})", check, fallback)
        }
        fn if_null_function(&self) -> &'static str {
            "COALESCE"
        }
        fn current_date_function(&self) -> &'static str {
            "CURRENT_DATE"
        }
        fn date_part(&self, date: &str, _part: DatePart) -> String {
            date.to_string()
        }
        fn year_of(&self, date: &str) -> String {
            date.to_string()
        }
        fn function_name(&self, _function: SqlFunction) -> &'static str {
            ""
        }
        fn table_list_query(&self, _schema: &str) -> String {
            String::new()
        }
        fn view_list_query(&self, _schema: &str) -> String {
            String::new()
        }
        fn table_definition_query(&self, _table: &str, _default_schema: &str) -> String {
            String::new()
        }
        fn session_schema_query(&self) -> &'static str {
            ""
        }
        fn logical_type(&self, _catalog_name: &str) -> DbType {
            DbType::VarChar
        }
        fn host_type(&self, _catalog_name: &str) -> HostType {
            HostType::String
        }
        fn native_type_name(&self, _db_type: DbType) -> &'static str {
            "VARCHAR"
        }
    }

    /// Map-backed entity for builder tests.
    struct MapAdapter;

    impl EntityAdapter<HashMap<String, DbValue>> for MapAdapter {
        fn extract(&self, entity: &HashMap<String, DbValue>, column: &str) -> DbValue {
            entity.get(column).cloned().unwrap_or(DbValue::Null)
        }
        fn has_key_column(&self, entity: &HashMap<String, DbValue>) -> bool {
            entity.contains_key("Id")
        }
        fn set_primary_key(&self, entity: &mut HashMap<String, DbValue>, key: i64) {
            entity.insert("Id".to_string(), DbValue::I64(key));
        }
    }

    fn user_columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("Id", DbType::Int32, 0, false)
                .identity()
                .primary_key(),
            TableColumn::new("Name", DbType::VarChar, 50, true).at_ordinal(1),
        ]
    }

    #[test]
    fn test_insert_skips_identity_columns() {
        let mut entity = HashMap::new();
        entity.insert("Id".to_string(), DbValue::I32(0));
        entity.insert("Name".to_string(), DbValue::from("Ann"));

        let stmt = build_insert(
            &PlainDialect,
            None,
            "Users",
            &user_columns(),
            &entity,
            &MapAdapter,
        )
        .unwrap();

        assert_eq!(stmt.sql, "INSERT INTO public.Users (Name) VALUES (@Name)");
        assert_eq!(stmt.parameters.len(), 1);
        assert_eq!(
            stmt.parameters.get("Name").unwrap().value,
            DbValue::String("Ann".into())
        );
    }

    #[test]
    fn test_insert_applies_sentinel_null() {
        let columns = vec![TableColumn::new("Age", DbType::Int32, 0, true)];
        let mut entity = HashMap::new();
        entity.insert("Age".to_string(), DbValue::I32(i32::MIN));

        let stmt =
            build_insert(&PlainDialect, None, "Users", &columns, &entity, &MapAdapter).unwrap();
        assert_eq!(stmt.parameters.get("Age").unwrap().value, DbValue::Null);
    }

    #[test]
    fn test_guid_primary_key_generated_client_side() {
        let columns = vec![TableColumn::new("Key", DbType::Guid, 0, false).primary_key()];
        let mut entity = HashMap::new();
        entity.insert("Key".to_string(), DbValue::Uuid(Uuid::nil()));

        let stmt =
            build_insert(&PlainDialect, None, "Docs", &columns, &entity, &MapAdapter).unwrap();
        match &stmt.parameters.get("Key").unwrap().value {
            DbValue::Uuid(id) => assert!(!id.is_nil()),
            other => panic!("expected a generated uuid, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let columns = vec![TableColumn::new("V", DbType::SqlVariant, 0, true)];
        let entity = HashMap::new();

        let err =
            build_insert(&PlainDialect, None, "T", &columns, &entity, &MapAdapter).unwrap_err();
        assert!(err.is_type_not_supported());
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let columns = vec![TableColumn::new("Age", DbType::Int32, 0, true)];
        let mut entity = HashMap::new();
        entity.insert("Age".to_string(), DbValue::from("not a number"));

        let err =
            build_insert(&PlainDialect, None, "T", &columns, &entity, &MapAdapter).unwrap_err();
        assert!(matches!(err, StrataError::TypeConversion(_)));
    }

    #[test]
    fn test_select_without_criteria_has_no_where() {
        let stmt = build_select(
            &PlainDialect,
            Some("app"),
            "Users",
            &["Id", "Name"],
            &SelectCriteria::new(),
            &["Name"],
        );
        assert_eq!(stmt.sql, "SELECT Id, Name FROM app.Users ORDER BY Name");
        assert!(stmt.parameters.is_empty());
    }

    #[test]
    fn test_select_with_equality_and_between() {
        let mut criteria = SelectCriteria::new();
        criteria.push_equals(Parameter::input("Name", DbType::VarChar, "Ann".into()));
        criteria.push_between("Age", DbType::Int32, 18.into(), 65.into());

        let stmt = build_select(
            &PlainDialect,
            None,
            "Users",
            &["Id"],
            &criteria,
            &[],
        );
        assert_eq!(
            stmt.sql,
            "SELECT Id FROM public.Users WHERE Name = @Name AND Age BETWEEN @Age_from AND @Age_to"
        );
        assert_eq!(stmt.parameters.len(), 3);
        let names: Vec<&str> = stmt.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "Age_from", "Age_to"]);
    }
}
