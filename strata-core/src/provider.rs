//! The provider contract every backend implements.
//!
//! Backends supply the connection/transaction primitives and the three
//! execution shapes (non-query, scalar, reader); the CRUD, parameter-factory
//! and introspection algorithms are provided here once, parameterized by the
//! backend's [`Dialect`]. This keeps the per-backend crates down to wire
//! concerns instead of duplicating the full provider logic per engine.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dialect::{Backend, Dialect, is_duplicate_key_message, safe_parameter_name};
use crate::entity::EntityAdapter;
use crate::error::{Result, StrataError};
use crate::param::{Parameter, ParameterCollection, directional_type_supported};
use crate::row::{AccessMode, RowReader};
use crate::schema::{TableColumn, TableSchema, ViewSchema};
use crate::statement::{BuiltStatement, SelectCriteria, build_insert, build_select};
use crate::types::{DbType, DbValue};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
}

/// Transaction lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Inactive,
    Active,
}

/// The vendor-agnostic provider contract.
///
/// A provider owns one physical connection and at most one in-flight
/// transaction; callers must not share an instance across concurrent logical
/// operations.
#[async_trait]
pub trait DatabaseProvider: Send {
    /// The backend's dialect capability.
    fn dialect(&self) -> &dyn Dialect;

    /// The default schema supplied at construction, if any.
    fn configured_schema(&self) -> Option<&str>;

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Current transaction state.
    fn transaction_state(&self) -> TransactionState;

    /// Open the physical connection. Idempotent and re-entrant: an already
    /// open connection is reused, not reopened.
    async fn open(&mut self) -> Result<()>;

    /// Close the physical connection.
    async fn close(&mut self) -> Result<()>;

    /// Begin an explicit transaction. Beginning while one is active is a
    /// caller error.
    async fn begin_transaction(&mut self) -> Result<()>;

    /// Commit the active transaction.
    async fn commit_transaction(&mut self) -> Result<()>;

    /// Roll back the active transaction.
    async fn rollback_transaction(&mut self) -> Result<()>;

    /// Execute a statement, returning the affected row count.
    async fn execute_non_query(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
    ) -> Result<u64>;

    /// Execute a statement, returning the first column of the first row.
    async fn execute_scalar(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
    ) -> Result<DbValue>;

    /// Execute a query, returning a forward-only reader over its result.
    async fn execute_reader(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
        mode: AccessMode,
    ) -> Result<RowReader>;

    /// Which backend family this provider talks to.
    fn backend(&self) -> Backend {
        self.dialect().backend()
    }

    /// Prefix for named parameters in generated SQL.
    fn parameter_prefix(&self) -> &'static str {
        self.dialect().parameter_prefix()
    }

    /// Wildcard character for LIKE patterns.
    fn wildcard(&self) -> &'static str {
        self.dialect().wildcard()
    }

    /// Open (if needed) and report whether the connection is usable.
    /// Backend-reported failures are re-raised, not swallowed.
    async fn test_connection(&mut self) -> Result<bool> {
        self.open().await?;
        Ok(self.connection_state() == ConnectionState::Open)
    }

    /// The effective default schema: configured value, or the backend's
    /// conventional default.
    fn schema_name(&self) -> String {
        match self.configured_schema() {
            Some(schema) if !schema.is_empty() => schema.to_string(),
            _ => self.dialect().default_schema().to_string(),
        }
    }

    /// Ask the session which schema it resolves unqualified names against.
    async fn discover_session_schema(&mut self) -> Result<String> {
        let sql = self.dialect().session_schema_query();
        let value = self.execute_scalar(sql, &ParameterCollection::new()).await?;
        Ok(value.to_string())
    }

    // ------------------------------------------------------------------
    // Parameter factory
    // ------------------------------------------------------------------

    /// String parameter; the empty string binds as null.
    fn create_string_parameter(&self, column: &str, value: &str) -> Parameter {
        let value = if value.is_empty() {
            DbValue::Null
        } else {
            DbValue::String(value.to_string())
        };
        Parameter::input(
            safe_parameter_name(column),
            self.dialect().string_parameter_type(),
            value,
        )
    }

    /// 16-bit integer parameter; `i16::MIN` binds as null.
    fn create_int16_parameter(&self, column: &str, value: i16) -> Parameter {
        let value = DbValue::I16(value).resolve_null(DbType::Int16, false);
        Parameter::input(safe_parameter_name(column), DbType::Int16, value)
    }

    /// 32-bit integer parameter; `i32::MIN` binds as null.
    fn create_int32_parameter(&self, column: &str, value: i32) -> Parameter {
        let value = DbValue::I32(value).resolve_null(DbType::Int32, false);
        Parameter::input(safe_parameter_name(column), DbType::Int32, value)
    }

    /// 64-bit integer parameter; `i64::MIN` binds as null.
    fn create_int64_parameter(&self, column: &str, value: i64) -> Parameter {
        let value = DbValue::I64(value).resolve_null(DbType::Int64, false);
        Parameter::input(safe_parameter_name(column), DbType::Int64, value)
    }

    /// Double parameter; `f64::MIN` binds as null.
    fn create_double_parameter(&self, column: &str, value: f64) -> Parameter {
        let value = DbValue::F64(value).resolve_null(DbType::Double, false);
        Parameter::input(safe_parameter_name(column), DbType::Double, value)
    }

    /// Date-time parameter; the minimum representable date binds as null.
    fn create_datetime_parameter(&self, column: &str, value: NaiveDateTime) -> Parameter {
        let value = DbValue::DateTime(value).resolve_null(DbType::DateTime, false);
        Parameter::input(safe_parameter_name(column), DbType::DateTime, value)
    }

    /// Sized character parameter; the empty string binds as null.
    fn create_char_parameter(&self, column: &str, value: &str, size: i32) -> Parameter {
        let value = if value.is_empty() {
            DbValue::Null
        } else {
            DbValue::String(value.to_string())
        };
        Parameter::input(safe_parameter_name(column), DbType::VarChar, value).with_size(size)
    }

    /// Blob parameter.
    fn create_blob_parameter(&self, column: &str, value: &[u8], size: i32) -> Parameter {
        Parameter::input(
            safe_parameter_name(column),
            DbType::Blob,
            DbValue::Bytes(value.to_vec()),
        )
        .with_size(size)
    }

    /// GUID parameter.
    fn create_guid_parameter(&self, column: &str, value: Uuid) -> Parameter {
        Parameter::input(safe_parameter_name(column), DbType::Guid, DbValue::Uuid(value))
    }

    /// Boolean parameter.
    fn create_boolean_parameter(&self, column: &str, value: bool) -> Parameter {
        Parameter::input(safe_parameter_name(column), DbType::Bit, DbValue::Bool(value))
    }

    /// XML parameter; the empty document binds as null.
    fn create_xml_parameter(&self, column: &str, value: &str) -> Parameter {
        let value = if value.is_empty() {
            DbValue::Null
        } else {
            DbValue::String(value.to_string())
        };
        Parameter::input(safe_parameter_name(column), DbType::Xml, value)
    }

    /// Output parameter of the given logical type.
    fn create_output_parameter(&self, name: &str, db_type: DbType) -> Result<Parameter> {
        if !directional_type_supported(db_type) {
            return Err(StrataError::TypeNotSupported(db_type));
        }
        Ok(Parameter::output(safe_parameter_name(name), db_type))
    }

    /// Return-value parameter of the given logical type.
    fn create_return_parameter(&self, name: &str, db_type: DbType) -> Result<Parameter> {
        if !directional_type_supported(db_type) {
            return Err(StrataError::TypeNotSupported(db_type));
        }
        Ok(Parameter::return_value(safe_parameter_name(name), db_type))
    }

    /// Empty parameter.
    fn create_empty_parameter(&self) -> Parameter {
        Parameter::empty()
    }

    /// Range parameters are not supported by these backends.
    fn create_between_parameter(&self, _column: &str) -> Result<Parameter> {
        Err(StrataError::not_implemented(
            "between parameters; use SelectCriteria::push_between",
        ))
    }

    /// Build one bound parameter for a column from an entity.
    fn create_parameter<E>(
        &self,
        entity: &E,
        column: &TableColumn,
        adapter: &dyn EntityAdapter<E>,
    ) -> Result<Parameter> {
        crate::statement::create_parameter(entity, column, adapter)
    }

    // ------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------

    /// Insert one entity into `table`.
    ///
    /// Builds one bound parameter per insertable column, runs the INSERT in
    /// its own transaction, and — when the entity declares a key column that
    /// is an identity column — retrieves the generated key in the same round
    /// trip and writes it back onto the entity. Exactly one of commit or
    /// rollback happens per attempt, decided before any error propagates.
    async fn add<E>(
        &mut self,
        table: &str,
        schema: Option<&str>,
        entity: &mut E,
        columns: &[TableColumn],
        adapter: &dyn EntityAdapter<E>,
    ) -> Result<()>
    where
        E: Send + Sync,
    {
        let (sql, fetch_key, parameters) = {
            let schema = schema.or_else(|| self.configured_schema());
            let dialect = self.dialect();
            let BuiltStatement { sql, parameters } =
                build_insert(dialect, schema, table, columns, entity, adapter)?;
            let identity = columns.iter().find(|c| c.is_identity);
            match identity {
                Some(column) if adapter.has_key_column(entity) => {
                    let sql = format!("{} {}", sql, dialect.identity_fetch_clause(&column.name));
                    (sql, true, parameters)
                }
                _ => (sql, false, parameters),
            }
        };

        debug!(sql = %sql, table = %table, "Adding record");
        self.begin_transaction().await?;

        let outcome: Result<()> = if fetch_key {
            match self.execute_scalar(&sql, &parameters).await {
                Ok(value) => match value.as_i64() {
                    Some(key) => {
                        adapter.set_primary_key(entity, key);
                        Ok(())
                    }
                    None => Err(StrataError::type_conversion(
                        "generated key was not numeric",
                    )),
                },
                Err(err) => Err(err),
            }
        } else {
            self.execute_non_query(&sql, &parameters).await.map(|_| ())
        };

        match outcome {
            Ok(()) => {
                self.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback_transaction().await {
                    warn!(error = %rollback_err, "rollback after failed insert also failed");
                }
                if is_duplicate_key_message(&err.to_string()) {
                    Err(StrataError::DuplicateKey {
                        table: table.to_string(),
                        message: err.to_string(),
                    })
                } else {
                    Err(StrataError::WriteFailed {
                        table: table.to_string(),
                        source: Box::new(err),
                    })
                }
            }
        }
    }

    /// Select columns from `table` with conjunctive predicates and ordering.
    ///
    /// Returns the forward-only reader to the caller, who owns draining it.
    /// The surrounding transaction is committed as soon as the read is
    /// issued; reads never hold a write transaction open across caller
    /// iteration.
    async fn get(
        &mut self,
        table: &str,
        schema: Option<&str>,
        select_columns: &[&str],
        criteria: &SelectCriteria,
        order_by: &[&str],
        mode: AccessMode,
    ) -> Result<RowReader> {
        let statement = {
            let schema = schema.or_else(|| self.configured_schema());
            build_select(self.dialect(), schema, table, select_columns, criteria, order_by)
        };

        debug!(sql = %statement.sql, "Reading records");
        self.begin_transaction().await?;
        match self
            .execute_reader(&statement.sql, &statement.parameters, mode)
            .await
        {
            Ok(reader) => {
                self.commit_transaction().await?;
                Ok(reader)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback_transaction().await {
                    warn!(error = %rollback_err, "rollback after failed read also failed");
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Schema introspection
    // ------------------------------------------------------------------

    /// Materialize the ordered column list of a table.
    ///
    /// `table` may be bare or schema-qualified. The catalog is re-queried on
    /// every call; definitions are never cached.
    async fn get_table_definition(&mut self, table: &str) -> Result<Vec<TableColumn>> {
        let sql = self
            .dialect()
            .table_definition_query(table, &self.schema_name());
        let mut reader = self
            .execute_reader(&sql, &ParameterCollection::new(), AccessMode::Buffered)
            .await?;

        let dialect = self.dialect();
        let mut columns = Vec::new();
        while reader.read() {
            let type_name = reader.get_string("DATA_TYPE")?;
            let mut column = TableColumn::new(
                reader.get_string("COLUMN_NAME")?,
                dialect.logical_type(&type_name),
                reader.get_i32("CHARACTER_MAXIMUM_LENGTH")?,
                reader.get_flag("IS_NULLABLE")?,
            );
            column.host_type = dialect.host_type(&type_name);
            column.ordinal = reader.get_i32("ORDINAL_POSITION")?;
            column.is_identity = reader.get_flag("IS_IDENTITY")?;
            column.is_primary_key = reader.get_flag_or("IS_PRIMARY_KEY", false);
            columns.push(column);
        }
        Ok(columns)
    }

    /// Materialize the ordered column list of a view. A view's projected
    /// columns are introspected exactly like a table's.
    async fn get_view_definition(&mut self, view: &str) -> Result<Vec<TableColumn>> {
        self.get_table_definition(view).await
    }

    /// Enumerate every table and materialize each one's definition.
    ///
    /// One catalog round trip per table, after the list query.
    async fn get_table_definitions(&mut self) -> Result<Vec<TableSchema>> {
        let sql = self.dialect().table_list_query(&self.schema_name());
        let mut reader = self
            .execute_reader(&sql, &ParameterCollection::new(), AccessMode::Buffered)
            .await?;

        let mut relations = Vec::new();
        while reader.read() {
            relations.push((
                reader.get_string("TABLE_NAME")?,
                reader.get_string("TABLE_SCHEMA")?,
            ));
        }

        let mut schemas = Vec::with_capacity(relations.len());
        for (name, owner) in relations {
            let columns = self
                .get_table_definition(&format!("{}.{}", owner, name))
                .await?;
            schemas.push(TableSchema { name, owner, columns });
        }
        Ok(schemas)
    }

    /// Enumerate every view and materialize each one's definition.
    async fn get_view_definitions(&mut self) -> Result<Vec<ViewSchema>> {
        let sql = self.dialect().view_list_query(&self.schema_name());
        let mut reader = self
            .execute_reader(&sql, &ParameterCollection::new(), AccessMode::Buffered)
            .await?;

        let mut relations = Vec::new();
        while reader.read() {
            relations.push((
                reader.get_string("TABLE_NAME")?,
                reader.get_string("TABLE_SCHEMA")?,
            ));
        }

        let mut schemas = Vec::with_capacity(relations.len());
        for (name, owner) in relations {
            let columns = self
                .get_view_definition(&format!("{}.{}", owner, name))
                .await?;
            schemas.push(ViewSchema { name, owner, columns });
        }
        Ok(schemas)
    }
}
