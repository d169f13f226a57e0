//! The PostgreSQL provider.

use async_trait::async_trait;
use tokio_postgres::types::ToSql;

use strata_core::{
    AccessMode, ConnectionState, DatabaseProvider, DbValue, Dialect, ParameterCollection, Result,
    RowReader, TransactionState,
};

use crate::config::PgConfig;
use crate::connection::PgConnection;
use crate::dialect::PgDialect;
use crate::error::PgResult;
use crate::types::{bind_parameters, row_to_data_row};

/// Convert named `@name` placeholders to positional `$n` placeholders.
///
/// Parameters keep their collection order; names are rewritten longest-first
/// so a parameter name that prefixes another does not corrupt it.
fn to_positional(sql: &str, parameters: &ParameterCollection) -> String {
    let mut order: Vec<(usize, &str)> = parameters
        .inputs()
        .enumerate()
        .map(|(index, p)| (index, p.name.as_str()))
        .collect();
    order.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut result = sql.to_string();
    for (index, name) in order {
        result = result.replace(&format!("@{}", name), &format!("${}", index + 1));
    }
    result
}

/// A provider talking to a PostgreSQL-family backend over one connection.
pub struct PgProvider {
    connection: PgConnection,
    dialect: PgDialect,
}

impl PgProvider {
    /// Create a provider from configuration. The connection is opened lazily
    /// or via [`DatabaseProvider::open`].
    pub fn new(config: PgConfig) -> Self {
        Self {
            connection: PgConnection::new(config),
            dialect: PgDialect,
        }
    }

    /// Create a provider from a database URL.
    pub fn from_url(url: impl Into<String>) -> PgResult<Self> {
        Ok(Self::new(PgConfig::from_url(url)?))
    }

    /// The provider configuration.
    pub fn config(&self) -> &PgConfig {
        self.connection.config()
    }

    async fn run_query(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
    ) -> PgResult<Vec<tokio_postgres::Row>> {
        let sql = to_positional(sql, parameters);
        let bound = bind_parameters(parameters);
        let refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        self.connection.query(&sql, &refs).await
    }
}

#[async_trait]
impl DatabaseProvider for PgProvider {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn configured_schema(&self) -> Option<&str> {
        self.connection.config().default_schema.as_deref()
    }

    fn connection_state(&self) -> ConnectionState {
        if self.connection.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn transaction_state(&self) -> TransactionState {
        self.connection.transaction_state()
    }

    async fn open(&mut self) -> Result<()> {
        self.connection.open().await.map_err(Into::into)
    }

    async fn close(&mut self) -> Result<()> {
        self.connection.close();
        Ok(())
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        self.connection.begin().await.map_err(Into::into)
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.connection.commit().await.map_err(Into::into)
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        self.connection.rollback().await.map_err(Into::into)
    }

    async fn execute_non_query(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
    ) -> Result<u64> {
        let sql = to_positional(sql, parameters);
        let bound = bind_parameters(parameters);
        let refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        self.connection
            .execute(&sql, &refs)
            .await
            .map_err(Into::into)
    }

    async fn execute_scalar(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
    ) -> Result<DbValue> {
        let rows = self.run_query(sql, parameters).await?;
        match rows.first() {
            Some(row) if !row.is_empty() => {
                let data = row_to_data_row(row)?;
                Ok(data.value_at(0).cloned().unwrap_or(DbValue::Null))
            }
            _ => Ok(DbValue::Null),
        }
    }

    async fn execute_reader(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
        mode: AccessMode,
    ) -> Result<RowReader> {
        let rows = self.run_query(sql, parameters).await?;
        let mut data_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            data_rows.push(row_to_data_row(row)?);
        }
        Ok(RowReader::new(data_rows, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_core::{DbType, Parameter};

    fn params(names: &[&str]) -> ParameterCollection {
        names
            .iter()
            .map(|n| Parameter::input(*n, DbType::Int32, 1.into()))
            .collect()
    }

    #[test]
    fn test_to_positional() {
        assert_eq!(
            to_positional("SELECT * FROM Users WHERE Id = @Id", &params(&["Id"])),
            "SELECT * FROM Users WHERE Id = $1"
        );
        assert_eq!(
            to_positional(
                "INSERT INTO t (a, b) VALUES (@A, @B)",
                &params(&["A", "B"])
            ),
            "INSERT INTO t (a, b) VALUES ($1, $2)"
        );
        assert_eq!(to_positional("SELECT 1", &params(&[])), "SELECT 1");
    }

    #[test]
    fn test_to_positional_handles_prefixed_names() {
        // @Name must not clobber the tail of @NameLong
        assert_eq!(
            to_positional(
                "WHERE Name = @Name AND NameLong = @NameLong",
                &params(&["Name", "NameLong"])
            ),
            "WHERE Name = $1 AND NameLong = $2"
        );
    }

    #[test]
    fn test_provider_exposes_configured_schema() {
        let config = PgConfig::from_url("postgresql://localhost/db?schema=sales").unwrap();
        let provider = PgProvider::new(config);
        assert_eq!(provider.configured_schema(), Some("sales"));
        assert_eq!(provider.schema_name(), "sales");
        assert_eq!(provider.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_provider_falls_back_to_backend_schema() {
        let config = PgConfig::from_url("postgresql://localhost/db").unwrap();
        let provider = PgProvider::new(config);
        assert_eq!(provider.configured_schema(), None);
        assert_eq!(provider.schema_name(), "public");
    }
}
