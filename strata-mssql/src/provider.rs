//! The Microsoft SQL Server provider.

use async_trait::async_trait;
use tiberius::ToSql;

use strata_core::{
    AccessMode, ConnectionState, DatabaseProvider, DbValue, Dialect, ParameterCollection, Result,
    RowReader, TransactionState,
};

use crate::config::MssqlConfig;
use crate::connection::MssqlConnection;
use crate::dialect::MssqlDialect;
use crate::error::MssqlResult;
use crate::types::{bind_parameters, row_to_data_row};

/// Convert named `@name` placeholders to tiberius `@Pn` placeholders.
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
        result = result.replace(&format!("@{}", name), &format!("@P{}", index + 1));
    }
    result
}

/// A provider talking to a SQL-Server-family backend over one connection.
pub struct MssqlProvider {
    connection: MssqlConnection,
    dialect: MssqlDialect,
}

impl MssqlProvider {
    /// Create a provider from configuration. The connection is opened via
    /// [`DatabaseProvider::open`].
    pub fn new(config: MssqlConfig) -> Self {
        Self {
            connection: MssqlConnection::new(config),
            dialect: MssqlDialect,
        }
    }

    /// Create a provider from a connection string (URL or ADO.NET style).
    pub fn from_connection_string(conn_str: impl Into<String>) -> MssqlResult<Self> {
        Ok(Self::new(MssqlConfig::from_connection_string(conn_str)?))
    }

    /// The provider configuration.
    pub fn config(&self) -> &MssqlConfig {
        self.connection.config()
    }
}

#[async_trait]
impl DatabaseProvider for MssqlProvider {
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
        let refs: Vec<&dyn ToSql> = bound.iter().map(|p| p.as_ref()).collect();
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
        let sql = to_positional(sql, parameters);
        let bound = bind_parameters(parameters);
        let refs: Vec<&dyn ToSql> = bound.iter().map(|p| p.as_ref()).collect();

        // The first result set with rows carries the scalar; an INSERT batch
        // contributes empty result sets before it.
        let results = self.connection.query_results(&sql, &refs).await?;
        for rows in results {
            if let Some(row) = rows.first() {
                let data = row_to_data_row(row).map_err(strata_core::StrataError::from)?;
                return Ok(data.value_at(0).cloned().unwrap_or(DbValue::Null));
            }
        }
        Ok(DbValue::Null)
    }

    async fn execute_reader(
        &mut self,
        sql: &str,
        parameters: &ParameterCollection,
        mode: AccessMode,
    ) -> Result<RowReader> {
        let sql = to_positional(sql, parameters);
        let bound = bind_parameters(parameters);
        let refs: Vec<&dyn ToSql> = bound.iter().map(|p| p.as_ref()).collect();

        let rows = self.connection.query(&sql, &refs).await?;
        let mut data_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            data_rows.push(row_to_data_row(row).map_err(strata_core::StrataError::from)?);
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
            to_positional(
                "INSERT INTO [dbo].[Users] (Name) VALUES (@Name) SELECT SCOPE_IDENTITY()",
                &params(&["Name"])
            ),
            "INSERT INTO [dbo].[Users] (Name) VALUES (@P1) SELECT SCOPE_IDENTITY()"
        );
        assert_eq!(
            to_positional("WHERE A = @A AND B = @B", &params(&["A", "B"])),
            "WHERE A = @P1 AND B = @P2"
        );
        assert_eq!(to_positional("SELECT 1", &params(&[])), "SELECT 1");
    }

    #[test]
    fn test_to_positional_handles_prefixed_names() {
        assert_eq!(
            to_positional(
                "WHERE Name = @Name AND NameLong = @NameLong",
                &params(&["Name", "NameLong"])
            ),
            "WHERE Name = @P1 AND NameLong = @P2"
        );
    }

    #[test]
    fn test_provider_exposes_configured_schema() {
        let config = MssqlConfig::from_connection_string(
            "Server=db1;Database=crm;User Id=sa;Password=x;Default Schema=audit;",
        )
        .unwrap();
        let provider = MssqlProvider::new(config);
        assert_eq!(provider.configured_schema(), Some("audit"));
        assert_eq!(provider.schema_name(), "audit");
        assert_eq!(provider.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_provider_falls_back_to_backend_schema() {
        let config =
            MssqlConfig::from_connection_string("Server=db1;Database=crm;User Id=sa;Password=x;")
                .unwrap();
        let provider = MssqlProvider::new(config);
        assert_eq!(provider.schema_name(), "dbo");
    }
}
