//! The single owned SQL Server connection and its transaction state machine.

use tiberius::{Client, Row, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, warn};

use strata_core::TransactionState;

use crate::config::MssqlConfig;
use crate::error::{MssqlError, MssqlResult};

type TdsClient = Client<Compat<TcpStream>>;

/// One physical SQL Server connection, owned by its provider.
///
/// Opening is idempotent and re-entrant: an open connection is reused, a
/// missing one is established. At most one explicit transaction is in flight
/// at a time.
pub struct MssqlConnection {
    config: MssqlConfig,
    client: Option<TdsClient>,
    transaction: TransactionState,
}

impl MssqlConnection {
    /// Create a closed connection for the given configuration.
    pub fn new(config: MssqlConfig) -> Self {
        Self {
            config,
            client: None,
            transaction: TransactionState::Inactive,
        }
    }

    /// The connection configuration.
    pub fn config(&self) -> &MssqlConfig {
        &self.config
    }

    /// Whether the physical connection is open.
    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Current transaction state.
    pub fn transaction_state(&self) -> TransactionState {
        self.transaction
    }

    /// Open the physical connection if it is not already open.
    pub async fn open(&mut self) -> MssqlResult<()> {
        if self.is_open() {
            debug!("connection already open, reusing");
            return Ok(());
        }

        let tiberius_config = self.config.to_tiberius_config()?;
        let tcp = TcpStream::connect(tiberius_config.get_addr())
            .await
            .map_err(|e| MssqlError::connection(format!("could not open connection: {}", e)))?;
        tcp.set_nodelay(true)
            .map_err(|e| MssqlError::connection(format!("could not configure socket: {}", e)))?;

        let client = Client::connect(tiberius_config, tcp.compat_write())
            .await
            .map_err(|e| MssqlError::connection(format!("could not open connection: {}", e)))?;

        debug!(
            host = %self.config.host,
            database = %self.config.database,
            "sql server connection opened"
        );
        self.client = Some(client);
        Ok(())
    }

    /// Close the physical connection.
    pub fn close(&mut self) {
        if self.transaction == TransactionState::Active {
            warn!("connection closed with an active transaction; backend will roll it back");
        }
        self.client = None;
        self.transaction = TransactionState::Inactive;
    }

    fn client(&mut self) -> MssqlResult<&mut TdsClient> {
        self.client
            .as_mut()
            .ok_or_else(|| MssqlError::connection("connection is not open"))
    }

    /// Begin an explicit transaction.
    pub async fn begin(&mut self) -> MssqlResult<()> {
        if self.transaction == TransactionState::Active {
            return Err(MssqlError::transaction("transaction already active"));
        }
        debug!("Beginning transaction");
        self.client()?
            .simple_query("BEGIN TRANSACTION")
            .await?
            .into_results()
            .await?;
        self.transaction = TransactionState::Active;
        Ok(())
    }

    /// Commit the active transaction.
    pub async fn commit(&mut self) -> MssqlResult<()> {
        if self.transaction != TransactionState::Active {
            return Err(MssqlError::transaction("no active transaction to commit"));
        }
        debug!("Committing transaction");
        let result: MssqlResult<()> = async {
            self.client()?
                .simple_query("COMMIT")
                .await?
                .into_results()
                .await?;
            Ok(())
        }
        .await;
        self.transaction = TransactionState::Inactive;
        result
    }

    /// Roll back the active transaction.
    pub async fn rollback(&mut self) -> MssqlResult<()> {
        if self.transaction != TransactionState::Active {
            return Err(MssqlError::transaction("no active transaction to roll back"));
        }
        debug!("Rolling back transaction");
        let result: MssqlResult<()> = async {
            self.client()?
                .simple_query("ROLLBACK")
                .await?
                .into_results()
                .await?;
            Ok(())
        }
        .await;
        self.transaction = TransactionState::Inactive;
        result
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&mut self, sql: &str, params: &[&dyn ToSql]) -> MssqlResult<u64> {
        debug!(sql = %sql, "Executing statement");
        let result = self.client()?.execute(sql, params).await?;
        Ok(result.total())
    }

    /// Execute a query and return the rows of its first result set.
    pub async fn query(&mut self, sql: &str, params: &[&dyn ToSql]) -> MssqlResult<Vec<Row>> {
        debug!(sql = %sql, "Executing query");
        let stream = self.client()?.query(sql, params).await?;
        let rows = stream.into_first_result().await?;
        Ok(rows)
    }

    /// Execute a batch and return every result set.
    ///
    /// The INSERT + `SELECT SCOPE_IDENTITY()` batch produces its scalar in a
    /// later result set, so scalar reads scan all of them.
    pub async fn query_results(
        &mut self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> MssqlResult<Vec<Vec<Row>>> {
        debug!(sql = %sql, "Executing batch query");
        let stream = self.client()?.query(sql, params).await?;
        let results = stream.into_results().await?;
        Ok(results)
    }
}
