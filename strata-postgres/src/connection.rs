//! The single owned PostgreSQL connection and its transaction state machine.

use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, warn};

use strata_core::TransactionState;

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};

/// One physical PostgreSQL connection, owned by its provider.
///
/// Opening is idempotent and re-entrant: an open connection is reused, a
/// closed or broken one is re-established. At most one explicit transaction
/// is in flight at a time.
pub struct PgConnection {
    config: PgConfig,
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
    transaction: TransactionState,
}

impl PgConnection {
    /// Create a closed connection for the given configuration.
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            client: None,
            driver: None,
            transaction: TransactionState::Inactive,
        }
    }

    /// The connection configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Whether the physical connection is open and usable.
    pub fn is_open(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    /// Current transaction state.
    pub fn transaction_state(&self) -> TransactionState {
        self.transaction
    }

    /// Open the physical connection if it is not already open.
    pub async fn open(&mut self) -> PgResult<()> {
        if self.is_open() {
            debug!("connection already open, reusing");
            return Ok(());
        }
        self.shutdown();

        let (client, connection) = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| PgError::connection(format!("could not open connection: {}", e)))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection task ended with error");
            }
        });

        debug!(
            host = %self.config.host,
            database = %self.config.database,
            "postgres connection opened"
        );
        self.client = Some(client);
        self.driver = Some(driver);
        Ok(())
    }

    /// Close the physical connection.
    pub fn close(&mut self) {
        if self.transaction == TransactionState::Active {
            warn!("connection closed with an active transaction; backend will roll it back");
        }
        self.shutdown();
        self.transaction = TransactionState::Inactive;
    }

    fn shutdown(&mut self) {
        self.client = None;
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }

    fn client(&self) -> PgResult<&Client> {
        match self.client.as_ref() {
            Some(client) if !client.is_closed() => Ok(client),
            _ => Err(PgError::connection("connection is not open")),
        }
    }

    /// Begin an explicit transaction.
    pub async fn begin(&mut self) -> PgResult<()> {
        if self.transaction == TransactionState::Active {
            return Err(PgError::transaction("transaction already active"));
        }
        debug!("Beginning transaction");
        self.client()?.batch_execute("BEGIN").await?;
        self.transaction = TransactionState::Active;
        Ok(())
    }

    /// Commit the active transaction.
    pub async fn commit(&mut self) -> PgResult<()> {
        if self.transaction != TransactionState::Active {
            return Err(PgError::transaction("no active transaction to commit"));
        }
        debug!("Committing transaction");
        let result = self.client()?.batch_execute("COMMIT").await;
        self.transaction = TransactionState::Inactive;
        result.map_err(Into::into)
    }

    /// Roll back the active transaction.
    pub async fn rollback(&mut self) -> PgResult<()> {
        if self.transaction != TransactionState::Active {
            return Err(PgError::transaction("no active transaction to roll back"));
        }
        debug!("Rolling back transaction");
        let result = self.client()?.batch_execute("ROLLBACK").await;
        self.transaction = TransactionState::Inactive;
        result.map_err(Into::into)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PgResult<u64> {
        debug!(sql = %sql, "Executing statement");
        let count = self.client()?.execute(sql, params).await?;
        Ok(count)
    }

    /// Execute a query and return all rows.
    pub async fn query(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "Executing query");
        let rows = self.client()?.query(sql, params).await?;
        Ok(rows)
    }
}
