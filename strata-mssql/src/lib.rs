//! # strata-mssql
//!
//! Microsoft SQL Server provider for the Strata database access layer.
//!
//! This crate provides:
//! - An [`MssqlDialect`] with SQL Server fragments (bracket quoting,
//!   `SCOPE_IDENTITY()`, CONVERT date styles, ISNULL), catalog queries and
//!   the catalog-name ↔ logical-type mapping
//! - A single owned connection per provider with explicit
//!   begin/commit/rollback
//! - `DbValue` ↔ `tiberius` value binding, with typed nulls
//! - The [`MssqlProvider`] implementation of the shared provider contract
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::prelude::*;
//! use strata_mssql::MssqlProvider;
//!
//! #[tokio::main]
//! async fn main() -> strata_core::Result<()> {
//!     let mut provider = MssqlProvider::from_connection_string(
//!         "Server=localhost;Database=crm;User Id=app;Password=Secret1!;",
//!     )?;
//!     assert!(provider.test_connection().await?);
//!
//!     let users = provider.get_table_definition("Users").await?;
//!     println!("{} columns", users.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{EncryptionMode, MssqlConfig};
pub use connection::MssqlConnection;
pub use dialect::MssqlDialect;
pub use error::{MssqlError, MssqlResult};
pub use provider::MssqlProvider;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{EncryptionMode, MssqlConfig};
    pub use crate::connection::MssqlConnection;
    pub use crate::dialect::MssqlDialect;
    pub use crate::error::{MssqlError, MssqlResult};
    pub use crate::provider::MssqlProvider;
}
