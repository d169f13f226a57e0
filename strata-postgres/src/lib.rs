//! # strata-postgres
//!
//! PostgreSQL provider for the Strata database access layer.
//!
//! This crate provides:
//! - A [`PgDialect`] with PostgreSQL SQL fragments, catalog queries and the
//!   catalog-name ↔ logical-type mapping
//! - A single owned connection per provider with explicit
//!   begin/commit/rollback
//! - `DbValue` ↔ `tokio-postgres` value binding, with typed nulls
//! - The [`PgProvider`] implementation of the shared provider contract
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::prelude::*;
//! use strata_postgres::{PgConfig, PgProvider};
//!
//! #[tokio::main]
//! async fn main() -> strata_core::Result<()> {
//!     let config = PgConfig::builder()
//!         .host("localhost")
//!         .database("crm")
//!         .user("app")
//!         .default_schema("sales")
//!         .build()?;
//!
//!     let mut provider = PgProvider::new(config);
//!     assert!(provider.test_connection().await?);
//!
//!     let tables = provider.get_table_definitions().await?;
//!     println!("{} tables", tables.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{PgConfig, PgConfigBuilder};
pub use connection::PgConnection;
pub use dialect::PgDialect;
pub use error::{PgError, PgResult};
pub use provider::PgProvider;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{PgConfig, PgConfigBuilder};
    pub use crate::connection::PgConnection;
    pub use crate::dialect::PgDialect;
    pub use crate::error::{PgError, PgResult};
    pub use crate::provider::PgProvider;
}
