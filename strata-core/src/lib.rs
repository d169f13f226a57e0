//! # strata-core
//!
//! Backend-neutral contract for the Strata database access layer.
//!
//! Strata lets calling code issue typed operations — add this record, fetch
//! these columns, list this table's schema — without embedding a backend's
//! SQL dialect, native type names or driver API. This crate holds everything
//! the backends share:
//!
//! - The logical type system ([`DbType`], [`HostType`], [`DbValue`]) with the
//!   legacy sentinel-null convention kept as a shim at the parameter edge
//! - Bound parameters and per-statement collections ([`Parameter`],
//!   [`ParameterCollection`])
//! - The [`Dialect`] capability trait each backend implements: quoting,
//!   identity retrieval, date/string conversion, NULL coalescing, catalog
//!   queries and type mapping
//! - Pure INSERT/SELECT builders ([`statement`])
//! - The [`DatabaseProvider`] contract with the shared CRUD and
//!   schema-introspection algorithms
//!
//! Backend crates (`strata-postgres`, `strata-mssql`) supply a dialect, the
//! wire-level value binding and the connection/transaction primitives.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::prelude::*;
//! use strata_postgres::{PgConfig, PgProvider};
//!
//! #[tokio::main]
//! async fn main() -> strata_core::Result<()> {
//!     let config = PgConfig::from_url("postgresql://app@localhost/crm?schema=sales")?;
//!     let mut provider = PgProvider::new(config);
//!     provider.open().await?;
//!
//!     let users = provider.get_table_definition("Users").await?;
//!     for column in &users {
//!         println!("{} {:?}", column.name, column.db_type);
//!     }
//!     Ok(())
//! }
//! ```

pub mod dialect;
pub mod entity;
pub mod error;
pub mod param;
pub mod provider;
pub mod row;
pub mod schema;
pub mod statement;
pub mod types;

pub use dialect::{
    Backend, DateFormat, DatePart, Dialect, SqlFunction, is_duplicate_key_message,
    safe_parameter_name, split_qualified_name,
};
pub use entity::EntityAdapter;
pub use error::{Result, StrataError};
pub use param::{ParamDirection, Parameter, ParameterCollection, directional_type_supported};
pub use provider::{ConnectionState, DatabaseProvider, TransactionState};
pub use row::{AccessMode, DataRow, RowReader};
pub use schema::{TableColumn, TableSchema, ViewSchema};
pub use statement::{
    BuiltStatement, Criterion, SelectCriteria, build_insert, build_select, create_parameter,
};
pub use types::{DbType, DbValue, HostType};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dialect::{Backend, DateFormat, DatePart, Dialect, SqlFunction};
    pub use crate::entity::EntityAdapter;
    pub use crate::error::{Result, StrataError};
    pub use crate::param::{ParamDirection, Parameter, ParameterCollection};
    pub use crate::provider::{ConnectionState, DatabaseProvider, TransactionState};
    pub use crate::row::{AccessMode, DataRow, RowReader};
    pub use crate::schema::{TableColumn, TableSchema, ViewSchema};
    pub use crate::statement::SelectCriteria;
    pub use crate::types::{DbType, DbValue, HostType};
}
