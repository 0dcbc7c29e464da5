//! # strata-data-sqlx - SQLx backend for the Strata data layer
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! collaborator for Strata's data layer. It depends on [`strata-data`] for the
//! [`Repository`](strata_data::Repository) trait and the SQL builder, and adds
//! the pool handling, row decoding and error bridging needed to talk to a
//! real database.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqliteRepository`] | Repository over one SQLite table |
//! | [`connect_pool`] | Open a pool from a [`DataSourceConfig`](strata_core::DataSourceConfig) |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Quick start
//!
//! ```ignore
//! use strata_data_sqlx::SqliteRepository;
//!
//! let config = DataSourceConfig::from_config(&StrataConfig::load("dev")?)?;
//! let repo = Arc::new(SqliteRepository::<Order>::connect(&config).await?);
//! let orders = registry.get_service::<Order, _>(&repo);
//! ```
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use strata_data_sqlx::SqlxErrorExt;
//!
//! let rows = sqlx::query("SELECT ...")
//!     .fetch_all(&pool)
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod error;
#[cfg(feature = "sqlite")]
pub mod repository;
#[cfg(feature = "sqlite")]
mod row;

pub use error::{SqlxErrorExt, SqlxResult};
#[cfg(feature = "sqlite")]
pub use repository::{connect_pool, SqliteRepository};

/// Re-exports of the most commonly used types from both `strata-data` and this crate.
pub mod prelude {
    pub use crate::SqlxErrorExt;
    #[cfg(feature = "sqlite")]
    pub use crate::SqliteRepository;
    pub use strata_data::prelude::*;
}
