//! # strata-core
//!
//! Ambient services shared by the Strata crates: layered configuration
//! ([`StrataConfig`]) and the tracing bootstrap ([`init_tracing`]).

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigValue, DataSourceConfig, StrataConfig};
pub use logging::{init_tracing, try_init_tracing};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{init_tracing, ConfigError, DataSourceConfig, StrataConfig};
}
