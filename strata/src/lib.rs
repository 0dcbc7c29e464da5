//! Strata - a convention layer over a repository.
//!
//! This facade crate re-exports all Strata sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use strata::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate                       |
//! |-------------|---------|-----------------------------|
//! | `macros`    | **yes** | `strata-macros` (`#[derive(Entity)]`) |
//! | `data-sqlx` | no      | `strata-data-sqlx`          |
//! | `sqlite`    | no      | `strata-data-sqlx/sqlite`   |
//! | `full`      | no      | All of the above            |

// Re-export sub-crates as public modules so they're accessible as
// `strata::strata_core`, `strata::strata_data`, etc.
//
// The proc macros use `proc-macro-crate` to detect whether the user depends
// on `strata` (facade) or individual crates, and generate the correct paths.
pub extern crate strata_core;
pub extern crate strata_data;

#[cfg(feature = "macros")]
pub extern crate strata_macros;

// Re-export everything from strata-core at the top level for convenience.
pub use strata_core::*;

#[cfg(feature = "macros")]
pub use strata_macros::Entity;

#[cfg(feature = "data-sqlx")]
pub use strata_data_sqlx;

/// Unified prelude - import everything with `use strata::prelude::*`.
pub mod prelude {
    pub use strata_core::prelude::*;
    pub use strata_data::prelude::*;

    #[cfg(feature = "macros")]
    pub use strata_macros::Entity;

    #[cfg(feature = "data-sqlx")]
    pub use strata_data_sqlx::prelude::*;
}
