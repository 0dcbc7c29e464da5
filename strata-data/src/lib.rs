//! # strata-data
//!
//! Convention layer over a storage collaborator: one generic [`Service`] per
//! entity type, a suffix-encoded filter language (`age_gte`, `name_contains`)
//! compiled to structured or raw SQL conditions, soft delete, audit-column
//! injection and snake_case / camelCase bridging for raw query rows.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`filter`] | filter keys, [`Where`], structured [`Condition`]s |
//! | [`raw`] | raw SQL fragments with named parameters |
//! | [`case`] | deep key conversion |
//! | [`entity`] / [`metadata`] | [`Entity`], [`EntityMetadata`], [`MetadataRegistry`] |
//! | [`repository`] | the [`Repository`] collaborator trait |
//! | [`service`] | [`Service`] |
//! | [`registry`] | [`ServiceRegistry`] |
//! | [`query`] | [`QueryBuilder`] for SQL-backed repositories |

pub mod case;
pub mod entity;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod page;
pub mod query;
pub mod raw;
pub mod registry;
pub mod repository;
pub mod service;

pub use entity::{Entity, EntityMetadata, EntityMetadataBuilder, SoftDeleteValue};
pub use error::DataError;
pub use filter::{Comparison, Condition, FindOperator, Record, Where};
pub use metadata::{MetadataHandle, MetadataRegistry};
pub use page::{Page, Pageable};
pub use query::{Dialect, IdentifierPolicy, QueryBuilder, QueryError};
pub use raw::{RawCondition, RawWhere};
pub use registry::{EntityService, ServiceRegistry, ServiceRegistryBuilder};
pub use repository::{
    FindAndCount, FindOptions, Order, Patch, PatchValue, Repository, SortDirection, UpdateResult,
};
pub use service::{Criteria, FindParams, Service, ServiceOptions};

#[doc(hidden)]
pub mod __private {
    //! Paths used by `#[derive(Entity)]` expansions.
    pub use serde_json;
}

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Criteria, DataError, Entity, EntityMetadata, EntityService, FindParams, MetadataRegistry,
        Page, Pageable, Patch, PatchValue, Record, Repository, Service, ServiceRegistry,
        SoftDeleteValue, Where,
    };
}
