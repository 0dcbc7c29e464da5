use crate::query::QueryError;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    /// The entity type is missing a registration the operation relies on
    /// (e.g. soft delete without a soft-delete column). Raised before any I/O.
    Configuration { entity: String, message: String },
    /// The caller passed a value of the wrong shape (e.g. a non-object record).
    InvalidInput(String),
    Query(QueryError),
    Serialization(String),
    /// Opaque pass-through of a backend failure.
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `strata-data-sqlx`) to wrap
    /// driver-specific errors without translating them.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub(crate) fn configuration(entity: &str, message: impl Into<String>) -> Self {
        DataError::Configuration {
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` for [`DataError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, DataError::Configuration { .. })
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Configuration { entity, message } => {
                write!(f, "Configuration error for entity `{entity}`: {message}")
            }
            DataError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            DataError::Query(err) => write!(f, "Query error: {err}"),
            DataError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            DataError::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::Query(err)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Serialization(err.to_string())
    }
}
