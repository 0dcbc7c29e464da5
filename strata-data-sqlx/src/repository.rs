use std::marker::PhantomData;

use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use strata_core::DataSourceConfig;
use strata_data::case::{hump_to_snake_key, snake_to_hump_key};
use strata_data::{
    Comparison, Condition, DataError, Dialect, Entity, EntityMetadata, FindOperator, FindOptions, Patch, QueryBuilder,
    Record, Repository, UpdateResult,
};

use crate::error::SqlxErrorExt;
use crate::row::{bind_all, row_to_record};

/// Open a SQLite pool for `config`.
pub async fn connect_pool(config: &DataSourceConfig) -> Result<SqlitePool, DataError> {
    let mut options = SqlitePoolOptions::new();
    if let Some(max) = config.max_connections {
        options = options.max_connections(max);
    }
    let pool = options
        .connect(&config.url)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    tracing::info!(name = %config.name, url = %config.url, "SQLite pool connected");
    Ok(pool)
}

/// Repository over one SQLite table.
///
/// Entity attributes are camelCase and columns snake_case; the repository
/// converts in both directions. `save` is an upsert on the id column:
/// a missing id is generated as a UUID, null attributes are left out of the
/// insert so column defaults apply but clear the column of an existing row,
/// and the version column starts at 1 and
/// is incremented on every conflicting save.
///
/// # Example
///
/// ```ignore
/// let repo = Arc::new(SqliteRepository::<Order>::new(pool.clone(), "default"));
/// let orders = registry.get_service::<Order, _>(&repo);
/// ```
pub struct SqliteRepository<E> {
    pool: SqlitePool,
    connection: String,
    metadata: EntityMetadata,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteRepository<E> {
    pub fn new(pool: SqlitePool, connection: &str) -> Self {
        Self {
            pool,
            connection: connection.to_string(),
            metadata: E::metadata(),
            _marker: PhantomData,
        }
    }

    /// Connect a new pool from `config` and wrap it.
    pub async fn connect(config: &DataSourceConfig) -> Result<Self, DataError> {
        let pool = connect_pool(config).await?;
        Ok(Self::new(pool, &config.name))
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn builder(&self) -> QueryBuilder {
        QueryBuilder::new_with_dialect(self.metadata.table(), Dialect::Sqlite)
    }

    fn column(&self, attribute: &str) -> String {
        hump_to_snake_key(attribute)
    }

    fn to_entity(&self, record: Record) -> Result<E, DataError> {
        let record: Record = record
            .into_iter()
            .map(|(column, value)| (snake_to_hump_key(&column), value))
            .collect();
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Columns to save for `entity`, with the id filled in. Nulls are kept
    /// so a save over an existing row clears them.
    fn insert_row(&self, entity: &E) -> Result<Record, DataError> {
        let Value::Object(fields) = serde_json::to_value(entity)? else {
            return Err(DataError::Serialization(format!(
                "entity `{}` does not serialize to an object",
                self.metadata.name()
            )));
        };
        let mut row: Record = fields
            .into_iter()
            .map(|(attribute, value)| (self.column(&attribute), value))
            .collect();
        let id_column = self.column(self.metadata.id_column());
        if row.get(&id_column).map_or(true, Value::is_null) {
            row.insert(id_column, Value::String(uuid::Uuid::new_v4().to_string()));
        }
        if let Some(version) = self.metadata.version_column() {
            let version = self.column(version);
            if row.get(&version).map_or(true, Value::is_null) {
                row.insert(version, Value::from(1));
            }
        }
        Ok(row)
    }
}

impl<E> Clone for SqliteRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            connection: self.connection.clone(),
            metadata: self.metadata.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<E> {
    fn table_path(&self) -> String {
        format!("{}.{}", self.connection, self.metadata.table())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<E>, DataError> {
        let condition = options.condition.clone().map_attributes(hump_to_snake_key);
        let select: Vec<String> = options.select.iter().map(|a| self.column(a)).collect();
        let mut builder = self.builder().filter(condition).select(&select);
        for order in &options.order {
            builder = builder.order_by(&self.column(&order.attribute), order.direction.is_ascending());
        }
        if let Some(take) = options.take {
            builder = builder.limit(take);
        }
        if let Some(skip) = options.skip {
            builder = builder.offset(skip);
        }
        let (sql, params) = builder.build_select()?;
        tracing::debug!(table = self.metadata.table(), %sql, "find");
        let rows = bind_all(&sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter()
            .map(|row| self.to_entity(row_to_record(row)?))
            .collect()
    }

    async fn count(&self, condition: &Condition) -> Result<u64, DataError> {
        let condition = condition.clone().map_attributes(hump_to_snake_key);
        let (sql, params) = self.builder().filter(condition).build_count()?;
        let row = bind_all(&sql, params)
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let count: i64 = row.try_get(0).map_err(SqlxErrorExt::into_data_error)?;
        Ok(count.max(0) as u64)
    }

    async fn save(&self, entity: E, reload: bool) -> Result<E, DataError> {
        let row = self.insert_row(&entity)?;
        let id_column = self.column(self.metadata.id_column());
        let id = row.get(&id_column).cloned().unwrap_or(Value::Null);
        let version_column = self.metadata.version_column().map(|v| self.column(v));
        let (sql, params) = self
            .builder()
            .build_upsert(&row, &id_column, version_column.as_deref())?;
        tracing::debug!(table = self.metadata.table(), %sql, "save");
        bind_all(&sql, params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        if !reload {
            return self.to_entity(row);
        }

        // Re-read through the table so declared column types drive decoding.
        let by_id = Condition::All(vec![Comparison::new(id_column, FindOperator::Equal(id))]);
        let (sql, params) = self.builder().filter(by_id).limit(1).build_select()?;
        let stored = bind_all(&sql, params)
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        self.to_entity(row_to_record(&stored)?)
    }

    async fn update(&self, condition: &Condition, patch: &Patch) -> Result<UpdateResult, DataError> {
        let condition = condition.clone().map_attributes(hump_to_snake_key);
        let patch: Patch = patch
            .iter()
            .map(|(attribute, value)| (self.column(attribute), value.clone()))
            .collect();
        let (sql, params) = self.builder().filter(condition).build_update(&patch)?;
        tracing::debug!(table = self.metadata.table(), %sql, "update");
        let result = bind_all(&sql, params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(UpdateResult {
            affected: result.rows_affected(),
        })
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Value>, DataError> {
        let rows = bind_all(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter()
            .map(|row| row_to_record(row).map(Value::Object))
            .collect()
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DataError> {
        let result = bind_all(sql, params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(result.rows_affected())
    }
}
