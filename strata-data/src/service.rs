//! Generic per-entity service over a [`Repository`].
//!
//! Every operation takes plain data (`Record`, [`Where`]) and an optional
//! acting-user id. Mutations write that id into the entity's created-by /
//! updated-by attribute when one is registered, so callers never set audit
//! fields themselves. The record passed in is owned by the service from
//! then on and is augmented before dispatch.

use crate::case::{snake_to_hump, DEFAULT_CASE_DEPTH};
use crate::entity::Entity;
use crate::error::DataError;
use crate::filter::{compile_where, in_values, Comparison, Condition, FindOperator, Record, Where};
use crate::metadata::MetadataHandle;
use crate::page::{Page, Pageable};
use crate::repository::{FindAndCount, FindOptions, Order, Patch, PatchValue, Repository, UpdateResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Query parameters for the read operations.
///
/// Deserializes from
/// `{ "where": {...} | [...], "select": [...], "orderBy": "age_DESC", "skip": 0, "take": 10, "unscoped": false }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindParams {
    #[serde(rename = "where")]
    pub filter: Where,
    pub select: Vec<String>,
    pub order_by: Option<String>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Skip the entity's default scopes.
    pub unscoped: bool,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<Where>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn select<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.select = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by = Some(order.to_string());
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }
}

impl From<Where> for FindParams {
    fn from(filter: Where) -> Self {
        FindParams::new().filter(filter)
    }
}

/// Target rows of a bulk update or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Id(Value),
    Ids(Vec<Value>),
    Where(Where),
}

impl Criteria {
    fn to_condition(&self, id_column: &str) -> Condition {
        match self {
            Criteria::Id(id) => Condition::All(vec![Comparison::new(
                id_column,
                FindOperator::Equal(id.clone()),
            )]),
            Criteria::Ids(ids) => Condition::All(vec![Comparison::new(
                id_column,
                FindOperator::In(in_values(Value::Array(ids.clone()))),
            )]),
            Criteria::Where(filter) => compile_where(filter),
        }
    }
}

impl From<Where> for Criteria {
    fn from(filter: Where) -> Self {
        Criteria::Where(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Depth used when converting raw query rows to camelCase.
    pub case_depth: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            case_depth: DEFAULT_CASE_DEPTH,
        }
    }
}

pub struct Service<E, R> {
    repository: Arc<R>,
    metadata: MetadataHandle,
    options: ServiceOptions,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for Service<E, R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            metadata: self.metadata.clone(),
            options: self.options,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity, R: Repository<E>> Service<E, R> {
    pub fn new(repository: Arc<R>, metadata: MetadataHandle) -> Self {
        Self::with_options(repository, metadata, ServiceOptions::default())
    }

    pub fn with_options(repository: Arc<R>, metadata: MetadataHandle, options: ServiceOptions) -> Self {
        Self {
            repository,
            metadata,
            options,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn metadata(&self) -> &MetadataHandle {
        &self.metadata
    }

    pub fn options(&self) -> ServiceOptions {
        self.options
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub async fn find(&self, params: FindParams) -> Result<Vec<E>, DataError> {
        tracing::debug!(entity = self.metadata.name(), "find");
        let options = self.find_options(params);
        self.repository.find(&options).await
    }

    pub async fn count(&self, filter: Where) -> Result<u64, DataError> {
        tracing::debug!(entity = self.metadata.name(), "count");
        let options = self.find_options(FindParams::from(filter));
        self.repository.count(&options.condition).await
    }

    pub async fn find_and_count(&self, params: FindParams) -> Result<FindAndCount<E>, DataError> {
        tracing::debug!(entity = self.metadata.name(), "find_and_count");
        let options = self.find_options(params);
        self.repository.find_and_count(&options).await
    }

    pub async fn find_one(&self, params: FindParams) -> Result<Option<E>, DataError> {
        let rows = self.find(params.take(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Find by id. Any filter in `params` is replaced by the id match; the
    /// other parameters apply as given.
    pub async fn find_by_id(&self, id: impl Into<Value>, params: FindParams) -> Result<Option<E>, DataError> {
        let filter = Where::eq(self.metadata.id_column(), id);
        self.find_one(params.filter(filter)).await
    }

    /// One page of results; `pageable.sort` overrides `params.order_by`.
    pub async fn find_page(&self, params: FindParams, pageable: &Pageable) -> Result<Page<E>, DataError> {
        let mut params = params.skip(pageable.offset()).take(pageable.size);
        if let Some(sort) = &pageable.sort {
            params = params.order_by(sort);
        }
        let FindAndCount { rows, count } = self.find_and_count(params).await?;
        Ok(Page::new(rows, pageable, count))
    }

    // ── Writes ─────────────────────────────────────────────────────────

    /// Create and persist one entity, returning the stored row.
    pub async fn create(&self, mut data: Record, user: Option<&str>) -> Result<E, DataError> {
        tracing::debug!(entity = self.metadata.name(), "create");
        self.stamp(&mut data, self.metadata.created_by(), user);
        let entity = self.repository.create(data)?;
        self.repository.save(entity, true).await
    }

    pub async fn create_many(&self, data: Vec<Record>, user: Option<&str>) -> Result<Vec<E>, DataError> {
        tracing::debug!(entity = self.metadata.name(), count = data.len(), "create_many");
        let entities = data
            .into_iter()
            .map(|mut record| {
                self.stamp(&mut record, self.metadata.created_by(), user);
                self.repository.create(record)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.repository.save_many(entities, true).await
    }

    /// Bulk update without read-back.
    pub async fn update(&self, data: Record, criteria: Criteria, user: Option<&str>) -> Result<UpdateResult, DataError> {
        self.update_patch(Patch::from(data), criteria, user).await
    }

    pub async fn update_by_id(&self, data: Record, id: impl Into<Value>, user: Option<&str>) -> Result<Option<E>, DataError> {
        let filter = Where::eq(self.metadata.id_column(), id);
        self.update_one(data, filter, user).await
    }

    /// Read-modify-write of the first match. `Ok(None)` when nothing matches.
    pub async fn update_one(&self, mut data: Record, filter: Where, user: Option<&str>) -> Result<Option<E>, DataError> {
        tracing::debug!(entity = self.metadata.name(), "update_one");
        self.stamp(&mut data, self.metadata.updated_by(), user);
        let Some(found) = self.find_one(FindParams::from(filter)).await? else {
            return Ok(None);
        };
        let merged = self.repository.merge(found, data)?;
        self.repository.save(merged, true).await.map(Some)
    }

    /// Like [`Service::update_one`], but creates from `data` when nothing
    /// matches. The created row is exactly what [`Service::create`] would
    /// produce for the same input.
    pub async fn upsert(&self, mut data: Record, filter: Where, user: Option<&str>) -> Result<E, DataError> {
        tracing::debug!(entity = self.metadata.name(), "upsert");
        let Some(found) = self.find_one(FindParams::from(filter)).await? else {
            return self.create(data, user).await;
        };
        self.stamp(&mut data, self.metadata.updated_by(), user);
        let merged = self.repository.merge(found, data)?;
        self.repository.save(merged, true).await
    }

    /// Soft delete: writes the registered soft-delete values.
    pub async fn delete(&self, criteria: Criteria, user: Option<&str>) -> Result<UpdateResult, DataError> {
        let patch = self.metadata.soft_delete_patch()?;
        self.update_patch(patch, criteria, user).await
    }

    pub async fn delete_by_id(&self, id: impl Into<Value>, user: Option<&str>) -> Result<UpdateResult, DataError> {
        self.delete(Criteria::Id(id.into()), user).await
    }

    /// Raw query; each row is converted to camelCase before deserializing.
    pub async fn query<T: DeserializeOwned>(&self, sql: &str, params: Vec<Value>) -> Result<T, DataError> {
        tracing::debug!(entity = self.metadata.name(), sql, "query");
        let rows = self.repository.query(sql, params).await?;
        let converted = rows
            .iter()
            .map(|row| snake_to_hump(row, self.options.case_depth))
            .collect();
        Ok(serde_json::from_value(Value::Array(converted))?)
    }

    async fn update_patch(&self, mut patch: Patch, criteria: Criteria, user: Option<&str>) -> Result<UpdateResult, DataError> {
        tracing::debug!(entity = self.metadata.name(), "update");
        if let (Some(column), Some(user)) = (self.metadata.updated_by(), user) {
            patch.set(column, PatchValue::Value(Value::from(user)));
        }
        let condition = criteria.to_condition(self.metadata.id_column());
        self.repository.update(&condition, &patch).await
    }

    fn stamp(&self, data: &mut Record, column: Option<&str>, user: Option<&str>) {
        if let (Some(column), Some(user)) = (column, user) {
            data.insert(column.to_string(), Value::from(user));
        }
    }

    fn find_options(&self, params: FindParams) -> FindOptions {
        let mut condition = compile_where(&params.filter);
        if !params.unscoped {
            condition = condition.and(&self.metadata.scope_comparisons());
        }
        let mut select = params.select;
        let id_column = self.metadata.id_column();
        if !select.is_empty() && !select.iter().any(|s| s == id_column) {
            select.push(id_column.to_string());
        }
        FindOptions {
            condition,
            select,
            order: params.order_by.as_deref().map(Order::parse).into_iter().collect(),
            skip: params.skip,
            take: params.take,
        }
    }
}
