use crate::entity::Entity;
use crate::error::DataError;
use crate::filter::{Condition, Record};
use crate::query::Dialect;
use serde_json::Value;
use std::future::Future;

/// Sort direction of an [`Order`] clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse of `ASC` / `DESC`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if text.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Asc
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub attribute: String,
    pub direction: SortDirection,
}

impl Order {
    /// Parse the `<attribute>_ASC|DESC` convention.
    ///
    /// The direction is whatever follows the last underscore. When it is not
    /// a direction the whole text is the attribute, sorted ascending.
    pub fn parse(text: &str) -> Self {
        if let Some((attr, dir)) = text.rsplit_once('_') {
            if let (false, Some(direction)) = (attr.is_empty(), SortDirection::parse(dir)) {
                return Order {
                    attribute: attr.to_string(),
                    direction,
                };
            }
        }
        Order {
            attribute: text.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// Options handed to [`Repository::find`]. Attribute names are application
/// (camelCase) names; translating them to storage columns is up to the
/// repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub condition: Condition,
    /// Empty means every column.
    pub select: Vec<String>,
    pub order: Vec<Order>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

/// Rows of a page together with the unpaginated match count.
#[derive(Debug, Clone, PartialEq)]
pub struct FindAndCount<E> {
    pub rows: Vec<E>,
    pub count: u64,
}

/// Outcome of a bulk update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub affected: u64,
}

/// Value assigned by a [`Patch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Value(Value),
    /// The storage clock at execution time.
    Now,
}

impl From<Value> for PatchValue {
    fn from(value: Value) -> Self {
        PatchValue::Value(value)
    }
}

/// Ordered attribute assignments for a bulk update. Setting an attribute
/// twice keeps its first position and the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: Vec<(String, PatchValue)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<PatchValue>) {
        let attribute = attribute.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(a, _)| *a == attribute) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((attribute, value)),
        }
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&PatchValue> {
        self.entries
            .iter()
            .find(|(a, _)| a == attribute)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatchValue)> {
        self.entries.iter().map(|(a, v)| (a.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Record> for Patch {
    fn from(record: Record) -> Self {
        record.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<PatchValue>> FromIterator<(K, V)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut patch = Patch::new();
        for (k, v) in iter {
            patch.set(k, v);
        }
        patch
    }
}

/// Storage collaborator behind a [`crate::Service`].
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
/// Implementations own the mapping between application attribute names and
/// storage columns.
pub trait Repository<E: Entity>: Send + Sync + 'static {
    /// Stable identity of the backing table on its connection, e.g.
    /// `"default.orders"`. Services are cached under this key.
    fn table_path(&self) -> String;

    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }

    fn find(&self, options: &FindOptions) -> impl Future<Output = Result<Vec<E>, DataError>> + Send;

    fn count(&self, condition: &Condition) -> impl Future<Output = Result<u64, DataError>> + Send;

    fn find_and_count(
        &self,
        options: &FindOptions,
    ) -> impl Future<Output = Result<FindAndCount<E>, DataError>> + Send {
        async move {
            let rows = self.find(options).await?;
            let count = self.count(&options.condition).await?;
            Ok(FindAndCount { rows, count })
        }
    }

    /// Instantiate an unsaved entity from plain data. Nothing is persisted.
    fn create(&self, record: Record) -> Result<E, DataError> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Insert or update `entity`. With `reload` the stored row is returned,
    /// including storage-generated columns.
    fn save(&self, entity: E, reload: bool) -> impl Future<Output = Result<E, DataError>> + Send;

    fn save_many(
        &self,
        entities: Vec<E>,
        reload: bool,
    ) -> impl Future<Output = Result<Vec<E>, DataError>> + Send {
        async move {
            let mut saved = Vec::with_capacity(entities.len());
            for entity in entities {
                saved.push(self.save(entity, reload).await?);
            }
            Ok(saved)
        }
    }

    /// Overlay `record` onto `entity`.
    fn merge(&self, entity: E, record: Record) -> Result<E, DataError> {
        let mut value = serde_json::to_value(entity)?;
        match value.as_object_mut() {
            Some(fields) => fields.extend(record),
            None => {
                return Err(DataError::Serialization(
                    "entity does not serialize to an object".into(),
                ))
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    fn update(
        &self,
        condition: &Condition,
        patch: &Patch,
    ) -> impl Future<Output = Result<UpdateResult, DataError>> + Send;

    /// Raw query, bypassing entity mapping. Rows come back with storage
    /// column names.
    fn query(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<Value>, DataError>> + Send;

    /// Raw statement; returns the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_parses_direction_after_last_underscore() {
        assert_eq!(
            Order::parse("created_at_DESC"),
            Order {
                attribute: "created_at".into(),
                direction: SortDirection::Desc
            }
        );
        assert_eq!(Order::parse("age_asc").direction, SortDirection::Asc);
    }

    #[test]
    fn order_without_direction_is_ascending_on_whole_text() {
        let order = Order::parse("created_at");
        assert_eq!(order.attribute, "created_at");
        assert!(order.direction.is_ascending());
        assert_eq!(Order::parse("_DESC").attribute, "_DESC");
    }

    #[test]
    fn patch_keeps_first_position_and_last_value() {
        let patch = Patch::new()
            .with("a", json!(1))
            .with("b", PatchValue::Now)
            .with("a", json!(2));
        let entries: Vec<_> = patch.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a", &PatchValue::Value(json!(2))));
        assert_eq!(patch.get("b"), Some(&PatchValue::Now));
    }
}
