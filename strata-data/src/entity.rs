use crate::error::DataError;
use crate::filter::{compile_where, Comparison, Condition, Record, Where};
use crate::repository::{Patch, PatchValue};
use convert_case::{Case, Casing};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A persisted record type managed by a [`crate::Service`].
///
/// Attribute names seen by filters, patches and projections are the names
/// the type serializes to, conventionally camelCase
/// (`#[serde(rename_all = "camelCase")]`). Fields filled in by storage (id,
/// timestamps, version) should be `Option` or `#[serde(default)]` so that
/// unsaved instances can be built from partial data.
///
/// Usually derived with `#[derive(Entity)]`.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Order {
///     id: Option<String>,
///     total: i64,
///     updated_by_id: Option<String>,
///     deleted_at: Option<String>,
/// }
///
/// impl Entity for Order {
///     fn metadata() -> EntityMetadata {
///         EntityMetadata::builder("Order")
///             .table("orders")
///             .updated_by("updatedById")
///             .soft_delete("deletedAt", SoftDeleteValue::Now)
///             .build()
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    fn metadata() -> EntityMetadata;
}

/// Value written to a soft-delete attribute when a row is deleted.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftDeleteValue {
    /// Current storage timestamp.
    Now,
    Value(Value),
}

impl From<SoftDeleteValue> for PatchValue {
    fn from(value: SoftDeleteValue) -> Self {
        match value {
            SoftDeleteValue::Now => PatchValue::Now,
            SoftDeleteValue::Value(v) => PatchValue::Value(v),
        }
    }
}

/// Per-entity conventions: id, audit, soft-delete and version attributes
/// plus default scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    name: String,
    table: String,
    id_column: String,
    created_by: Option<String>,
    updated_by: Option<String>,
    soft_delete: Vec<(String, SoftDeleteValue)>,
    version_column: Option<String>,
    scopes: Record,
    scopes_enabled: bool,
}

impl EntityMetadata {
    /// Start describing entity `name`. The table defaults to the snake_case
    /// name and the id attribute to `id`.
    pub fn builder(name: &str) -> EntityMetadataBuilder {
        EntityMetadataBuilder {
            meta: EntityMetadata {
                name: name.to_string(),
                table: name.to_case(Case::Snake),
                id_column: "id".to_string(),
                created_by: None,
                updated_by: None,
                soft_delete: Vec::new(),
                version_column: None,
                scopes: Record::new(),
                scopes_enabled: true,
            },
        }
    }

    /// Preset for entities built on the common base columns: `id`,
    /// `createdById`, `updatedById`, `deletedAt` (soft delete, set to now)
    /// and `version`. Scoped reads skip rows whose `deletedAt` is set.
    pub fn basic(name: &str) -> EntityMetadataBuilder {
        Self::builder(name)
            .created_by("createdById")
            .updated_by("updatedById")
            .soft_delete("deletedAt", SoftDeleteValue::Now)
            .version_column("version")
            .scope("deletedAt", Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn updated_by(&self) -> Option<&str> {
        self.updated_by.as_deref()
    }

    pub fn soft_delete(&self) -> &[(String, SoftDeleteValue)] {
        &self.soft_delete
    }

    pub fn has_soft_delete(&self) -> bool {
        !self.soft_delete.is_empty()
    }

    pub fn version_column(&self) -> Option<&str> {
        self.version_column.as_deref()
    }

    pub fn scopes(&self) -> &Record {
        &self.scopes
    }

    pub fn scopes_enabled(&self) -> bool {
        self.scopes_enabled
    }

    /// Comparisons every scoped query is ANDed with. Empty when scopes are
    /// disabled or none are registered.
    pub fn scope_comparisons(&self) -> Vec<Comparison> {
        if !self.scopes_enabled || self.scopes.is_empty() {
            return Vec::new();
        }
        match compile_where(&Where::All(self.scopes.clone())) {
            Condition::All(items) => items,
            Condition::Any(groups) => groups.into_iter().flatten().collect(),
        }
    }

    /// Assignments that mark a row as deleted.
    pub fn soft_delete_patch(&self) -> Result<Patch, DataError> {
        if self.soft_delete.is_empty() {
            return Err(DataError::configuration(
                &self.name,
                "no soft-delete column registered",
            ));
        }
        Ok(self
            .soft_delete
            .iter()
            .map(|(attr, value)| (attr.clone(), PatchValue::from(value.clone())))
            .collect())
    }
}

pub struct EntityMetadataBuilder {
    meta: EntityMetadata,
}

impl EntityMetadataBuilder {
    pub fn table(mut self, table: &str) -> Self {
        self.meta.table = table.to_string();
        self
    }

    pub fn id_column(mut self, attribute: &str) -> Self {
        self.meta.id_column = attribute.to_string();
        self
    }

    pub fn created_by(mut self, attribute: &str) -> Self {
        self.meta.created_by = Some(attribute.to_string());
        self
    }

    pub fn updated_by(mut self, attribute: &str) -> Self {
        self.meta.updated_by = Some(attribute.to_string());
        self
    }

    /// Register a soft-delete attribute. May be called several times.
    pub fn soft_delete(mut self, attribute: &str, value: SoftDeleteValue) -> Self {
        match self.meta.soft_delete.iter_mut().find(|(a, _)| a == attribute) {
            Some(slot) => slot.1 = value,
            None => self.meta.soft_delete.push((attribute.to_string(), value)),
        }
        self
    }

    pub fn version_column(mut self, attribute: &str) -> Self {
        self.meta.version_column = Some(attribute.to_string());
        self
    }

    /// Add a default filter entry, e.g. `scope("deletedAt", Value::Null)`.
    pub fn scope(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.scopes.insert(key.to_string(), value.into());
        self
    }

    pub fn scopes_enabled(mut self, enabled: bool) -> Self {
        self.meta.scopes_enabled = enabled;
        self
    }

    pub fn build(self) -> EntityMetadata {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FindOperator;
    use serde_json::json;

    #[test]
    fn builder_defaults() {
        let meta = EntityMetadata::builder("OrderLine").build();
        assert_eq!(meta.table(), "order_line");
        assert_eq!(meta.id_column(), "id");
        assert!(meta.created_by().is_none());
        assert!(!meta.has_soft_delete());
        assert!(meta.scope_comparisons().is_empty());
    }

    #[test]
    fn basic_preset_registers_base_columns() {
        let meta = EntityMetadata::basic("Order").table("orders").build();
        assert_eq!(meta.created_by(), Some("createdById"));
        assert_eq!(meta.updated_by(), Some("updatedById"));
        assert_eq!(meta.version_column(), Some("version"));
        assert_eq!(
            meta.soft_delete_patch().unwrap(),
            Patch::new().with("deletedAt", PatchValue::Now)
        );
        assert_eq!(
            meta.scope_comparisons(),
            vec![Comparison::new("deletedAt", FindOperator::IsNull)]
        );
    }

    #[test]
    fn soft_delete_patch_without_column_names_the_entity() {
        let err = EntityMetadata::builder("Invoice")
            .build()
            .soft_delete_patch()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Invoice"));
    }

    #[test]
    fn soft_delete_with_literal_value() {
        let meta = EntityMetadata::builder("Task")
            .soft_delete("status", SoftDeleteValue::Value(json!(0)))
            .build();
        assert_eq!(
            meta.soft_delete_patch().unwrap().get("status"),
            Some(&PatchValue::Value(json!(0)))
        );
    }

    #[test]
    fn scopes_compile_and_can_be_disabled() {
        let builder = EntityMetadata::builder("Task")
            .scope("deletedAt", Value::Null)
            .scope("tenant_in", json!(["a", "b"]));
        let comparisons = builder.meta.clone().scope_comparisons();
        assert_eq!(comparisons.len(), 2);
        assert!(comparisons
            .iter()
            .any(|c| c.attribute == "deletedAt" && c.operator == FindOperator::IsNull));

        let disabled = builder.scopes_enabled(false).build();
        assert!(disabled.scope_comparisons().is_empty());
    }
}
