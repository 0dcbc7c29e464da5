extern crate proc_macro;
use proc_macro::TokenStream;

pub(crate) mod crate_path;
pub(crate) mod entity_derive;

/// Derive macro that generates an [`Entity`](strata_data::Entity) impl from
/// field annotations.
///
/// Attribute names follow the struct's serde naming (`rename_all` and
/// per-field `rename`), so filters and audit stamps address the same keys
/// the entity serializes to.
///
/// # Struct-level attribute
///
/// | Parameter | Description |
/// |-----------|-------------|
/// | `name = "..."` | Logical entity name (defaults to the struct name) |
/// | `table = "..."` | Table name (defaults to the snake_case entity name) |
/// | `scope(key = value, ...)` | Default filter entries applied to reads |
/// | `scopes_disabled` | Turn default scopes off |
///
/// # Field attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[entity(id)]` | Primary key attribute (defaults to `id`) |
/// | `#[entity(created_by)]` | Stamped with the acting user on create |
/// | `#[entity(updated_by)]` | Stamped with the acting user on update and delete |
/// | `#[entity(version)]` | Optimistic version column |
/// | `#[entity(soft_delete)]` | Set to the current timestamp on delete |
/// | `#[entity(soft_delete = value)]` | Set to `value` on delete |
/// | `#[entity(rename = "...")]` | Override the attribute name |
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Entity)]
/// #[serde(rename_all = "camelCase")]
/// #[entity(table = "orders", scope(deletedAt_eq = null))]
/// pub struct Order {
///     #[entity(id)]
///     pub id: Option<String>,
///     pub status: String,
///     #[entity(created_by)]
///     pub created_by_id: Option<String>,
///     #[entity(updated_by)]
///     pub updated_by_id: Option<String>,
///     #[entity(soft_delete)]
///     pub deleted_at: Option<String>,
///     #[entity(version)]
///     pub version: Option<i64>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity_derive::expand(input)
}
