use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::ParseStream;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::crate_path::strata_data_path;

pub fn expand(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate(&input) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Struct-level `#[entity(...)]` settings.
#[derive(Default)]
struct EntityAttrs {
    name: Option<String>,
    table: Option<String>,
    scopes: Vec<(String, syn::Expr)>,
    scopes_disabled: bool,
}

/// Role a field plays in the generated metadata.
struct FieldRole {
    attribute: String,
    field: syn::Ident,
    id: bool,
    created_by: bool,
    updated_by: bool,
    version: bool,
    /// `Some(None)` marks the field with the current timestamp on delete.
    soft_delete: Option<Option<syn::Expr>>,
}

/// Consume a nested meta item we do not interpret (foreign serde options).
fn skip_meta(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

fn parse_entity_attrs(input: &DeriveInput) -> syn::Result<EntityAttrs> {
    let mut attrs = EntityAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                attrs.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("table") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                attrs.table = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("scopes_disabled") {
                attrs.scopes_disabled = true;
                Ok(())
            } else if meta.path.is_ident("scope") {
                meta.parse_nested_meta(|scope| {
                    let key = scope
                        .path
                        .get_ident()
                        .map(|ident| ident.to_string())
                        .ok_or_else(|| scope.error("scope keys are plain filter keys"))?;
                    let value: syn::Expr = scope.value()?.parse()?;
                    attrs.scopes.push((key, value));
                    Ok(())
                })
            } else {
                Err(meta.error(
                    "expected `name`, `table`, `scope(...)` or `scopes_disabled` in #[entity(...)]",
                ))
            }
        })?;
    }
    Ok(attrs)
}

/// The serde `rename_all` rule of the struct, if any.
fn serde_rename_all(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut rule = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                rule = Some(lit.value());
                Ok(())
            } else {
                skip_meta(&meta)
            }
        })?;
    }
    Ok(rule)
}

/// Apply a serde `rename_all` rule to a snake_case field name.
fn apply_rename_rule(field: &str, rule: Option<&str>) -> syn::Result<String> {
    let renamed = match rule {
        None => field.to_string(),
        Some("lowercase") => field.to_lowercase(),
        Some("UPPERCASE") => field.to_uppercase(),
        Some("camelCase") => field.from_case(Case::Snake).to_case(Case::Camel),
        Some("PascalCase") => field.from_case(Case::Snake).to_case(Case::Pascal),
        Some("snake_case") => field.to_string(),
        Some("SCREAMING_SNAKE_CASE") => field.to_uppercase(),
        Some("kebab-case") => field.replace('_', "-"),
        Some("SCREAMING-KEBAB-CASE") => field.replace('_', "-").to_uppercase(),
        Some(other) => {
            return Err(syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("unsupported serde rename_all rule `{other}`"),
            ))
        }
    };
    Ok(renamed)
}

fn parse_field(field: &syn::Field, rule: Option<&str>) -> syn::Result<FieldRole> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "tuple fields are not supported"))?;
    let raw_name = ident.to_string();
    let raw_name = raw_name.strip_prefix("r#").unwrap_or(&raw_name);

    let mut serde_rename = None;
    let mut entity_rename = None;
    let mut role = FieldRole {
        attribute: String::new(),
        field: ident,
        id: false,
        created_by: false,
        updated_by: false,
        version: false,
        soft_delete: None,
    };

    for attr in &field.attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    serde_rename = Some(lit.value());
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        } else if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    role.id = true;
                } else if meta.path.is_ident("created_by") {
                    role.created_by = true;
                } else if meta.path.is_ident("updated_by") {
                    role.updated_by = true;
                } else if meta.path.is_ident("version") {
                    role.version = true;
                } else if meta.path.is_ident("soft_delete") {
                    let value = if meta.input.peek(syn::Token![=]) {
                        let stream: ParseStream = meta.value()?;
                        Some(stream.parse::<syn::Expr>()?)
                    } else {
                        None
                    };
                    role.soft_delete = Some(value);
                } else if meta.path.is_ident("rename") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    entity_rename = Some(lit.value());
                } else {
                    return Err(meta.error(
                        "expected `id`, `created_by`, `updated_by`, `version`, \
                         `soft_delete` or `rename` in #[entity(...)]",
                    ));
                }
                Ok(())
            })?;
        }
    }

    role.attribute = match entity_rename.or(serde_rename) {
        Some(name) => name,
        None => apply_rename_rule(raw_name, rule)?,
    };
    Ok(role)
}

/// Reject a second field claiming a single-valued role.
fn unique<'a>(
    roles: &'a [FieldRole],
    pick: impl Fn(&FieldRole) -> bool,
    label: &str,
) -> syn::Result<Option<&'a FieldRole>> {
    let mut found = roles.iter().filter(|r| pick(r));
    let first = found.next();
    if let Some(second) = found.next() {
        return Err(syn::Error::new_spanned(
            &second.field,
            format!("only one field may be marked #[entity({label})]"),
        ));
    }
    Ok(first)
}

fn generate(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let data = strata_data_path();
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "#[derive(Entity)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "#[derive(Entity)] can only be used on structs",
            ))
        }
    };

    let attrs = parse_entity_attrs(input)?;
    let rule = serde_rename_all(input)?;
    let roles = fields
        .iter()
        .map(|f| parse_field(f, rule.as_deref()))
        .collect::<syn::Result<Vec<_>>>()?;

    let name = attrs.name.unwrap_or_else(|| ident.to_string());
    let mut chain = Vec::new();

    if let Some(table) = &attrs.table {
        chain.push(quote! { .table(#table) });
    }
    if let Some(role) = unique(&roles, |r| r.id, "id")? {
        let attribute = &role.attribute;
        chain.push(quote! { .id_column(#attribute) });
    }
    if let Some(role) = unique(&roles, |r| r.created_by, "created_by")? {
        let attribute = &role.attribute;
        chain.push(quote! { .created_by(#attribute) });
    }
    if let Some(role) = unique(&roles, |r| r.updated_by, "updated_by")? {
        let attribute = &role.attribute;
        chain.push(quote! { .updated_by(#attribute) });
    }
    if let Some(role) = unique(&roles, |r| r.version, "version")? {
        let attribute = &role.attribute;
        chain.push(quote! { .version_column(#attribute) });
    }
    for role in &roles {
        let attribute = &role.attribute;
        match &role.soft_delete {
            None => {}
            Some(None) => chain.push(quote! {
                .soft_delete(#attribute, #data::SoftDeleteValue::Now)
            }),
            Some(Some(value)) => chain.push(quote! {
                .soft_delete(
                    #attribute,
                    #data::SoftDeleteValue::Value(#data::__private::serde_json::json!(#value)),
                )
            }),
        }
    }
    for (key, value) in &attrs.scopes {
        chain.push(quote! {
            .scope(#key, #data::__private::serde_json::json!(#value))
        });
    }
    if attrs.scopes_disabled {
        chain.push(quote! { .scopes_enabled(false) });
    }

    Ok(quote! {
        impl #impl_generics #data::Entity for #ident #ty_generics #where_clause {
            fn metadata() -> #data::EntityMetadata {
                #data::EntityMetadata::builder(#name)
                    #(#chain)*
                    .build()
            }
        }
    })
}
