//! SQL rendering for compiled filters.
//!
//! # Example
//!
//! ```ignore
//! let cond = compile_where(&Where::try_from(json!({ "status": "open", "total_gte": 10 }))?);
//! let (sql, params) = QueryBuilder::new("orders")
//!     .dialect(Dialect::Postgres)
//!     .filter(cond)
//!     .order_by("id", true)
//!     .limit(10)
//!     .build_select()?;
//! // SELECT * FROM orders WHERE status = $1 AND NOT (total < $2) ORDER BY id ASC LIMIT 10
//! ```

use crate::filter::{Comparison, Condition, FindOperator, Record, Where};
use crate::raw::build_where_condition;
use crate::repository::{Patch, PatchValue};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// `LIMIT` clause needed before a bare `OFFSET`, if any.
    fn unbounded_limit(self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some(" LIMIT -1"),
            Dialect::MySql => Some(" LIMIT 18446744073709551615"),
            Dialect::Generic | Dialect::Postgres => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Validate identifiers against a conservative pattern.
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    Quote,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    condition: Condition,
    raw: Vec<Where>,
    select: Vec<String>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            condition: Condition::default(),
            raw: Vec::new(),
            select: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Validate,
        }
    }

    /// Create a new builder with an explicit SQL dialect.
    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    /// Set the SQL dialect (affects placeholder style and quoting).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Configure identifier quoting.
    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    /// Replace the structured condition.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// AND comparisons into every group of the structured condition.
    pub fn and_where(mut self, comparisons: &[Comparison]) -> Self {
        self.condition = self.condition.and(comparisons);
        self
    }

    /// AND a filter compiled through the raw form. Attributes are checked
    /// when the query is built.
    pub fn raw_where(mut self, filter: Where) -> Self {
        self.raw.push(filter);
        self
    }

    /// Projected columns. Empty selects `*`.
    pub fn select<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.select = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    pub fn build_select(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.format_identifier_checked(&self.table, false, "table")?;
        let columns = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.format_column_list_checked(&self.select)?
        };
        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        self.append_where_checked(&mut sql, &mut params)?;
        self.append_order_checked(&mut sql)?;
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    /// Build a COUNT query returning `(sql, bind_values)`.
    pub fn build_count(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.format_identifier_checked(&self.table, false, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        let mut params = Vec::new();
        self.append_where_checked(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build an UPDATE of every row matching the conditions.
    /// [`PatchValue::Now`] renders as `CURRENT_TIMESTAMP`.
    pub fn build_update(&self, patch: &Patch) -> Result<(String, Vec<Value>), QueryError> {
        if patch.is_empty() {
            return Err(QueryError::EmptyPatch);
        }
        let table = self.format_identifier_checked(&self.table, false, "table")?;
        let mut params = Vec::new();
        let mut assignments = Vec::with_capacity(patch.len());
        for (column, value) in patch.iter() {
            let column = self.format_identifier_checked(column, false, "column")?;
            match value {
                PatchValue::Now => assignments.push(format!("{column} = CURRENT_TIMESTAMP")),
                PatchValue::Value(v) => {
                    let placeholder = self.bind(&mut params, v.clone());
                    assignments.push(format!("{column} = {placeholder}"));
                }
            }
        }
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        self.append_where_checked(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build an `INSERT ... ON CONFLICT ... DO UPDATE ... RETURNING *`.
    ///
    /// Null values are left out of the insert so column defaults apply, and
    /// are written as `NULL` on conflict. Every other column except
    /// `conflict_column` is overwritten on conflict. `version_column`, when
    /// given, is incremented on conflict instead of overwritten.
    pub fn build_upsert(
        &self,
        row: &Record,
        conflict_column: &str,
        version_column: Option<&str>,
    ) -> Result<(String, Vec<Value>), QueryError> {
        if row.is_empty() {
            return Err(QueryError::EmptyPatch);
        }
        let table = self.format_identifier_checked(&self.table, false, "table")?;
        let conflict = self.format_identifier_checked(conflict_column, false, "column")?;
        let version = version_column
            .map(|v| self.format_identifier_checked(v, false, "column"))
            .transpose()?;

        let mut params = Vec::new();
        let mut columns = Vec::with_capacity(row.len());
        let mut placeholders = Vec::with_capacity(row.len());
        let mut assignments = Vec::new();
        for (column, value) in row {
            let quoted = self.format_identifier_checked(column, false, "column")?;
            let overwrite = quoted != conflict && Some(&quoted) != version.as_ref();
            if value.is_null() {
                if overwrite {
                    assignments.push(format!("{quoted} = NULL"));
                }
                continue;
            }
            placeholders.push(self.bind(&mut params, value.clone()));
            if overwrite {
                assignments.push(format!("{quoted} = excluded.{quoted}"));
            }
            columns.push(quoted);
        }
        if columns.is_empty() {
            return Err(QueryError::EmptyPatch);
        }
        if let Some(version) = &version {
            let current = match self.dialect {
                Dialect::Postgres => format!("{table}.{version}"),
                _ => version.clone(),
            };
            assignments.push(format!("{version} = COALESCE({current}, 0) + 1"));
        }
        if assignments.is_empty() {
            assignments.push(format!("{conflict} = excluded.{conflict}"));
        }
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT({conflict}) DO UPDATE SET {} RETURNING *",
            columns.join(", "),
            placeholders.join(", "),
            assignments.join(", ")
        );
        Ok((sql, params))
    }

    fn bind(&self, params: &mut Vec<Value>, value: Value) -> String {
        params.push(value);
        self.dialect.placeholder(params.len())
    }

    fn append_where_checked(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<(), QueryError> {
        let mut clauses = Vec::new();
        if !self.condition.is_empty() {
            clauses.push(self.render_condition(&self.condition, params)?);
        }
        let mut start_index = 0;
        for filter in &self.raw {
            if filter.is_empty() {
                continue;
            }
            self.check_filter_keys(filter)?;
            let raw = build_where_condition(filter, start_index);
            let (fragment, named) = raw.render();
            start_index += named.len();
            clauses.push(self.resolve_named(&fragment, &named, params)?);
        }
        match clauses.len() {
            0 => {}
            1 => {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses[0]);
            }
            _ => {
                let wrapped: Vec<String> = clauses.iter().map(|c| format!("({c})")).collect();
                sql.push_str(" WHERE ");
                sql.push_str(&wrapped.join(" AND "));
            }
        }
        Ok(())
    }

    fn render_condition(&self, condition: &Condition, params: &mut Vec<Value>) -> Result<String, QueryError> {
        let groups = condition.groups();
        let mut rendered = Vec::with_capacity(groups.len());
        for group in &groups {
            if group.is_empty() {
                rendered.push("1 = 1".to_string());
                continue;
            }
            let mut parts = Vec::with_capacity(group.len());
            for cmp in group.iter() {
                let column = self.format_identifier_checked(&cmp.attribute, false, "column")?;
                parts.push(self.render_operator(&column, &cmp.operator, params));
            }
            rendered.push(parts.join(" AND "));
        }
        if rendered.len() == 1 {
            return Ok(rendered.remove(0));
        }
        Ok(rendered
            .into_iter()
            .map(|g| format!("({g})"))
            .collect::<Vec<_>>()
            .join(" OR "))
    }

    fn render_operator(&self, column: &str, operator: &FindOperator, params: &mut Vec<Value>) -> String {
        match operator {
            FindOperator::IsNull => format!("{column} IS NULL"),
            FindOperator::Equal(v) => format!("{column} = {}", self.bind(params, v.clone())),
            FindOperator::LessThan(v) => format!("{column} < {}", self.bind(params, v.clone())),
            FindOperator::MoreThan(v) => format!("{column} > {}", self.bind(params, v.clone())),
            FindOperator::In(values) if values.is_empty() => "1 = 0".to_string(),
            FindOperator::In(values) => {
                let placeholders: Vec<_> = values.iter().map(|v| self.bind(params, v.clone())).collect();
                format!("{column} IN ({})", placeholders.join(", "))
            }
            FindOperator::ILike(pattern) => format!(
                "LOWER({column}) LIKE {} ESCAPE '\\'",
                self.bind(params, Value::String(pattern.clone()))
            ),
            FindOperator::Not(inner) => match inner.as_ref() {
                FindOperator::IsNull => format!("{column} IS NOT NULL"),
                FindOperator::Equal(v) => format!("{column} != {}", self.bind(params, v.clone())),
                other => format!("NOT ({})", self.render_operator(column, other, params)),
            },
        }
    }

    fn check_filter_keys(&self, filter: &Where) -> Result<(), QueryError> {
        let records: Vec<&Record> = match filter {
            Where::All(record) => vec![record],
            Where::Any(groups) => groups.iter().collect(),
        };
        for key in records.iter().flat_map(|r| r.keys()) {
            let (attr, _) = crate::filter::split_key(key);
            if !is_valid_identifier(attr, false) {
                return Err(QueryError::InvalidIdentifier {
                    kind: "column",
                    ident: attr.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Replace `:name` and `:...name` references with dialect placeholders,
    /// in textual order. List parameters expand to one placeholder per item.
    fn resolve_named(&self, fragment: &str, named: &Record, params: &mut Vec<Value>) -> Result<String, QueryError> {
        let mut out = String::with_capacity(fragment.len());
        let mut in_quote = false;
        let mut rest = fragment;
        while let Some(c) = rest.chars().next() {
            rest = &rest[c.len_utf8()..];
            if c == '\'' {
                in_quote = !in_quote;
                out.push(c);
                continue;
            }
            if c != ':' || in_quote || rest.starts_with(':') {
                out.push(c);
                continue;
            }
            let (spread, after) = match rest.strip_prefix("...") {
                Some(after) => (true, after),
                None => (false, rest),
            };
            let len = after
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                out.push(c);
                continue;
            }
            let name = &after[..len];
            rest = &after[len..];
            let value = named
                .get(name)
                .ok_or_else(|| QueryError::MissingParameter(name.to_string()))?;
            match (spread, value) {
                (true, Value::Array(items)) => {
                    let placeholders: Vec<_> = items.iter().map(|v| self.bind(params, v.clone())).collect();
                    out.push_str(&placeholders.join(", "));
                }
                (_, v) => out.push_str(&self.bind(params, v.clone())),
            }
        }
        Ok(out)
    }

    fn append_order_checked(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        sql.push_str(" ORDER BY ");
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.format_identifier_checked(col, false, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        if let Some(limit) = self.limit_val {
            sql.push_str(&format!(" LIMIT {limit}"));
        } else if self.offset_val.is_some() {
            if let Some(clause) = self.dialect.unbounded_limit() {
                sql.push_str(clause);
            }
        }
        if let Some(offset) = self.offset_val {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn format_column_list_checked(&self, columns: &[String]) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(self.format_identifier_checked(col, true, "column")?);
        }
        Ok(out.join(", "))
    }

    fn format_identifier_checked(
        &self,
        ident: &str,
        allow_star: bool,
        kind: &'static str,
    ) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect, allow_star)),
            IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// A raw fragment references a parameter that was not bound.
    MissingParameter(String),
    /// UPDATE or INSERT with nothing to assign.
    EmptyPatch,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::MissingParameter(name) => write!(f, "Missing parameter: {name}"),
            QueryError::EmptyPatch => write!(f, "Nothing to assign"),
        }
    }
}

impl std::error::Error for QueryError {}

pub(crate) fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
    }
    true
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::compile_where;
    use serde_json::json;

    fn cond(value: Value) -> Condition {
        compile_where(&Where::try_from(value).unwrap())
    }

    fn raw(value: Value) -> Where {
        Where::try_from(value).unwrap()
    }

    #[test]
    fn simple_select() {
        let (sql, params) = QueryBuilder::new("users").build_select().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn structured_filter() {
        let (sql, params) = QueryBuilder::new("users")
            .filter(cond(json!({ "age_gte": 18, "name_contains": "Ann" })))
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE NOT (age < ?) AND LOWER(name) LIKE ? ESCAPE '\\'"
        );
        assert_eq!(params, vec![json!(18), json!("%ann%")]);
    }

    #[test]
    fn or_groups_and_nulls() {
        let (sql, params) = QueryBuilder::new("orders")
            .filter(cond(json!([
                { "status": "open", "deletedAt": null },
                { "status_not": "closed", "closedAt_not": null }
            ])))
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM orders WHERE (deletedAt IS NULL AND status = ?) OR (closedAt IS NOT NULL AND status != ?)"
        );
        assert_eq!(params, vec![json!("open"), json!("closed")]);
    }

    #[test]
    fn complex_query() {
        let (sql, params) = QueryBuilder::new("users")
            .filter(cond(json!({ "status": "active" })))
            .select(&["id", "name"])
            .order_by("id", true)
            .limit(10)
            .offset(20)
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT id, name FROM users WHERE status = ? ORDER BY id ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec![json!("active")]);
    }

    #[test]
    fn offset_without_limit() {
        let (sql, _) = QueryBuilder::new_with_dialect("users", Dialect::Sqlite)
            .offset(5)
            .build_select()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT -1 OFFSET 5");
    }

    #[test]
    fn count_query() {
        let (sql, params) = QueryBuilder::new("users")
            .filter(cond(json!({ "active": true })))
            .build_count()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE active = ?");
        assert_eq!(params, vec![json!(true)]);
    }

    #[test]
    fn postgres_placeholders() {
        let (sql, params) = QueryBuilder::new_with_dialect("users", Dialect::Postgres)
            .filter(cond(json!({ "role_in": ["admin", "user"], "status": "active" })))
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE role IN ($1, $2) AND status = $3"
        );
        assert_eq!(params, vec![json!("admin"), json!("user"), json!("active")]);
    }

    #[test]
    fn raw_where_resolves_named_parameters() {
        let (sql, params) = QueryBuilder::new_with_dialect("users", Dialect::Postgres)
            .raw_where(raw(json!([
                { "age_lte": 30, "tag_in": ["a", "b"] },
                { "name_startsWith": "Jo" }
            ])))
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE (age <= $1 AND tag IN ($2, $3)) OR (LOWER(name) LIKE $4 ESCAPE '\\')"
        );
        assert_eq!(params, vec![json!(30), json!("a"), json!("b"), json!("jo%")]);
    }

    #[test]
    fn structured_and_raw_combined() {
        let (sql, params) = QueryBuilder::new("users")
            .filter(cond(json!({ "status": "active" })))
            .raw_where(raw(json!({ "age_gt": 1 })))
            .build_count()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE (status = ?) AND (age > ?)");
        assert_eq!(params, vec![json!("active"), json!(1)]);
    }

    #[test]
    fn raw_where_rejects_bad_attribute() {
        let err = QueryBuilder::new("users")
            .raw_where(raw(json!({ "age; DROP TABLE users": 1 })))
            .build_select()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { .. }));
    }

    #[test]
    fn update_with_now() {
        let patch = Patch::new()
            .with("deleted_at", PatchValue::Now)
            .with("updated_by_id", json!("user-42"));
        let (sql, params) = QueryBuilder::new_with_dialect("orders", Dialect::Postgres)
            .filter(cond(json!({ "id": "abc123" })))
            .build_update(&patch)
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE orders SET deleted_at = CURRENT_TIMESTAMP, updated_by_id = $1 WHERE id = $2"
        );
        assert_eq!(params, vec![json!("user-42"), json!("abc123")]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = QueryBuilder::new("orders").build_update(&Patch::new()).unwrap_err();
        assert_eq!(err, QueryError::EmptyPatch);
    }

    #[test]
    fn upsert() {
        let row = json!({ "id": "o1", "total": 5, "version": 1 });
        let (sql, params) = QueryBuilder::new_with_dialect("orders", Dialect::Sqlite)
            .build_upsert(row.as_object().unwrap(), "id", Some("version"))
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO orders (id, total, version) VALUES (?, ?, ?) ON CONFLICT(id) DO UPDATE SET total = excluded.total, version = COALESCE(version, 0) + 1 RETURNING *"
        );
        assert_eq!(params, vec![json!("o1"), json!(5), json!(1)]);
    }

    #[test]
    fn upsert_clears_null_columns_on_conflict() {
        let row = json!({ "id": "o1", "note": null, "total": 5 });
        let (sql, params) = QueryBuilder::new_with_dialect("orders", Dialect::Sqlite)
            .build_upsert(row.as_object().unwrap(), "id", None)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO orders (id, total) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET note = NULL, total = excluded.total RETURNING *"
        );
        assert_eq!(params, vec![json!("o1"), json!(5)]);
    }

    #[test]
    fn checked_identifiers_and_quoting() {
        let (sql, params) = QueryBuilder::new("users")
            .dialect(Dialect::Postgres)
            .identifier_policy(IdentifierPolicy::Quote)
            .filter(cond(json!({ "email": "a@b.com" })))
            .select(&["users.id", "users.email"])
            .order_by("users.id", true)
            .build_select()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT \"users\".\"id\", \"users\".\"email\" FROM \"users\" WHERE \"email\" = $1 ORDER BY \"users\".\"id\" ASC"
        );
        assert_eq!(params, vec![json!("a@b.com")]);
    }

    #[test]
    fn checked_invalid_identifier() {
        let err = QueryBuilder::new("users;drop").build_select().unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { .. }));
    }
}
