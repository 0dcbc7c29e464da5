//! Raw compilation of filters into SQL fragments with named parameters.
//!
//! Each fragment references its operand as `:name` (or `:...name` for lists).
//! Names are `<key>_<suffix>` where the suffix encodes a running index, so a
//! filter that repeats a key across OR groups still binds distinct names.
//! [`crate::query::QueryBuilder::raw_where`] resolves the names to dialect
//! placeholders.

use crate::filter::{in_values, like_pattern, split_key, FilterOp, Record, Where};
use serde_json::{Map, Value};

/// One compiled SQL fragment and the parameters it references.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCondition {
    pub condition: String,
    pub params: Record,
}

/// Raw form of a [`Where`], with the same AND / OR-of-AND shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawWhere {
    All(Vec<RawCondition>),
    Any(Vec<Vec<RawCondition>>),
}

impl RawWhere {
    pub fn is_empty(&self) -> bool {
        match self {
            RawWhere::All(items) => items.is_empty(),
            RawWhere::Any(groups) => groups.iter().all(|g| g.is_empty()),
        }
    }

    /// Join the fragments into one boolean expression and collect every
    /// parameter. Returns an empty string when there is nothing to filter.
    pub fn render(&self) -> (String, Record) {
        if self.is_empty() {
            return (String::new(), Map::new());
        }
        let mut params = Map::new();
        let mut join = |items: &[RawCondition]| {
            let parts: Vec<&str> = items
                .iter()
                .map(|c| {
                    params.extend(c.params.clone());
                    c.condition.as_str()
                })
                .collect();
            parts.join(" AND ")
        };
        let sql = match self {
            RawWhere::All(items) => join(items),
            RawWhere::Any(groups) => groups
                .iter()
                .map(|g| {
                    if g.is_empty() {
                        "1 = 1".to_string()
                    } else {
                        format!("({})", join(g))
                    }
                })
                .collect::<Vec<_>>()
                .join(" OR "),
        };
        (sql, params)
    }
}

/// Encode `index` by mapping each decimal digit to a letter (`0` -> `A`).
///
/// `0` -> `A`, `12` -> `BC`. The result never contains `_` or a digit.
pub fn param_suffix(index: usize) -> String {
    index
        .to_string()
        .bytes()
        .map(|digit| (b'A' + (digit - b'0')) as char)
        .collect()
}

/// Compile one filter key into a SQL fragment.
///
/// The attribute is spliced into the fragment verbatim; callers that accept
/// untrusted keys must validate it (the query builder does).
pub fn where_operator(key: &str, value: Value, suffix: &str) -> RawCondition {
    let (attr, op) = split_key(key);
    let name = format!("{key}_{suffix}");
    let bound = |condition: String, value: Value| {
        let mut params = Map::new();
        params.insert(name.clone(), value);
        RawCondition { condition, params }
    };
    let unbound = |condition: String| RawCondition {
        condition,
        params: Map::new(),
    };

    match op {
        None | Some(FilterOp::Eq) if value.is_null() => unbound(format!("{attr} IS NULL")),
        None | Some(FilterOp::Eq) => bound(format!("{attr} = :{name}"), value),
        Some(FilterOp::Not) if value.is_null() => unbound(format!("{attr} IS NOT NULL")),
        Some(FilterOp::Not) => bound(format!("{attr} != :{name}"), value),
        Some(FilterOp::Lt) => bound(format!("{attr} < :{name}"), value),
        Some(FilterOp::Lte) => bound(format!("{attr} <= :{name}"), value),
        Some(FilterOp::Gt) => bound(format!("{attr} > :{name}"), value),
        Some(FilterOp::Gte) => bound(format!("{attr} >= :{name}"), value),
        Some(FilterOp::In) => bound(
            format!("{attr} IN (:...{name})"),
            Value::Array(in_values(value)),
        ),
        Some(op @ (FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith)) => {
            let pattern = like_pattern(op, &value);
            bound(
                format!("LOWER({attr}) LIKE :{name} ESCAPE '\\'"),
                Value::String(pattern),
            )
        }
    }
}

/// Compile a whole filter into raw fragments, numbering parameters from
/// `start_index` across all groups.
pub fn build_where_condition(filter: &Where, start_index: usize) -> RawWhere {
    let mut index = start_index;
    let mut compile = |record: &Record| {
        record
            .iter()
            .map(|(k, v)| {
                let cond = where_operator(k, v.clone(), &param_suffix(index));
                index += 1;
                cond
            })
            .collect::<Vec<_>>()
    };
    match filter {
        Where::All(record) => RawWhere::All(compile(record)),
        Where::Any(groups) if groups.is_empty() => RawWhere::All(Vec::new()),
        Where::Any(groups) => RawWhere::Any(groups.iter().map(&mut compile).collect()),
    }
}
