//! Suffix-encoded filter language and its structured compilation target.
//!
//! A filter key is either `<attribute>_<operator>` (`age_gte`, `name_contains`)
//! or a plain `<attribute>` meaning equality. The operator is whatever follows
//! the **last** underscore; when that text is not a known operator the whole
//! key is taken literally as the attribute, so `created_by_id` stays intact.
//!
//! ```ignore
//! let cond = compile_where(&Where::try_from(json!({ "age_gte": 18, "name_contains": "ann" }))?);
//! // age NOT < 18 AND LOWER(name) LIKE '%ann%'
//! ```

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A plain data object (attribute name -> JSON value).
pub type Record = Map<String, Value>;

/// A filter: a flat map (AND across keys) or a list of maps (OR of ANDs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Where {
    Any(Vec<Record>),
    All(Record),
}

impl Default for Where {
    fn default() -> Self {
        Where::All(Map::new())
    }
}

impl Where {
    /// Single equality filter on `attribute`.
    pub fn eq(attribute: &str, value: impl Into<Value>) -> Self {
        let mut record = Map::new();
        record.insert(attribute.to_string(), value.into());
        Where::All(record)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Where::All(record) => record.is_empty(),
            Where::Any(groups) => groups.iter().all(|g| g.is_empty()),
        }
    }
}

impl From<Record> for Where {
    fn from(record: Record) -> Self {
        Where::All(record)
    }
}

impl From<Vec<Record>> for Where {
    fn from(groups: Vec<Record>) -> Self {
        Where::Any(groups)
    }
}

impl TryFrom<Value> for Where {
    type Error = DataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Where::default()),
            Value::Object(record) => Ok(Where::All(record)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(DataError::InvalidInput(format!(
                        "filter groups must be objects, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Where::Any),
            other => Err(DataError::InvalidInput(format!(
                "filter must be an object or a list of objects, got {other}"
            ))),
        }
    }
}

/// Recognized operator suffixes. Aliases collapse onto one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `eq`, `equal`
    Eq,
    Not,
    /// `lt`, `lessThan`
    Lt,
    Lte,
    /// `gt`, `moreThan`
    Gt,
    Gte,
    In,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOp {
    pub fn parse(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "eq" | "equal" => FilterOp::Eq,
            "not" => FilterOp::Not,
            "lt" | "lessThan" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "gt" | "moreThan" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "in" => FilterOp::In,
            "contains" => FilterOp::Contains,
            "startsWith" => FilterOp::StartsWith,
            "endsWith" => FilterOp::EndsWith,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Not => "not",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::In => "in",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startsWith",
            FilterOp::EndsWith => "endsWith",
        }
    }

    fn is_pattern(self) -> bool {
        matches!(
            self,
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith
        )
    }
}

/// Split a filter key into attribute and operator.
///
/// Returns the whole key with `None` when there is no underscore, the suffix
/// is not a known operator, or the attribute part would be empty.
pub fn split_key(key: &str) -> (&str, Option<FilterOp>) {
    match key.rsplit_once('_') {
        Some((attr, suffix)) if !attr.is_empty() => match FilterOp::parse(suffix) {
            Some(op) => (attr, Some(op)),
            None => (key, None),
        },
        _ => (key, None),
    }
}

/// Comparator of a structured condition, consumed by the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum FindOperator {
    Equal(Value),
    IsNull,
    Not(Box<FindOperator>),
    LessThan(Value),
    MoreThan(Value),
    /// Never empty: an empty list compiles to `[null]`, which matches nothing.
    In(Vec<Value>),
    /// Case-insensitive `LIKE`. The pattern is already lower-cased, carries
    /// its `%` padding and escapes literal `%`, `_` and `\` with `\`.
    ILike(String),
}

impl FindOperator {
    pub fn not(inner: FindOperator) -> Self {
        FindOperator::Not(Box::new(inner))
    }
}

/// One compiled `attribute <operator>` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub attribute: String,
    pub operator: FindOperator,
}

impl Comparison {
    pub fn new(attribute: impl Into<String>, operator: FindOperator) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
        }
    }
}

/// Structured form of a [`Where`], with the same AND / OR-of-AND shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    All(Vec<Comparison>),
    Any(Vec<Vec<Comparison>>),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::All(Vec::new())
    }
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::All(items) => items.is_empty(),
            Condition::Any(groups) => groups.iter().all(|g| g.is_empty()),
        }
    }

    /// The OR groups of this condition. `All` is a single group.
    pub fn groups(&self) -> Vec<&[Comparison]> {
        match self {
            Condition::All(items) => vec![items.as_slice()],
            Condition::Any(groups) => groups.iter().map(|g| g.as_slice()).collect(),
        }
    }

    /// AND `extra` into every group.
    pub fn and(self, extra: &[Comparison]) -> Self {
        if extra.is_empty() {
            return self;
        }
        match self {
            Condition::All(mut items) => {
                items.extend_from_slice(extra);
                Condition::All(items)
            }
            Condition::Any(groups) => Condition::Any(
                groups
                    .into_iter()
                    .map(|mut g| {
                        g.extend_from_slice(extra);
                        g
                    })
                    .collect(),
            ),
        }
    }

    /// Rename every attribute, e.g. to storage column names.
    pub fn map_attributes(self, f: impl Fn(&str) -> String) -> Self {
        let rename = |items: Vec<Comparison>| {
            items
                .into_iter()
                .map(|c| Comparison::new(f(&c.attribute), c.operator))
                .collect::<Vec<_>>()
        };
        match self {
            Condition::All(items) => Condition::All(rename(items)),
            Condition::Any(groups) => Condition::Any(groups.into_iter().map(rename).collect()),
        }
    }
}

/// Compile one filter key and value into a structured comparison.
pub fn find_operator(key: &str, value: Value) -> Comparison {
    let (attr, op) = split_key(key);
    let Some(op) = op else {
        return Comparison::new(attr, equality(value));
    };
    let operator = match op {
        FilterOp::Eq => equality(value),
        FilterOp::Not => FindOperator::not(equality(value)),
        FilterOp::Lt => FindOperator::LessThan(value),
        FilterOp::Lte => FindOperator::not(FindOperator::MoreThan(value)),
        FilterOp::Gt => FindOperator::MoreThan(value),
        FilterOp::Gte => FindOperator::not(FindOperator::LessThan(value)),
        FilterOp::In => FindOperator::In(in_values(value)),
        FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => {
            FindOperator::ILike(like_pattern(op, &value))
        }
    };
    Comparison::new(attr, operator)
}

/// Compile a whole filter, preserving its shape. Keys are never merged:
/// `age_gte` and `age_lte` yield two comparisons on `age`.
pub fn compile_where(filter: &Where) -> Condition {
    let compile = |record: &Record| {
        record
            .iter()
            .map(|(k, v)| find_operator(k, v.clone()))
            .collect::<Vec<_>>()
    };
    match filter {
        Where::All(record) => Condition::All(compile(record)),
        Where::Any(groups) if groups.is_empty() => Condition::default(),
        Where::Any(groups) => Condition::Any(groups.iter().map(compile).collect()),
    }
}

fn equality(value: Value) -> FindOperator {
    if value.is_null() {
        FindOperator::IsNull
    } else {
        FindOperator::Equal(value)
    }
}

pub(crate) fn in_values(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) if items.is_empty() => vec![Value::Null],
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Lower-cased, escaped and `%`-padded pattern for a pattern operator.
pub(crate) fn like_pattern(op: FilterOp, value: &Value) -> String {
    debug_assert!(op.is_pattern());
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let escaped = escape_like(&text.to_lowercase());
    match op {
        FilterOp::StartsWith => format!("{escaped}%"),
        FilterOp::EndsWith => format!("%{escaped}"),
        _ => format!("%{escaped}%"),
    }
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: Value) -> Where {
        Where::try_from(value).unwrap()
    }

    #[test]
    fn null_under_eq_is_an_is_null_check() {
        for key in ["deletedAt_eq", "deletedAt_equal", "deletedAt"] {
            let cmp = find_operator(key, Value::Null);
            assert_eq!(cmp, Comparison::new("deletedAt", FindOperator::IsNull), "{key}");
        }
    }

    #[test]
    fn null_under_not_is_an_is_not_null_check() {
        let cmp = find_operator("deletedAt_not", Value::Null);
        assert_eq!(cmp.operator, FindOperator::not(FindOperator::IsNull));
    }

    #[test]
    fn unknown_suffix_keeps_the_whole_key() {
        for key in ["created_by_id", "status_foo", "plain", "_eq"] {
            let cmp = find_operator(key, json!(1));
            assert_eq!(cmp, Comparison::new(key, FindOperator::Equal(json!(1))), "{key}");
        }
    }

    #[test]
    fn range_operators_reuse_two_primitives() {
        assert_eq!(
            find_operator("age_lte", json!(30)).operator,
            FindOperator::not(FindOperator::MoreThan(json!(30)))
        );
        assert_eq!(
            find_operator("age_gte", json!(18)).operator,
            FindOperator::not(FindOperator::LessThan(json!(18)))
        );
        assert_eq!(
            find_operator("age_lessThan", json!(5)).operator,
            FindOperator::LessThan(json!(5))
        );
        assert_eq!(
            find_operator("age_moreThan", json!(5)).operator,
            FindOperator::MoreThan(json!(5))
        );
    }

    #[test]
    fn in_operator_normalizes_its_operand() {
        assert_eq!(
            find_operator("status_in", json!([1, 2])).operator,
            FindOperator::In(vec![json!(1), json!(2)])
        );
        assert_eq!(
            find_operator("status_in", json!([])).operator,
            FindOperator::In(vec![Value::Null])
        );
        assert_eq!(
            find_operator("status_in", json!(3)).operator,
            FindOperator::In(vec![json!(3)])
        );
    }

    #[test]
    fn pattern_operators_are_case_insensitive_and_escaped() {
        assert_eq!(
            find_operator("name_contains", json!("AnN")).operator,
            FindOperator::ILike("%ann%".into())
        );
        assert_eq!(
            find_operator("name_startsWith", json!("Jo")).operator,
            FindOperator::ILike("jo%".into())
        );
        assert_eq!(
            find_operator("name_endsWith", json!("50%_off")).operator,
            FindOperator::ILike("%50\\%\\_off".into())
        );
    }

    #[test]
    fn flat_filter_compiles_to_and() {
        let cond = compile_where(&filter(json!({ "age_gte": 18, "name_contains": "ann" })));
        assert_eq!(
            cond,
            Condition::All(vec![
                Comparison::new("age", FindOperator::not(FindOperator::LessThan(json!(18)))),
                Comparison::new("name", FindOperator::ILike("%ann%".into())),
            ])
        );
    }

    #[test]
    fn list_filter_compiles_to_or_of_and() {
        let cond = compile_where(&filter(json!([
            { "status": "open" },
            { "status": "closed", "total_gt": 100 }
        ])));
        let Condition::Any(groups) = cond else {
            panic!("expected OR groups");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[1].len(), 2);
        assert_eq!(groups[1][1].attribute, "total");
    }

    #[test]
    fn same_attribute_twice_is_kept() {
        let cond = compile_where(&filter(json!({ "age_gte": 18, "age_lte": 65 })));
        assert_eq!(cond.groups()[0].len(), 2);
    }

    #[test]
    fn empty_list_means_no_restriction() {
        assert!(compile_where(&filter(json!([]))).is_empty());
    }

    #[test]
    fn scalar_filter_is_rejected() {
        assert!(Where::try_from(json!(5)).is_err());
        assert!(Where::try_from(json!([1])).is_err());
    }

    #[test]
    fn and_applies_to_every_group() {
        let extra = [Comparison::new("deletedAt", FindOperator::IsNull)];
        let cond = compile_where(&filter(json!([{ "a": 1 }, { "b": 2 }]))).and(&extra);
        for group in cond.groups() {
            assert_eq!(group.last().unwrap().attribute, "deletedAt");
        }
    }
}
