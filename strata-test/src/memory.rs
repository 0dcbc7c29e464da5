use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use strata_data::{
    Comparison, Condition, DataError, Entity, EntityMetadata, FindOperator, FindOptions, Order,
    Patch, PatchValue, Record, Repository, UpdateResult,
};

/// One call made against a [`MemoryRepository`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    Find(FindOptions),
    Count(Condition),
    Create(Record),
    Merge(Record),
    Save { entity: Value, reload: bool },
    Update { condition: Condition, patch: Patch },
    Query { sql: String, params: Vec<Value> },
    Execute { sql: String, params: Vec<Value> },
}

#[derive(Default)]
struct State {
    rows: Vec<Record>,
    calls: Vec<RepoCall>,
    query_rows: Vec<Value>,
}

/// In-memory [`Repository`] that evaluates conditions against stored JSON
/// rows and records every call.
///
/// Conditions follow SQL three-valued logic: a comparison against a missing
/// or null attribute is unknown, and only rows whose condition is true
/// match. Missing ids are generated as UUID strings; the version attribute,
/// when registered, starts at 1 and is incremented on every save of an
/// existing row. A save overwrites every serialized attribute, nulls
/// included. `PatchValue::Now` writes the current UTC time as RFC 3339.
///
/// ```ignore
/// let repo = Arc::new(MemoryRepository::<Order>::new());
/// let service = Service::new(repo.clone(), MetadataHandle::new(Order::metadata()));
/// service.delete_by_id("o-1", Some("admin")).await?;
/// assert!(matches!(repo.calls()[0], RepoCall::Update { .. }));
/// ```
pub struct MemoryRepository<E> {
    metadata: EntityMetadata,
    table_path: String,
    state: Mutex<State>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        let metadata = E::metadata();
        let table_path = format!("memory.{}", metadata.table());
        Self {
            metadata,
            table_path,
            state: Mutex::new(State::default()),
            _entity: PhantomData,
        }
    }

    /// Seed stored rows without recording calls.
    pub fn with_rows(self, rows: impl IntoIterator<Item = Record>) -> Self {
        self.lock().rows.extend(rows);
        self
    }

    pub fn with_table_path(mut self, table_path: &str) -> Self {
        self.table_path = table_path.to_string();
        self
    }

    /// Rows returned by every subsequent raw `query`.
    pub fn with_query_rows(self, rows: Vec<Value>) -> Self {
        self.lock().query_rows = rows;
        self
    }

    /// Stored rows, in insertion order.
    pub fn rows(&self) -> Vec<Record> {
        self.lock().rows.clone()
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RepoCall) {
        self.lock().calls.push(call);
    }

    fn to_entity(&self, row: Record) -> Result<E, DataError> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    fn to_row(&self, entity: &E) -> Result<Record, DataError> {
        match serde_json::to_value(entity)? {
            Value::Object(row) => Ok(row),
            other => Err(DataError::Serialization(format!(
                "entity `{}` serialized to {other}",
                self.metadata.name()
            ))),
        }
    }

    fn store(&self, mut row: Record) -> Record {
        let id_column = self.metadata.id_column();
        if row.get(id_column).map_or(true, Value::is_null) {
            row.insert(
                id_column.to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        let id = row.get(id_column).cloned().unwrap_or(Value::Null);
        let version = self.metadata.version_column();

        let mut state = self.lock();
        match state.rows.iter_mut().find(|r| r.get(id_column) == Some(&id)) {
            Some(existing) => {
                let next = existing
                    .get(version.unwrap_or_default())
                    .and_then(Value::as_i64)
                    .unwrap_or(0)
                    + 1;
                existing.extend(row);
                if let Some(version) = version {
                    existing.insert(version.to_string(), Value::from(next));
                }
                existing.clone()
            }
            None => {
                if let Some(version) = version {
                    if row.get(version).map_or(true, Value::is_null) {
                        row.insert(version.to_string(), Value::from(1));
                    }
                }
                state.rows.push(row.clone());
                row
            }
        }
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    fn table_path(&self) -> String {
        self.table_path.clone()
    }

    async fn find(&self, options: &FindOptions) -> Result<Vec<E>, DataError> {
        self.record(RepoCall::Find(options.clone()));
        let mut rows: Vec<Record> = self
            .lock()
            .rows
            .iter()
            .filter(|row| matches(&options.condition, row))
            .cloned()
            .collect();
        sort_rows(&mut rows, &options.order);
        let skip = options.skip.unwrap_or(0) as usize;
        let take = options.take.map_or(usize::MAX, |t| t as usize);
        rows.into_iter()
            .skip(skip)
            .take(take)
            .map(|row| self.to_entity(project(row, &options.select)))
            .collect()
    }

    async fn count(&self, condition: &Condition) -> Result<u64, DataError> {
        self.record(RepoCall::Count(condition.clone()));
        let count = self
            .lock()
            .rows
            .iter()
            .filter(|row| matches(condition, row))
            .count();
        Ok(count as u64)
    }

    fn create(&self, record: Record) -> Result<E, DataError> {
        self.record(RepoCall::Create(record.clone()));
        self.to_entity(record)
    }

    async fn save(&self, entity: E, reload: bool) -> Result<E, DataError> {
        let row = self.to_row(&entity)?;
        self.record(RepoCall::Save {
            entity: Value::Object(row.clone()),
            reload,
        });
        let stored = self.store(row);
        if reload {
            self.to_entity(stored)
        } else {
            Ok(entity)
        }
    }

    fn merge(&self, entity: E, record: Record) -> Result<E, DataError> {
        self.record(RepoCall::Merge(record.clone()));
        let mut row = self.to_row(&entity)?;
        row.extend(record);
        self.to_entity(row)
    }

    async fn update(&self, condition: &Condition, patch: &Patch) -> Result<UpdateResult, DataError> {
        self.record(RepoCall::Update {
            condition: condition.clone(),
            patch: patch.clone(),
        });
        let now = chrono::Utc::now().to_rfc3339();
        let mut state = self.lock();
        let mut affected = 0;
        for row in state.rows.iter_mut().filter(|row| matches(condition, row)) {
            for (attribute, value) in patch.iter() {
                let value = match value {
                    PatchValue::Value(v) => v.clone(),
                    PatchValue::Now => Value::String(now.clone()),
                };
                row.insert(attribute.to_string(), value);
            }
            affected += 1;
        }
        Ok(UpdateResult { affected })
    }

    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Value>, DataError> {
        self.record(RepoCall::Query {
            sql: sql.to_string(),
            params,
        });
        Ok(self.lock().query_rows.clone())
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DataError> {
        self.record(RepoCall::Execute {
            sql: sql.to_string(),
            params,
        });
        Ok(0)
    }
}

/// Whether `row` satisfies `condition` (unknown counts as no match).
pub fn matches(condition: &Condition, row: &Record) -> bool {
    if condition.is_empty() {
        return true;
    }
    let truth = match condition {
        Condition::All(items) => all(items, row),
        Condition::Any(groups) => any(groups.iter().map(|g| all(g, row))),
    };
    truth == Some(true)
}

fn all(items: &[Comparison], row: &Record) -> Option<bool> {
    let mut result = Some(true);
    for item in items {
        match evaluate(&item.operator, row.get(&item.attribute)) {
            Some(false) => return Some(false),
            None => result = None,
            Some(true) => {}
        }
    }
    result
}

fn any(results: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut result = Some(false);
    for truth in results {
        match truth {
            Some(true) => return Some(true),
            None => result = None,
            Some(false) => {}
        }
    }
    result
}

fn evaluate(operator: &FindOperator, value: Option<&Value>) -> Option<bool> {
    let value = value.filter(|v| !v.is_null());
    match operator {
        FindOperator::IsNull => Some(value.is_none()),
        FindOperator::Not(inner) => evaluate(inner, value).map(|b| !b),
        FindOperator::Equal(expected) => equals(value?, expected),
        FindOperator::LessThan(bound) => compare(value?, bound).map(Ordering::is_lt),
        FindOperator::MoreThan(bound) => compare(value?, bound).map(Ordering::is_gt),
        FindOperator::In(candidates) => {
            let value = value?;
            any(candidates.iter().map(|c| equals(value, c)))
        }
        FindOperator::ILike(pattern) => {
            let text = match value? {
                Value::String(s) => s.to_lowercase(),
                other => other.to_string().to_lowercase(),
            };
            Some(like(&text, pattern))
        }
    }
}

fn equals(value: &Value, expected: &Value) -> Option<bool> {
    if expected.is_null() {
        return None;
    }
    Some(match compare(value, expected) {
        Some(ordering) => ordering.is_eq(),
        None => value == expected,
    })
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

enum Token {
    Many,
    One,
    Char(char),
}

/// SQL `LIKE` with `\` as the escape character.
fn like(text: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Many,
            '_' => Token::One,
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            c => Token::Char(c),
        });
    }
    let text: Vec<char> = text.chars().collect();

    // reachable[j]: the tokens consumed so far can match text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        for j in 0..=text.len() {
            if !reachable[j] {
                continue;
            }
            match token {
                Token::Many => next[j..].iter_mut().for_each(|slot| *slot = true),
                Token::One if j < text.len() => next[j + 1] = true,
                Token::Char(c) if j < text.len() && text[j] == *c => next[j + 1] = true,
                _ => {}
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

/// Nulls sort first, like SQLite.
fn sort_rows(rows: &mut [Record], order: &[Order]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for o in order {
            let left = a.get(&o.attribute).filter(|v| !v.is_null());
            let right = b.get(&o.attribute).filter(|v| !v.is_null());
            let ordering = match (left, right) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(l), Some(r)) => compare(l, r).unwrap_or(Ordering::Equal),
            };
            let ordering = if o.direction.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn project(row: Record, select: &[String]) -> Record {
    if select.is_empty() {
        return row;
    }
    row.into_iter()
        .filter(|(attribute, _)| select.contains(attribute))
        .collect()
}
