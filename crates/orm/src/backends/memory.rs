//! In-memory Backend Implementation
//!
//! Tables live in process memory behind a `parking_lot` lock. Supports the
//! full `QueryBuilder` surface (joins, predicates, ordering, paging) and
//! counts executed selects so callers can assert query batching.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Number, Value};

use super::core::{QueryBackend, Row};
use crate::error::{OrmError, OrmResult};
use crate::query::{JoinType, OrderDirection, QueryBuilder, QueryOperator, WhereCondition};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Row>,
    next_id: i64,
}

impl MemoryTable {
    fn insert(&mut self, mut row: Row, id_column: &str) -> Value {
        let id = match row.get(id_column) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                self.next_id += 1;
                Value::Number(Number::from(self.next_id))
            }
        };
        if let Some(numeric) = id.as_i64() {
            self.next_id = self.next_id.max(numeric);
        }
        row.insert(id_column.to_string(), id.clone());
        self.rows.push(row);
        id
    }
}

/// Process-local table store
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, MemoryTable>>,
    selects: AtomicUsize,
}

/// One joined row: (table name, row) per participating table
type Context<'a> = Vec<(&'a str, Option<&'a Row>)>;

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table; existing tables are left untouched
    pub fn create_table(&self, table: &str) {
        self.tables.write().entry(table.to_string()).or_default();
    }

    /// Insert rows keyed by `id`, assigning ids where missing
    pub fn seed<I>(&self, table: &str, rows: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        self.seed_with_id(table, "id", rows)
    }

    /// Insert rows keyed by `id_column`, assigning ids where missing
    pub fn seed_with_id<I>(&self, table: &str, id_column: &str, rows: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut tables = self.tables.write();
        let target = tables.entry(table.to_string()).or_default();
        for row in rows {
            match row {
                Value::Object(row) => {
                    target.insert(row, id_column);
                }
                other => {
                    return Err(OrmError::Serialization(format!(
                        "seed rows for {} must be JSON objects, got {}",
                        table, other
                    )))
                }
            }
        }
        Ok(())
    }

    /// Snapshot of every stored row, soft-deleted ones included
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Number of selects executed since creation or the last reset
    pub fn query_count(&self) -> usize {
        self.selects.load(AtomicOrdering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.selects.store(0, AtomicOrdering::SeqCst);
    }

    fn base_table(query: &QueryBuilder) -> OrmResult<&str> {
        query
            .table_name()
            .ok_or_else(|| OrmError::Query("query has no table".to_string()))
    }

    fn missing_table(table: &str) -> OrmError {
        OrmError::Database(format!("relation \"{}\" does not exist", table))
    }
}

#[async_trait]
impl QueryBackend for MemoryBackend {
    async fn select(&self, query: &QueryBuilder) -> OrmResult<Vec<Row>> {
        self.selects.fetch_add(1, AtomicOrdering::SeqCst);
        let table = Self::base_table(query)?;
        let tables = self.tables.read();

        let base = tables.get(table).ok_or_else(|| Self::missing_table(table))?;
        let mut contexts: Vec<Context<'_>> = base.rows.iter().map(|row| vec![(table, Some(row))]).collect();

        for join in query.joins() {
            let joined = tables.get(&join.table).ok_or_else(|| Self::missing_table(&join.table))?;
            let mut next = Vec::new();
            for context in contexts {
                let mut matched = false;
                for row in &joined.rows {
                    let mut candidate = context.clone();
                    candidate.push((join.table.as_str(), Some(row)));
                    let on = join.on_conditions.iter().all(|(left, right)| {
                        loose_eq(&resolve(&candidate, left), &resolve(&candidate, right))
                    });
                    if on {
                        matched = true;
                        next.push(candidate);
                    }
                }
                if !matched && join.join_type == JoinType::Left {
                    let mut candidate = context;
                    candidate.push((join.table.as_str(), None));
                    next.push(candidate);
                }
            }
            contexts = next;
        }

        contexts.retain(|context| query.conditions().iter().all(|c| matches_condition(context, c)));

        if !query.ordering().is_empty() {
            contexts.sort_by(|a, b| {
                for (column, direction) in query.ordering() {
                    let ordering = compare_for_sort(&resolve(a, column), &resolve(b, column), direction);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = query.offset_value().unwrap_or(0).max(0) as usize;
        let limit = query.limit_count().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        let rows: Vec<Row> = contexts
            .iter()
            .skip(offset)
            .take(limit)
            .map(|context| project(context, query.select_fields()))
            .collect();

        tracing::debug!(table, joins = query.joins().len(), rows = rows.len(), "memory select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, values: &Row, id_column: &str) -> OrmResult<Value> {
        let mut tables = self.tables.write();
        let id = tables.entry(table.to_string()).or_default().insert(values.clone(), id_column);
        tracing::debug!(table, id = %id, "memory insert");
        Ok(id)
    }

    async fn update(&self, query: &QueryBuilder, values: &Row) -> OrmResult<u64> {
        let table = Self::base_table(query)?;
        let mut tables = self.tables.write();
        let target = tables.get_mut(table).ok_or_else(|| Self::missing_table(table))?;

        let mut affected = 0;
        for row in target.rows.iter_mut() {
            let context: Context<'_> = vec![(table, Some(&*row))];
            if query.conditions().iter().all(|c| matches_condition(&context, c)) {
                for (column, value) in values {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }

        tracing::debug!(table, affected, "memory update");
        Ok(affected)
    }

    async fn delete(&self, query: &QueryBuilder) -> OrmResult<u64> {
        let table = Self::base_table(query)?;
        let mut tables = self.tables.write();
        let target = tables.get_mut(table).ok_or_else(|| Self::missing_table(table))?;

        let before = target.rows.len();
        target.rows.retain(|row| {
            let context: Context<'_> = vec![(table, Some(row))];
            !query.conditions().iter().all(|c| matches_condition(&context, c))
        });
        let affected = (before - target.rows.len()) as u64;

        tracing::debug!(table, affected, "memory delete");
        Ok(affected)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Value of a plain or `table.column` reference; unknown columns are NULL
fn resolve(context: &Context<'_>, column: &str) -> Value {
    if let Some((table, column)) = column.rsplit_once('.') {
        return context
            .iter()
            .find(|(name, _)| *name == table)
            .and_then(|(_, row)| row.and_then(|r| r.get(column)))
            .cloned()
            .unwrap_or(Value::Null);
    }

    context
        .iter()
        .find_map(|(_, row)| row.and_then(|r| r.get(column)))
        .cloned()
        .unwrap_or(Value::Null)
}

fn project(context: &Context<'_>, fields: &[String]) -> Row {
    let mut row = Row::new();
    let all_of = |row: &mut Row, source: Option<&Row>| {
        for (column, value) in source.into_iter().flatten() {
            row.entry(column.clone()).or_insert_with(|| value.clone());
        }
    };

    if fields.is_empty() {
        for (_, source) in context {
            all_of(&mut row, *source);
        }
        return row;
    }

    for field in fields {
        if field == "*" {
            for (_, source) in context {
                all_of(&mut row, *source);
            }
        } else if let Some(table) = field.strip_suffix(".*") {
            if let Some((_, source)) = context.iter().find(|(name, _)| *name == table) {
                all_of(&mut row, *source);
            }
        } else {
            let name = field.rsplit('.').next().unwrap_or(field);
            row.insert(name.to_string(), resolve(context, field));
        }
    }
    row
}

fn matches_condition(context: &Context<'_>, condition: &WhereCondition) -> bool {
    let actual = resolve(context, &condition.column);
    let expected = condition.value.as_ref().unwrap_or(&Value::Null);

    match condition.operator {
        QueryOperator::Equal if expected.is_null() => actual.is_null(),
        QueryOperator::NotEqual if expected.is_null() => !actual.is_null(),
        QueryOperator::Equal => loose_eq(&actual, expected),
        QueryOperator::NotEqual => !actual.is_null() && !loose_eq(&actual, expected),
        QueryOperator::GreaterThan => compare(&actual, expected) == Some(Ordering::Greater),
        QueryOperator::GreaterThanOrEqual => {
            matches!(compare(&actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        QueryOperator::LessThan => compare(&actual, expected) == Some(Ordering::Less),
        QueryOperator::LessThanOrEqual => {
            matches!(compare(&actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        QueryOperator::Like => like(&actual, expected),
        QueryOperator::NotLike => actual.is_string() && !like(&actual, expected),
        QueryOperator::In => condition.values.iter().any(|v| loose_eq(&actual, v)),
        QueryOperator::NotIn => !actual.is_null() && !condition.values.iter().any(|v| loose_eq(&actual, v)),
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
    }
}

/// SQL-style equality: NULL never matches, numbers compare numerically and
/// numeric strings match numbers
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        (a, b) => a == b,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(n), Value::String(s)) => n.as_f64()?.partial_cmp(&s.trim().parse::<f64>().ok()?),
        (Value::String(s), Value::Number(n)) => s.trim().parse::<f64>().ok()?.partial_cmp(&n.as_f64()?),
        _ => None,
    }
}

/// Postgres default ordering: NULLs last ascending, first descending
fn compare_for_sort(left: &Value, right: &Value, direction: &OrderDirection) -> Ordering {
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
    };
    match direction {
        OrderDirection::Asc => ordering,
        OrderDirection::Desc => ordering.reverse(),
    }
}

fn like(value: &Value, pattern: &Value) -> bool {
    match (value, pattern) {
        (Value::String(text), Value::String(pattern)) => {
            let text: Vec<char> = text.chars().collect();
            let pattern: Vec<char> = pattern.chars().collect();
            like_match(&text, &pattern)
        }
        _ => false,
    }
}

fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_match(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_match(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_match(&text[1..], rest),
    }
}
