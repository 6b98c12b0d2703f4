//! In-process data source
//!
//! Evaluates the query model directly over rows held in memory: predicates
//! are tested per row, ordering keys are computed up front (relevance tiers
//! via [`RelevanceTier::classify`]) and rows are stable-sorted, so ties keep
//! their insertion order.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{LookupError, Result};
use crate::lookup::query::strip_alias;
use crate::lookup::ranking::contains_term;
use crate::lookup::{
    DataSource, OrderKey, Predicate, Projection, RelevanceTier, Row, SelectItem, SelectQuery,
    Value,
};

/// Named tables of rows
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Row>>,
}

#[derive(Debug, PartialEq)]
enum SortKey {
    Tier(RelevanceTier),
    Value(Value),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Tier(a), SortKey::Tier(b)) => a.cmp(b),
            (SortKey::Value(a), SortKey::Value(b)) => a.compare(b),
            _ => Ordering::Equal,
        }
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.insert_table(name, rows);
        self
    }

    pub fn insert_table(&mut self, name: impl Into<String>, rows: Vec<Row>) {
        self.tables.insert(name.into(), rows);
    }

    /// Resolve `schema.table alias` to a stored table
    fn table(&self, reference: &str) -> Result<&[Row]> {
        let relation = reference.split_whitespace().next().unwrap_or_default();
        let bare = relation.rsplit('.').next().unwrap_or(relation).trim_matches('"');
        self.tables
            .get(relation)
            .or_else(|| self.tables.get(bare))
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::Source(format!("relation \"{relation}\" does not exist")))
    }

    /// Filtered, ordered and windowed rows
    fn evaluate(&self, query: &SelectQuery) -> Result<Vec<&Row>> {
        let mut keyed = Vec::new();
        for row in self.table(&query.table)? {
            if let Some(filter) = &query.filter {
                if !matches(filter, row)? {
                    continue;
                }
            }
            let keys = query
                .order
                .iter()
                .map(|key| sort_key(key, row))
                .collect::<Result<Vec<_>>>()?;
            keyed.push((keys, row));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b)
                .map(|(x, y)| x.compare(y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let window = keyed.into_iter().map(|(_, row)| row).skip(query.offset);
        Ok(match query.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        })
    }
}

fn column<'r>(row: &'r Row, column: &str) -> Result<&'r Value> {
    row.get(column)
        .ok_or_else(|| LookupError::Source(format!("column \"{column}\" does not exist")))
}

fn matches(predicate: &Predicate, row: &Row) -> Result<bool> {
    Ok(match predicate {
        Predicate::Contains { column: c, term } => {
            let value = column(row, c)?;
            !value.is_null() && contains_term(&value.as_text(), term)
        }
        // No implicit casts: an `Int` column never equals a `Text` value
        Predicate::Equals { column: c, value } => {
            let stored = column(row, c)?;
            !stored.is_null() && stored == value
        }
        Predicate::TextEquals { column: c, value } => {
            let stored = column(row, c)?;
            !stored.is_null() && stored.as_text() == *value
        }
        Predicate::Any(preds) => {
            for p in preds {
                if matches(p, row)? {
                    return Ok(true);
                }
            }
            false
        }
        Predicate::All(preds) => {
            for p in preds {
                if !matches(p, row)? {
                    return Ok(false);
                }
            }
            true
        }
    })
}

fn sort_key(key: &OrderKey, row: &Row) -> Result<SortKey> {
    Ok(match key {
        OrderKey::Relevance { column: c, term } => match column(row, c)? {
            Value::Null => SortKey::Tier(RelevanceTier::Other),
            value => SortKey::Tier(RelevanceTier::classify(&value.as_text(), term)),
        },
        OrderKey::Ascending(c) => SortKey::Value(column(row, c)?.clone()),
    })
}

fn project(row: &Row, items: &[SelectItem]) -> Result<Row> {
    let mut projected = Row::new();
    for item in items {
        let value = column(row, item.column())?;
        let value = match (item, value) {
            (SelectItem::Text(_), v) if !v.is_null() => Value::Text(v.as_text()),
            (_, v) => v.clone(),
        };
        projected.push(strip_alias(item.column()), value);
    }
    Ok(projected)
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_all(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let Projection::Columns(columns) = &query.projection else {
            return Err(LookupError::Source(
                "count projection cannot fetch rows".to_string(),
            ));
        };
        self.evaluate(query)?
            .into_iter()
            .map(|row| project(row, columns))
            .collect()
    }

    async fn fetch_count(&self, query: &SelectQuery) -> Result<i64> {
        let mut unbounded = query.clone();
        unbounded.limit = None;
        unbounded.offset = 0;
        Ok(self.evaluate(&unbounded)?.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new().with_table(
            "hosts",
            vec![
                Row::new().with("id", 1i64).with("name", "beta"),
                Row::new().with("id", 2i64).with("name", "alpha"),
                Row::new().with("id", 3i64).with("name", Value::Null),
            ],
        )
    }

    #[tokio::test]
    async fn test_ascending_nulls_last() {
        let mut q = SelectQuery::select("hosts h", vec!["h.id".into(), "h.name".into()]);
        q.order_by(OrderKey::Ascending("h.name".into()));

        let rows = source().fetch_all(&q).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![Value::Int(2), Value::Int(1), Value::Int(3)]);
    }

    #[tokio::test]
    async fn test_equals_does_not_cast() {
        let mut q = SelectQuery::count("hosts");
        q.and_where(Predicate::Equals {
            column: "id".into(),
            value: Value::from("2"),
        });
        assert_eq!(source().fetch_count(&q).await.unwrap(), 0);

        let mut q = SelectQuery::count("hosts");
        q.and_where(Predicate::TextEquals {
            column: "id".into(),
            value: "2".into(),
        });
        assert_eq!(source().fetch_count(&q).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_text_items_project_as_text() {
        let q = SelectQuery::select(
            "hosts h",
            vec!["h.id".into(), SelectItem::Text("h.id".into())],
        );
        let rows = source().fetch_all(&q).await.unwrap();
        let first: Vec<_> = rows[0].columns().map(|(_, v)| v.clone()).collect();
        assert_eq!(first, vec![Value::Int(1), Value::from("1")]);
    }

    #[tokio::test]
    async fn test_unknown_relation_and_column() {
        let q = SelectQuery::select("nope", vec!["id".into()]);
        assert!(matches!(
            source().fetch_all(&q).await,
            Err(LookupError::Source(_))
        ));

        let q = SelectQuery::select("hosts", vec!["missing".into()]);
        assert!(matches!(
            source().fetch_all(&q).await,
            Err(LookupError::Source(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_qualified_table() {
        let q = SelectQuery::select("\"inventory\".hosts", vec!["id".into()]);
        assert_eq!(source().fetch_all(&q).await.unwrap().len(), 3);
    }
}
