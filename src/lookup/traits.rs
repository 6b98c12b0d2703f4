//! Capability traits at the seams of the lookup engine
//!
//! `DataSource` is the collaborator contract the engine consumes. The
//! remaining traits form an entity lookup's capability set: how identifiers
//! are encoded, how rows become pairs and how a search term becomes
//! predicates and ordering.

use async_trait::async_trait;

use super::engine::{EntityLookup, ResultPair};
use super::query::{Predicate, SelectQuery};
use super::value::{LookupId, Row, Value};
use crate::error::Result;

/// A relational data source the engine can run a `SelectQuery` against
///
/// Implementations borrow their connection per call. They must bind every
/// value carried by the query rather than splicing it into query text.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Execute and fetch all rows
    async fn fetch_all(&self, query: &SelectQuery) -> Result<Vec<Row>>;

    /// Execute and fetch the first row, if any
    async fn fetch_optional(&self, query: &SelectQuery) -> Result<Option<Row>> {
        Ok(self.fetch_all(query).await?.into_iter().next())
    }

    /// Execute a `Projection::Count` query and fetch the scalar
    async fn fetch_count(&self, query: &SelectQuery) -> Result<i64>;

    /// Textual form of the query as this source would execute it
    fn describe(&self, query: &SelectQuery) -> String {
        query.to_string()
    }
}

/// Converts identifiers between their external text form and storage form
pub trait IdCodec: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and config (`plain`, `uuid_bytes`, ...)
    fn name(&self) -> &'static str;

    /// External identifier to the value bound against the id column
    fn encode(&self, id: &LookupId) -> Result<Value>;

    /// Stored id column value to its canonical external form.
    /// `column` names the source column for error reporting.
    fn decode(&self, column: &str, stored: &Value) -> Result<String>;

    /// Filter selecting the rows whose `column` holds `id`
    fn filter(&self, column: &str, id: &LookupId) -> Result<Predicate> {
        Ok(Predicate::Equals {
            column: column.to_string(),
            value: self.encode(id)?,
        })
    }
}

/// Maps a fetched row to its display pair
pub trait RowMapper: Send + Sync {
    fn map_row(&self, lookup: &EntityLookup, row: &Row) -> Result<ResultPair>;
}

/// Applies a non-empty search term to a projection query
pub trait SearchStrategy: Send + Sync {
    fn apply(&self, query: &mut SelectQuery, search_columns: &[String], term: &str);
}

/// Reverse lookup for one entity type, as consumed by form fields
#[async_trait]
pub trait PairLookup: Send + Sync {
    /// The display pair for `id`, or `None` for blank or unknown ids
    async fn optional_pair(&self, id: &LookupId) -> Result<Option<ResultPair>>;

    /// Whether `id` names exactly one row of this lookup
    async fn has_id(&self, id: &LookupId) -> Result<bool>;
}
