//! Lookup engine - ranked, paginated search and reverse lookup
//!
//! One generic engine serves every entity type. An [`EntityLookup`] carries
//! the entity's column configuration plus its capability set (id codec, row
//! mapper, search strategy); the engine turns requests into a single
//! [`SelectQuery`] per call and runs it against a borrowed [`DataSource`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::query::{strip_alias, OrderKey, Predicate, SelectQuery};
use super::ranking::TieredSearch;
use super::traits::{DataSource, IdCodec, PairLookup, RowMapper, SearchStrategy};
use super::value::{LookupId, Row, Value};
use crate::config::LookupConfig;
use crate::error::{LookupError, Result};

/// Rows per page
pub const PAGE_SIZE: usize = 25;

/// A search request from the widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_string: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            search_string: None,
            page: 1,
        }
    }
}

impl SearchRequest {
    pub fn new(search_string: impl Into<String>, page: u32) -> Self {
        Self {
            search_string: Some(search_string.into()),
            page,
        }
    }

    /// The filter term; `None` when the request is unfiltered
    pub fn term(&self) -> Option<&str> {
        self.search_string.as_deref().filter(|s| !s.is_empty())
    }

    /// Row offset of this page; page 0 is treated as page 1
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(PAGE_SIZE)
    }
}

/// An `(id, text)` option for the widget
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultPair {
    pub id: String,
    pub text: String,
}

impl ResultPair {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One page of ranked results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponsePage {
    /// Pairs in ranked order, at most `PAGE_SIZE`
    pub results: Vec<ResultPair>,
    /// Whether rows exist beyond this page
    pub more: bool,
    /// Textual form of the executed query (diagnostics only)
    pub echoed_query: String,
}

/// Wire body sent back to the widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponseBody {
    pub results: Vec<ResultPair>,
    pub pagination: Pagination,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub more: bool,
}

impl From<ResponsePage> for SearchResponseBody {
    fn from(page: ResponsePage) -> Self {
        Self {
            results: page.results,
            pagination: Pagination { more: page.more },
            query: page.echoed_query,
        }
    }
}

/// Joins the id column and label columns of a row
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRowMapper;

impl RowMapper for DefaultRowMapper {
    fn map_row(&self, lookup: &EntityLookup, row: &Row) -> Result<ResultPair> {
        let config = lookup.config();
        let id_column = strip_alias(&config.id_column);
        let stored = row.get(id_column).unwrap_or(&Value::Null);
        let id = lookup.codec().decode(id_column, stored)?;

        let text = config
            .text_columns()?
            .iter()
            .map(|c| row.get(c).map(Value::as_text).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(ResultPair { id, text })
    }
}

/// Column configuration plus capability set for one entity type
#[derive(Clone)]
pub struct EntityLookup {
    name: String,
    config: LookupConfig,
    codec: Arc<dyn IdCodec>,
    row_mapper: Arc<dyn RowMapper>,
    search_strategy: Arc<dyn SearchStrategy>,
}

impl fmt::Debug for EntityLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLookup")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("codec", &self.codec.name())
            .finish_non_exhaustive()
    }
}

impl EntityLookup {
    /// Validate `config` and attach the default capabilities
    pub fn new(name: impl Into<String>, config: LookupConfig) -> Result<Self> {
        let name = name.into();
        config
            .validate()
            .map_err(|e| LookupError::config(format!("lookup '{name}': {e}")))?;
        Ok(Self {
            name,
            codec: config.id_encoding.codec(),
            config,
            row_mapper: Arc::new(DefaultRowMapper),
            search_strategy: Arc::new(TieredSearch),
        })
    }

    pub fn with_codec(mut self, codec: Arc<dyn IdCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_row_mapper(mut self, mapper: Arc<dyn RowMapper>) -> Self {
        self.row_mapper = mapper;
        self
    }

    pub fn with_search_strategy(mut self, strategy: Arc<dyn SearchStrategy>) -> Self {
        self.search_strategy = strategy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn IdCodec {
        self.codec.as_ref()
    }

    /// Base projection: id column plus label columns
    pub fn projection(&self) -> Result<SelectQuery> {
        Ok(SelectQuery::select(
            self.config.table.clone(),
            self.config.select_items()?,
        ))
    }

    /// Ranked, bounded query for one page of `request`
    pub fn search_query(&self, request: &SearchRequest) -> Result<SelectQuery> {
        let mut query = self.projection()?;
        if let Some(term) = request.term() {
            self.search_strategy
                .apply(&mut query, self.config.search_columns()?, term);
        }
        // Deterministic order after relevance
        for column in self.config.text_columns()? {
            query.order_by(OrderKey::Ascending(column.clone()));
        }
        query.limit(PAGE_SIZE + 1, request.offset());
        Ok(query)
    }

    /// Equality filter on the id column.
    ///
    /// `None` means the id cannot exist in this lookup (blank, or rejected
    /// by the codec) and no query should be issued.
    fn id_filter(&self, id: &LookupId) -> Option<Predicate> {
        if id.is_blank() {
            debug!(lookup = %self.name, "Blank identifier, skipping lookup");
            return None;
        }
        match self.codec.filter(&self.config.id_column, id) {
            Ok(filter) => Some(filter),
            Err(e) => {
                debug!(lookup = %self.name, error = %e, "Identifier rejected by codec");
                None
            }
        }
    }

    pub fn map_row(&self, row: &Row) -> Result<ResultPair> {
        self.row_mapper.map_row(self, row)
    }
}

/// Generic lookup engine over a shared data source
#[derive(Clone)]
pub struct LookupEngine {
    source: Arc<dyn DataSource>,
}

impl LookupEngine {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// One page of ranked results for `request`
    #[instrument(skip(self, lookup), fields(lookup = %lookup.name()))]
    pub async fn search(
        &self,
        lookup: &EntityLookup,
        request: &SearchRequest,
    ) -> Result<ResponsePage> {
        let query = lookup.search_query(request)?;
        let mut rows = self.source.fetch_all(&query).await?;

        let more = rows.len() > PAGE_SIZE;
        rows.truncate(PAGE_SIZE);

        let results = rows
            .iter()
            .map(|row| lookup.map_row(row))
            .collect::<Result<Vec<_>>>()?;

        debug!(rows = results.len(), more, "Search complete");

        Ok(ResponsePage {
            results,
            more,
            echoed_query: self.source.describe(&query),
        })
    }

    /// Display pair for a known identifier
    #[instrument(skip(self, lookup, id), fields(lookup = %lookup.name(), id = %id))]
    pub async fn lookup_by_id(
        &self,
        lookup: &EntityLookup,
        id: &LookupId,
    ) -> Result<Option<ResultPair>> {
        let Some(filter) = lookup.id_filter(id) else {
            return Ok(None);
        };

        let mut query = lookup.projection()?;
        query.and_where(filter).limit(1, 0);

        match self.source.fetch_optional(&query).await? {
            Some(row) => Ok(Some(lookup.map_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Whether exactly one row carries `id`
    #[instrument(skip(self, lookup, id), fields(lookup = %lookup.name(), id = %id))]
    pub async fn has_id(&self, lookup: &EntityLookup, id: &LookupId) -> Result<bool> {
        let Some(filter) = lookup.id_filter(id) else {
            return Ok(false);
        };

        let mut query = SelectQuery::count(lookup.config().table.clone());
        query.and_where(filter);

        Ok(self.source.fetch_count(&query).await? == 1)
    }

    /// Pair this engine with one lookup
    pub fn bind(&self, lookup: Arc<EntityLookup>) -> BoundLookup {
        BoundLookup {
            engine: self.clone(),
            lookup,
        }
    }
}

/// An engine bound to one entity lookup
#[derive(Clone)]
pub struct BoundLookup {
    engine: LookupEngine,
    lookup: Arc<EntityLookup>,
}

impl BoundLookup {
    pub fn lookup(&self) -> &EntityLookup {
        &self.lookup
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<ResponsePage> {
        self.engine.search(&self.lookup, request).await
    }
}

#[async_trait]
impl PairLookup for BoundLookup {
    async fn optional_pair(&self, id: &LookupId) -> Result<Option<ResultPair>> {
        self.engine.lookup_by_id(&self.lookup, id).await
    }

    async fn has_id(&self, id: &LookupId) -> Result<bool> {
        self.engine.has_id(&self.lookup, id).await
    }
}
