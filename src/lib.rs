//! Remote Select - typeahead lookups for form fields
//!
//! Given a free-text term and a page number, a lookup returns a ranked,
//! paginated list of `(id, text)` pairs plus a "more results" flag for an
//! incremental-scroll select widget. Reverse lookup resolves a known id to
//! its pair so a pre-selected value renders without a search round trip.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Consumers: HTTP handlers, SelectRemoteField                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Lookup Registry                               │
//! │        name -> EntityLookup (config + capabilities)             │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   LookupEngine                                  │
//! │   filter + relevance tiers + tiebreak + LIMIT page_size + 1     │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            DataSource (PgSource / MemorySource)                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use remote_select::{LookupEngine, LookupRegistry, LookupsFile, PgSource, SearchRequest};
//!
//! let config = LookupsFile::from_file("config/lookups.yaml")?;
//! let source = PgSource::connect(&config.database).await?;
//! let registry = LookupRegistry::from_config(&config, LookupEngine::new(Arc::new(source)))?;
//!
//! let hosts = registry.get("hosts").expect("configured");
//! let page = hosts.search(&SearchRequest::new("db", 1)).await?;
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod lookup;
pub mod source;

// Re-export main types
pub use config::{DatabaseConfig, IdEncoding, LookupConfig, LookupsFile};
pub use error::LookupError;
pub use field::{FieldAttributes, FieldValue, SelectOption, SelectRemoteField};
pub use lookup::{
    BoundLookup, DataSource, EntityLookup, IdCodec, LookupEngine, LookupId, LookupRegistry,
    PairLookup, ResponsePage, ResultPair, RowMapper, SearchRequest, SearchResponseBody,
    SearchStrategy, PAGE_SIZE,
};
pub use source::{MemorySource, PgSource};
