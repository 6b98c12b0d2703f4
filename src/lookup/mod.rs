//! Generic lookup abstraction
//!
//! Query construction, search-term matching, relevance ordering,
//! pagination-with-lookahead and identifier encoding, shared by every
//! entity type.

pub mod codec;
pub mod engine;
pub mod query;
pub mod ranking;
pub mod registry;
pub mod traits;
pub mod value;

pub use codec::{IntegerIdCodec, PlainIdCodec, UuidBytesCodec, UuidIdCodec};
pub use engine::{
    BoundLookup, DefaultRowMapper, EntityLookup, LookupEngine, Pagination, ResponsePage,
    ResultPair, SearchRequest, SearchResponseBody, PAGE_SIZE,
};
pub use query::{OrderKey, Predicate, Projection, SelectItem, SelectQuery, SqlSink};
pub use ranking::{RelevanceTier, TieredSearch};
pub use registry::LookupRegistry;
pub use traits::{DataSource, IdCodec, PairLookup, RowMapper, SearchStrategy};
pub use value::{LookupId, Row, Value};
