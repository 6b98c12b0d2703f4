//! Data source implementations

mod memory;
mod postgres;

pub use memory::MemorySource;
pub use postgres::{build_query, PgSource};
