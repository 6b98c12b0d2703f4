//! Configuration for lookups and their database

mod lookup_config;

pub use lookup_config::{DatabaseConfig, IdEncoding, LookupConfig, LookupsFile};
