//! Registry of named lookups
//!
//! The `LookupRegistry` maps lookup names (as used by widgets and form
//! fields) to their entity lookups, all served by one engine.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LookupsFile;
use crate::error::Result;

use super::engine::{BoundLookup, EntityLookup, LookupEngine};

/// Registry of entity lookups keyed by name
pub struct LookupRegistry {
    engine: LookupEngine,
    lookups: HashMap<String, Arc<EntityLookup>>,
}

impl LookupRegistry {
    /// Create an empty registry served by `engine`
    pub fn new(engine: LookupEngine) -> Self {
        Self {
            engine,
            lookups: HashMap::new(),
        }
    }

    /// Build and validate every lookup in `config`
    pub fn from_config(config: &LookupsFile, engine: LookupEngine) -> Result<Self> {
        let mut registry = Self::new(engine);
        for (name, lookup_config) in &config.lookups {
            registry.register(EntityLookup::new(name.clone(), lookup_config.clone())?);
        }
        Ok(registry)
    }

    /// Register a lookup under its name
    ///
    /// This will replace any existing lookup with the same name.
    pub fn register(&mut self, lookup: EntityLookup) {
        self.lookups
            .insert(lookup.name().to_string(), Arc::new(lookup));
    }

    /// Get a lookup bound to the registry's engine
    pub fn get(&self, name: &str) -> Option<BoundLookup> {
        self.lookups
            .get(name)
            .map(|lookup| self.engine.bind(Arc::clone(lookup)))
    }

    /// Get the entity lookup itself
    pub fn lookup(&self, name: &str) -> Option<&EntityLookup> {
        self.lookups.get(name).map(Arc::as_ref)
    }

    pub fn engine(&self) -> &LookupEngine {
        &self.engine
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lookups.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::source::MemorySource;

    fn engine() -> LookupEngine {
        LookupEngine::new(Arc::new(MemorySource::new()))
    }

    #[test]
    fn test_registry_names() {
        let yaml = r#"
database:
  connection_string_env: DATABASE_URL
lookups:
  person:
    table: persons
    id_column: person_id
    text_columns: [first_name, last_name]
  fund:
    table: funds
    id_column: fund_id
    text_columns: [name]
"#;
        let config = LookupsFile::from_yaml(yaml).unwrap();
        let registry = LookupRegistry::from_config(&config, engine()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["fund", "person"]);
        assert_eq!(registry.get("person").unwrap().lookup().name(), "person");
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = LookupRegistry::new(engine());
        assert!(registry.is_empty());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_rejects_lookup_without_text_columns() {
        let yaml = r#"
database:
  connection_string_env: DATABASE_URL
lookups:
  broken:
    table: things
    id_column: id
"#;
        let config = LookupsFile::from_yaml(yaml).unwrap();
        let err = LookupRegistry::from_config(&config, engine())
            .err()
            .expect("missing text_columns must fail");
        assert!(matches!(err, LookupError::Configuration(ref m) if m.contains("broken")));
    }
}
