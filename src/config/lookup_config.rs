//! Lookup configuration parsing
//!
//! Loads lookup definitions from YAML and provides strongly-typed,
//! validated access to table and column configuration.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};
use crate::lookup::codec::{IntegerIdCodec, PlainIdCodec, UuidBytesCodec, UuidIdCodec};
use crate::lookup::{IdCodec, SelectItem};

const IDENT: &str = r#"(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_]*)"#;

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^{IDENT}(?:\.{IDENT})?(?:\s+(?i:as\s+)?[A-Za-z_][A-Za-z0-9_]*)?$"
    ))
    .expect("valid table regex")
});

static COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{IDENT}\.)?{IDENT}$")).expect("valid column regex")
});

/// Root configuration structure: database plus named lookups
#[derive(Debug, Clone, Deserialize)]
pub struct LookupsFile {
    pub database: DatabaseConfig,
    pub lookups: HashMap<String, LookupConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Environment variable holding the connection string
    pub connection_string_env: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// How identifiers are stored and exposed
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdEncoding {
    /// Used verbatim (text or integer)
    #[default]
    Plain,
    /// Integer keys, text input parsed
    Integer,
    /// 16-byte binary UUID, canonical text externally
    UuidBytes,
    /// Native UUID column
    Uuid,
}

impl IdEncoding {
    pub fn codec(self) -> Arc<dyn IdCodec> {
        match self {
            IdEncoding::Plain => Arc::new(PlainIdCodec),
            IdEncoding::Integer => Arc::new(IntegerIdCodec),
            IdEncoding::UuidBytes => Arc::new(UuidBytesCodec),
            IdEncoding::Uuid => Arc::new(UuidIdCodec),
        }
    }

    /// Whether identifiers are stored in a compact binary form
    pub fn is_compact(self) -> bool {
        matches!(self, IdEncoding::UuidBytes)
    }
}

/// Configuration for a single entity type
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LookupConfig {
    /// Source relation, optionally schema-qualified and aliased
    /// (e.g. `"inventory".hosts h`)
    pub table: String,
    /// Identifier column, optionally alias-prefixed (e.g. `h.id`)
    pub id_column: String,
    #[serde(default)]
    pub id_encoding: IdEncoding,
    /// Columns joined by a space to form the label
    #[serde(default)]
    pub text_columns: Vec<String>,
    /// Columns matched against the term; empty means `text_columns`
    #[serde(default)]
    pub search_columns: Vec<String>,
}

impl LookupConfig {
    pub fn new(table: impl Into<String>, id_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_column: id_column.into(),
            id_encoding: IdEncoding::Plain,
            text_columns: Vec::new(),
            search_columns: Vec::new(),
        }
    }

    pub fn with_text_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id_encoding(mut self, encoding: IdEncoding) -> Self {
        self.id_encoding = encoding;
        self
    }

    /// Label columns; empty is a configuration error
    pub fn text_columns(&self) -> Result<&[String]> {
        if self.text_columns.is_empty() {
            return Err(LookupError::config(format!(
                "No text_columns have been defined for table '{}'",
                self.table
            )));
        }
        Ok(&self.text_columns)
    }

    /// Effective search columns
    pub fn search_columns(&self) -> Result<&[String]> {
        if self.search_columns.is_empty() {
            self.text_columns()
        } else {
            Ok(&self.search_columns)
        }
    }

    /// Id column in its stored type, then the label columns as text
    pub fn select_items(&self) -> Result<Vec<SelectItem>> {
        let mut items = vec![SelectItem::Column(self.id_column.clone())];
        items.extend(self.text_columns()?.iter().cloned().map(SelectItem::Text));
        Ok(items)
    }

    /// Check required columns and that every identifier is safe to place
    /// into query text
    pub fn validate(&self) -> Result<()> {
        if !TABLE_RE.is_match(self.table.trim()) {
            return Err(LookupError::config(format!(
                "Invalid table reference '{}'",
                self.table
            )));
        }
        self.text_columns()?;

        let columns = std::iter::once(&self.id_column)
            .chain(&self.text_columns)
            .chain(&self.search_columns);
        for column in columns {
            if !COLUMN_RE.is_match(column) {
                return Err(LookupError::config(format!(
                    "Invalid column reference '{}' for table '{}'",
                    column, self.table
                )));
            }
        }
        Ok(())
    }
}

impl LookupsFile {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: LookupsFile = serde_yaml::from_str(content)?;
        Ok(config)
    }
}
