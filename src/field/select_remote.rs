//! Select field whose options come from a remote lookup
//!
//! Only the options a user reached through live search are known to the
//! widget. When a value is set programmatically, the field resolves its
//! label through the lookup first so the pre-selected option renders with
//! the right text.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LookupError, Result};
use crate::lookup::{LookupId, PairLookup, ResultPair};

/// Value held by a select field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Int(i64),
    Text(String),
    /// Multi-select
    List(Vec<String>),
}

impl FieldValue {
    /// The identifier for a plain scalar value
    pub fn as_scalar(&self) -> Option<LookupId> {
        match self {
            FieldValue::Int(v) => Some(LookupId::Int(*v)),
            FieldValue::Text(s) => Some(LookupId::Text(s.clone())),
            FieldValue::Null | FieldValue::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

/// A known `<option>`: value and label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl From<ResultPair> for SelectOption {
    fn from(pair: ResultPair) -> Self {
        Self {
            value: pair.id,
            label: pair.text,
        }
    }
}

/// Construction attributes; `lookup` is required
#[derive(Default, Clone)]
pub struct FieldAttributes {
    pub lookup: Option<Arc<dyn PairLookup>>,
    /// Plain HTML attributes passed through to the widget
    pub html: BTreeMap<String, String>,
}

impl FieldAttributes {
    pub fn with_lookup(lookup: Arc<dyn PairLookup>) -> Self {
        Self {
            lookup: Some(lookup),
            html: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.html.insert(name.into(), value.into());
        self
    }
}

/// Select field backed by a remote lookup
pub struct SelectRemoteField {
    name: String,
    lookup: Arc<dyn PairLookup>,
    html: BTreeMap<String, String>,
    options: Vec<SelectOption>,
    value: FieldValue,
}

impl std::fmt::Debug for SelectRemoteField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectRemoteField")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl SelectRemoteField {
    /// Build from attributes; a missing lookup is a configuration error
    pub fn new(name: impl Into<String>, attributes: FieldAttributes) -> Result<Self> {
        let name = name.into();
        let lookup = attributes.lookup.ok_or_else(|| {
            LookupError::config(format!("SelectRemoteField '{name}' requires a lookup"))
        })?;
        Ok(Self {
            name,
            lookup,
            html: attributes.html,
            options: Vec::new(),
            value: FieldValue::Null,
        })
    }

    pub fn with_lookup(name: impl Into<String>, lookup: Arc<dyn PairLookup>) -> Self {
        Self {
            name: name.into(),
            lookup,
            html: BTreeMap::new(),
            options: Vec::new(),
            value: FieldValue::Null,
        }
    }

    /// Set the value, registering its label first for scalar identifiers
    ///
    /// A failed lookup leaves the current value untouched.
    pub async fn set_value(&mut self, value: impl Into<FieldValue>) -> Result<&mut Self> {
        let value = value.into();
        if let Some(id) = value.as_scalar() {
            if let Some(pair) = self.lookup.optional_pair(&id).await? {
                debug!(field = %self.name, id = %pair.id, "Registered option for value");
                self.add_option(pair.into());
            }
        }
        self.value = value;
        Ok(self)
    }

    /// Add an option, replacing one with the same value
    pub fn add_option(&mut self, option: SelectOption) {
        match self.options.iter_mut().find(|o| o.value == option.value) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    /// Whether the current value is a legal choice of the lookup
    ///
    /// An empty field is valid; every element of a list must exist.
    pub async fn is_valid_choice(&self) -> Result<bool> {
        match &self.value {
            FieldValue::Null => Ok(true),
            FieldValue::List(values) => {
                for v in values {
                    if !self.lookup.has_id(&LookupId::Text(v.clone())).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            scalar => match scalar.as_scalar() {
                Some(id) => self.lookup.has_id(&id).await,
                None => Ok(false),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.html
    }
}
