//! Four-tier relevance ranking
//!
//! A row's rank for one search column is the first tier that applies:
//!
//! 1. the value equals the term,
//! 2. the value contains the term right after a space (a later word starts
//!    with it),
//! 3. the value starts with the term,
//! 4. anything else.
//!
//! Matching is case-insensitive. Tier 2 is a literal `" <term>"` match, so a
//! term at the very start of the value lands in tier 3, not tier 2.

use super::query::{OrderKey, Predicate, SelectQuery};
use super::traits::SearchStrategy;

/// Relevance bucket, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelevanceTier {
    Exact = 1,
    WordPrefix = 2,
    Prefix = 3,
    Other = 4,
}

impl RelevanceTier {
    /// In-process form of the ranking expression `TieredSearch` emits
    pub fn classify(value: &str, term: &str) -> Self {
        let value = value.to_lowercase();
        let term = term.to_lowercase();

        if value == term {
            RelevanceTier::Exact
        } else if value.contains(&format!(" {term}")) {
            RelevanceTier::WordPrefix
        } else if value.starts_with(&term) {
            RelevanceTier::Prefix
        } else {
            RelevanceTier::Other
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Case-insensitive containment, the in-process form of `Predicate::Contains`
pub fn contains_term(value: &str, term: &str) -> bool {
    value.to_lowercase().contains(&term.to_lowercase())
}

/// Default search strategy: match the term anywhere in any search column
/// and rank by relevance tier, column by column in declared order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredSearch;

impl SearchStrategy for TieredSearch {
    fn apply(&self, query: &mut SelectQuery, search_columns: &[String], term: &str) {
        let mut any = Vec::with_capacity(search_columns.len());
        for column in search_columns {
            any.push(Predicate::Contains {
                column: column.clone(),
                term: term.to_string(),
            });
            query.order_by(OrderKey::Relevance {
                column: column.clone(),
                term: term.to_string(),
            });
        }
        query.and_where(Predicate::Any(any));
    }
}
