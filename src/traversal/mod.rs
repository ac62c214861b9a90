//! Descendant and ancestor traversal.
//!
//! Both executors compile a hierarchy definition (plus an optional filter)
//! into `SELECT DISTINCT ?nodeId` queries, run them against the store and
//! fold the rows into a duplicate-free list of concept references.

mod ancestors;
mod descendants;

pub use ancestors::fetch_ancestors;
pub use descendants::{fetch_children, UNFILTERED_MAX_LEVEL};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::sparql::{Pattern, PropertyPath, Term};
use crate::store::Row;
use crate::vocab;

/// Type reported for every traversal result.
pub const CONCEPT_TYPE: &str = "concept";

/// A node returned by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ConceptRef {
    pub fn concept(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: CONCEPT_TYPE.to_string(),
        }
    }
}

/// Ordered set of result ids. First occurrence wins.
#[derive(Debug, Default)]
pub(crate) struct ConceptSet {
    seen: HashSet<String>,
    items: Vec<ConceptRef>,
}

impl ConceptSet {
    /// Add every bound value of every row, skipping `exclude`.
    pub(crate) fn extend_from_rows(&mut self, rows: &[Row], exclude: Option<&str>) {
        for value in rows.iter().flat_map(|row| row.values()) {
            if Some(value) == exclude {
                continue;
            }
            if self.seen.insert(value.to_string()) {
                self.items.push(ConceptRef::concept(value));
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<ConceptRef> {
        self.items
    }
}

/// `?var mu:uuid "id" .` or `?var mu:uuid ?idVar .`
pub(crate) fn uuid_pattern(var: &str, id: Term) -> Pattern {
    Pattern::triple(Term::var(var), PropertyPath::iri(vocab::MU_CORE_UUID), id)
}
