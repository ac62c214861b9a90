//! Graph store access.
//!
//! The engine only needs one operation from the store: run a query text and
//! get back rows of named bindings. `SparqlClient` implements it over the
//! SPARQL 1.1 protocol; tests use the scripted `memory::MemoryStore`.

mod sparql_client;

#[cfg(test)]
pub mod memory;

pub use sparql_client::SparqlClient;

use async_trait::async_trait;

use crate::error::Result;

/// One solution of a query: variable name to lexical value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    bindings: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            bindings: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.push((name.into(), value.into()));
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Bound values in binding order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(_, v)| v.as_str())
    }
}

/// Anything that can answer a query with rows of bindings.
///
/// Failures are returned as-is; implementations must not retry.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn query(&self, query: &str) -> Result<Vec<Row>>;
}
