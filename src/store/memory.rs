//! Scripted in-memory store for tests.
//!
//! Each rule pairs a predicate over the query text with the rows (or the
//! failure) to answer with. The first matching rule wins; unmatched queries
//! get no rows. Every query text is recorded.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{GraphStore, Row};
use crate::error::{HierarchyError, Result};

type Matcher = Box<dyn Fn(&str) -> bool + Send + Sync>;

enum Outcome {
    Rows(Vec<Row>),
    Fail(String),
}

struct Rule {
    matcher: Matcher,
    outcome: Outcome,
}

#[derive(Default)]
pub struct MemoryStore {
    rules: Vec<Rule>,
    queries: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries matching `matcher` with `rows`.
    pub fn answer(
        mut self,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        rows: Vec<Row>,
    ) -> Self {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            outcome: Outcome::Rows(rows),
        });
        self
    }

    /// Answer queries containing every needle with `rows`.
    pub fn answer_containing(self, needles: &[&str], rows: Vec<Row>) -> Self {
        let needles: Vec<String> = needles.iter().map(|n| n.to_string()).collect();
        self.answer(move |q| needles.iter().all(|n| q.contains(n.as_str())), rows)
    }

    /// Fail queries matching `matcher`.
    pub fn fail(
        mut self,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        message: &str,
    ) -> Self {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            outcome: Outcome::Fail(message.to_string()),
        });
        self
    }

    /// Every query received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

/// Rows with a single `nodeId` binding each.
pub fn node_rows(ids: &[&str]) -> Vec<Row> {
    ids.iter().map(|id| Row::from_pairs(&[("nodeId", id)])).collect()
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn query(&self, query: &str) -> Result<Vec<Row>> {
        self.queries.lock().unwrap().push(query.to_string());
        for rule in &self.rules {
            if (rule.matcher)(query) {
                return match &rule.outcome {
                    Outcome::Rows(rows) => Ok(rows.clone()),
                    Outcome::Fail(message) => Err(HierarchyError::Store(message.clone())),
                };
            }
        }
        Ok(Vec::new())
    }
}
