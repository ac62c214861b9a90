//! `SELECT` query builder.

use std::fmt;

use super::Pattern;

/// A `SELECT` query over a conjunction of patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    distinct: bool,
    /// Projected variable names without `?`; empty means `*`.
    projection: Vec<String>,
    patterns: Vec<Pattern>,
}

impl SelectQuery {
    /// `SELECT *`
    pub fn all() -> Self {
        Self::default()
    }

    /// `SELECT ?v1 ?v2 ...`
    pub fn select(vars: &[&str]) -> Self {
        Self {
            projection: vars
                .iter()
                .map(|v| v.trim_start_matches('?').to_string())
                .collect(),
            ..Self::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn patterns(mut self, patterns: impl IntoIterator<Item = Pattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.projection.is_empty() {
            write!(f, "*")?;
        } else {
            let vars: Vec<String> = self.projection.iter().map(|v| format!("?{}", v)).collect();
            write!(f, "{}", vars.join(" "))?;
        }
        writeln!(f, " WHERE {{")?;
        for pattern in self.patterns.iter().filter(|p| !p.is_empty()) {
            writeln!(f, "  {}", pattern)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::{PropertyPath, Term};

    #[test]
    fn test_select_distinct() {
        let q = SelectQuery::select(&["nodeId"])
            .distinct()
            .pattern(Pattern::triple(
                Term::var("node"),
                PropertyPath::iri("http://x/uuid"),
                Term::var("nodeId"),
            ));
        assert_eq!(
            q.to_string(),
            "SELECT DISTINCT ?nodeId WHERE {\n  ?node <http://x/uuid> ?nodeId .\n}"
        );
    }

    #[test]
    fn test_select_all_skips_empty_patterns() {
        let q = SelectQuery::all()
            .pattern(Pattern::raw(""))
            .pattern(Pattern::raw("?s ?p ?o ."));
        assert_eq!(q.to_string(), "SELECT * WHERE {\n  ?s ?p ?o .\n}");
    }
}
