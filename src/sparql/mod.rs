//! Query representation: terms, property paths and graph patterns.
//!
//! Fragments are composed as values and only turned into SPARQL text by their
//! `Display` impls, so braces, separators and unions are balanced by
//! construction rather than by string concatenation.

mod path;
mod pattern;
mod query;

pub use path::PropertyPath;
pub use pattern::Pattern;
pub use query::SelectQuery;

use std::fmt;

/// A subject/object position in a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Variable, stored without the leading `?`.
    Var(String),
    Iri(String),
    /// Plain string literal, escaped on output.
    Literal(String),
}

impl Term {
    /// Variable term. Accepts both `node` and `?node`.
    pub fn var(name: &str) -> Self {
        Term::Var(name.trim_start_matches('?').to_string())
    }

    pub fn iri(iri: &str) -> Self {
        Term::Iri(iri.to_string())
    }

    pub fn literal(value: &str) -> Self {
        Term::Literal(value.to_string())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "?{}", name),
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal(value) => write!(f, "\"{}\"", escape_literal(value)),
        }
    }
}

/// Escape a string for use inside a double-quoted SPARQL literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
