//! Graph patterns.

use std::fmt;

use super::{PropertyPath, Term};

/// One element of a group graph pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `subject path object .`
    Triple {
        subject: Term,
        path: PropertyPath,
        object: Term,
    },
    /// `{ ... }`
    Group(Vec<Pattern>),
    /// `{ { a } UNION { b } }`; each branch is a conjunction.
    Union(Vec<Vec<Pattern>>),
    /// `OPTIONAL { ... }`
    Optional(Vec<Pattern>),
    /// `FILTER(expr)`
    Filter(String),
    /// Fragment spliced verbatim (stored restrictions, rendered filters).
    Raw(String),
}

impl Pattern {
    pub fn triple(subject: Term, path: PropertyPath, object: Term) -> Self {
        Pattern::Triple {
            subject,
            path,
            object,
        }
    }

    /// Union of `branches`. A single branch is returned as a group, and
    /// branches that render identically to an earlier one are dropped.
    pub fn union(branches: Vec<Vec<Pattern>>) -> Self {
        let mut seen: Vec<String> = Vec::with_capacity(branches.len());
        let mut kept = Vec::with_capacity(branches.len());
        for branch in branches {
            let rendered = render_block(&branch);
            if !seen.contains(&rendered) {
                seen.push(rendered);
                kept.push(branch);
            }
        }
        if kept.len() == 1 {
            return Pattern::Group(kept.remove(0));
        }
        Pattern::Union(kept)
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Pattern::Raw(text.into())
    }

    /// True for an empty raw fragment or an empty group.
    pub fn is_empty(&self) -> bool {
        match self {
            Pattern::Raw(text) => text.trim().is_empty(),
            Pattern::Group(items) => items.iter().all(Pattern::is_empty),
            Pattern::Union(branches) => branches.is_empty(),
            _ => false,
        }
    }
}

/// Render a conjunction of patterns separated by single spaces.
pub(crate) fn render_block(patterns: &[Pattern]) -> String {
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Triple {
                subject,
                path,
                object,
            } => write!(f, "{} {} {} .", subject, path, object),
            Pattern::Group(items) => write!(f, "{{ {} }}", render_block(items)),
            Pattern::Union(branches) => {
                let rendered: Vec<String> = branches
                    .iter()
                    .map(|b| format!("{{ {} }}", render_block(b)))
                    .collect();
                write!(f, "{{ {} }}", rendered.join(" UNION "))
            }
            Pattern::Optional(items) => write!(f, "OPTIONAL {{ {} }}", render_block(items)),
            Pattern::Filter(expr) => write!(f, "FILTER({})", expr),
            Pattern::Raw(text) => write!(f, "{}", text.trim()),
        }
    }
}
