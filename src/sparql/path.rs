//! Property path expressions.

use std::fmt;

/// A SPARQL 1.1 property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyPath {
    /// A single predicate.
    Iri(String),
    /// A path expression stored as text in the graph; emitted verbatim.
    Raw(String),
    /// `a / b / c`
    Sequence(Vec<PropertyPath>),
    /// `a | b`
    Alternative(Vec<PropertyPath>),
    /// `(a)*`
    ZeroOrMore(Box<PropertyPath>),
    /// `a?`
    ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
    pub fn iri(iri: &str) -> Self {
        PropertyPath::Iri(iri.to_string())
    }

    /// Path taken from stored text. A bare IRI (with or without angle
    /// brackets) becomes `Iri`, anything else stays raw.
    pub fn parse_stored(text: &str) -> Self {
        let text = text.trim();
        let bare = text.strip_prefix('<').and_then(|t| t.strip_suffix('>'));
        match bare {
            Some(iri) if is_plain_iri(iri) => PropertyPath::iri(iri),
            None if is_plain_iri(text) && text.contains("://") => PropertyPath::iri(text),
            _ => PropertyPath::Raw(text.to_string()),
        }
    }

    /// `self` repeated `hops` times in sequence. `hops` below 1 is treated as 1.
    pub fn repeat(&self, hops: usize) -> Self {
        let hops = hops.max(1);
        if hops == 1 {
            return self.clone();
        }
        PropertyPath::Sequence(vec![self.clone(); hops])
    }

    /// `self / next`, flattening nested sequences.
    pub fn then(self, next: PropertyPath) -> Self {
        let mut steps = match self {
            PropertyPath::Sequence(steps) => steps,
            other => vec![other],
        };
        match next {
            PropertyPath::Sequence(more) => steps.extend(more),
            other => steps.push(other),
        }
        PropertyPath::Sequence(steps)
    }

    pub fn zero_or_more(self) -> Self {
        PropertyPath::ZeroOrMore(Box::new(self))
    }

    pub fn zero_or_one(self) -> Self {
        PropertyPath::ZeroOrOne(Box::new(self))
    }

    /// True when the path can be followed by a postfix operator or placed in
    /// a sequence without parentheses.
    fn is_atomic(&self) -> bool {
        match self {
            PropertyPath::Iri(_) => true,
            PropertyPath::Raw(text) => text
                .trim()
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .is_some_and(is_plain_iri),
            PropertyPath::Sequence(steps) | PropertyPath::Alternative(steps) => {
                steps.len() == 1 && steps[0].is_atomic()
            }
            PropertyPath::ZeroOrMore(_) | PropertyPath::ZeroOrOne(_) => true,
        }
    }

    fn fmt_grouped(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atomic() {
            write!(f, "{}", self)
        } else {
            write!(f, "({})", self)
        }
    }
}

fn is_plain_iri(text: &str) -> bool {
    !text.is_empty()
        && !text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '|' | '*' | '(' | ')' | '^'))
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPath::Iri(iri) => write!(f, "<{}>", iri),
            PropertyPath::Raw(text) => write!(f, "{}", text.trim()),
            PropertyPath::Sequence(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }
                    step.fmt_grouped(f)?;
                }
                Ok(())
            }
            PropertyPath::Alternative(options) => {
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", option)?;
                }
                Ok(())
            }
            PropertyPath::ZeroOrMore(inner) => write!(f, "({})*", inner),
            PropertyPath::ZeroOrOne(inner) => {
                inner.fmt_grouped(f)?;
                write!(f, "?")
            }
        }
    }
}
