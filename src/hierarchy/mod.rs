//! Hierarchy definitions and their resolution.
//!
//! A hierarchy describes one traversable parent relation: the predicate path
//! for a single hop, an optional extension predicate usable only at the last
//! hop, and a restriction fragment limiting which nodes qualify.

mod path;
mod resolver;
mod structure;

pub use path::{build_path, connect};
pub use resolver::HierarchyResolver;
pub use structure::StructureDefinition;

use crate::sparql::{Pattern, PropertyPath, Term};
use crate::vocab;

/// Id carried by the generic fallback hierarchy.
pub const GENERIC_HIERARCHY_ID: &str = "-1";

/// One traversable relation, built per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyDefinition {
    pub name: String,
    pub id: String,
    /// Path for one hop. Never empty.
    pub primary_path: PropertyPath,
    /// Single predicate accepted instead of `primary_path` on the last hop.
    pub extension_path: Option<PropertyPath>,
    /// Conjunction constraining `?node` / `?target`.
    pub restriction: Vec<Pattern>,
}

impl HierarchyDefinition {
    /// Plain `skos:broader` hierarchy over every concept in the scheme whose
    /// uuid is `scheme_id`.
    pub fn generic(scheme_id: &str) -> Self {
        let hierarchy = Term::var("hierarchy");
        Self {
            name: "auto-generated skos hierarchy".to_string(),
            id: GENERIC_HIERARCHY_ID.to_string(),
            primary_path: PropertyPath::iri(vocab::SKOS_BROADER),
            extension_path: None,
            restriction: vec![
                Pattern::triple(
                    Term::var("node"),
                    PropertyPath::iri(vocab::SKOS_IN_SCHEME),
                    hierarchy.clone(),
                ),
                Pattern::triple(
                    hierarchy,
                    PropertyPath::iri(vocab::MU_CORE_UUID),
                    Term::literal(scheme_id),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::SelectQuery;

    #[test]
    fn test_generic_definition() {
        let def = HierarchyDefinition::generic("scheme-1");
        assert_eq!(def.id, GENERIC_HIERARCHY_ID);
        assert_eq!(def.primary_path, PropertyPath::iri(vocab::SKOS_BROADER));
        assert!(def.extension_path.is_none());

        let rendered = SelectQuery::all().patterns(def.restriction).to_string();
        assert!(rendered.contains(&format!("?node <{}> ?hierarchy .", vocab::SKOS_IN_SCHEME)));
        assert!(rendered.contains(&format!("?hierarchy <{}> \"scheme-1\" .", vocab::MU_CORE_UUID)));
    }

    #[test]
    fn test_generic_escapes_id() {
        let def = HierarchyDefinition::generic("x\" } DROP");
        let rendered = SelectQuery::all().patterns(def.restriction).to_string();
        assert!(rendered.contains("\"x\\\" } DROP\""));
    }
}
