//! Hierarchy lookup with fallbacks.

use std::sync::Arc;

use super::{HierarchyDefinition, StructureDefinition};
use crate::error::Result;
use crate::sparql::{Pattern, PropertyPath, SelectQuery, Term};
use crate::store::{GraphStore, Row};
use crate::vocab;

/// Resolves a hierarchy id to a definition.
///
/// Order: an explicitly stored hierarchy, then a hierarchy derived from a
/// structure with that id, then the generic `skos:broader` hierarchy over the
/// scheme with that id. Empty lookups fall through; store errors propagate.
pub struct HierarchyResolver {
    store: Arc<dyn GraphStore>,
}

impl HierarchyResolver {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, id: &str, for_ancestors: bool) -> Result<HierarchyDefinition> {
        if let Some(hierarchy) = self.fetch_hierarchy(id).await? {
            log::debug!("Hierarchy {} resolved from stored definition", id);
            return Ok(hierarchy);
        }

        if let Some(structure) = self.fetch_structure(id).await? {
            log::debug!("Hierarchy {} derived from structure", id);
            return Ok(structure.to_hierarchy(for_ancestors));
        }

        log::debug!("Hierarchy {} not found, using generic skos hierarchy", id);
        Ok(HierarchyDefinition::generic(id))
    }

    /// Stored hierarchy with uuid `id`.
    async fn fetch_hierarchy(&self, id: &str) -> Result<Option<HierarchyDefinition>> {
        let s = Term::var("s");
        let query = SelectQuery::all()
            .patterns(describe(&s, vocab::MU_HIERARCHY_HIERARCHY, id))
            .pattern(optional(&s, vocab::MU_HIERARCHY_PATH, "path"))
            .pattern(optional(&s, vocab::MU_HIERARCHY_CODED_PROPERTY, "codedProperty"))
            .pattern(optional(&s, vocab::MU_HIERARCHY_RESTRICTION, "restriction"))
            .to_string();

        let rows = self.store.query(&query).await?;
        Ok(rows.first().map(|row| stored_hierarchy(id, row)))
    }

    /// Structure with uuid `id`.
    async fn fetch_structure(&self, id: &str) -> Result<Option<StructureDefinition>> {
        let s = Term::var("s");
        let query = SelectQuery::all()
            .patterns(describe(&s, vocab::ESCO_STRUCTURE, id))
            .pattern(required(&s, vocab::ESCO_CODED_PROPERTY, "codedProperty"))
            .pattern(required(&s, vocab::ESCO_STRUCTURE_FOR, "structureFor"))
            .pattern(required(&s, vocab::ESCO_CODE_LIST, "codeList"))
            .pattern(optional(&s, vocab::ETMS_FETCH_CHILDREN, "fetchChildren"))
            .to_string();

        let rows = self.store.query(&query).await?;
        Ok(rows
            .first()
            .and_then(|row| StructureDefinition::from_row(id, row)))
    }
}

/// `?s a <class> ; skos:prefLabel ?name ; mu:uuid "id" .`
fn describe(s: &Term, class: &str, id: &str) -> Vec<Pattern> {
    vec![
        Pattern::triple(s.clone(), PropertyPath::iri(vocab::RDF_TYPE), Term::iri(class)),
        required(s, vocab::SKOS_PREF_LABEL, "name"),
        Pattern::triple(s.clone(), PropertyPath::iri(vocab::MU_CORE_UUID), Term::literal(id)),
    ]
}

fn required(s: &Term, predicate: &str, var: &str) -> Pattern {
    Pattern::triple(s.clone(), PropertyPath::iri(predicate), Term::var(var))
}

fn optional(s: &Term, predicate: &str, var: &str) -> Pattern {
    Pattern::Optional(vec![required(s, predicate, var)])
}

/// Definition from a stored hierarchy row.
///
/// A stored `path` wins; otherwise a coded property gives `coded | broader`,
/// and with neither the path is plain `skos:broader`.
fn stored_hierarchy(id: &str, row: &Row) -> HierarchyDefinition {
    let broader = PropertyPath::iri(vocab::SKOS_BROADER);
    let coded = row.get("codedProperty").map(str::trim).filter(|c| !c.is_empty());

    let primary_path = match row.get("path").map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => PropertyPath::parse_stored(path),
        None => match coded {
            Some(coded) if coded != vocab::SKOS_BROADER => {
                PropertyPath::Alternative(vec![PropertyPath::iri(coded), broader])
            }
            _ => broader,
        },
    };

    let restriction = row
        .get("restriction")
        .filter(|r| !r.trim().is_empty())
        .map(|r| vec![Pattern::raw(r)])
        .unwrap_or_default();

    HierarchyDefinition {
        name: row.get("name").unwrap_or_default().to_string(),
        id: id.to_string(),
        primary_path,
        extension_path: None,
        restriction,
    }
}
