use std::collections::BTreeMap;

use super::{uuid_pattern, ConceptRef, ConceptSet};
use crate::error::Result;
use crate::filter::FilterDefinition;
use crate::hierarchy::HierarchyDefinition;
use crate::sparql::{Pattern, PropertyPath, SelectQuery, Term};
use crate::store::GraphStore;

/// `primary*`, then at most one extension hop.
fn ancestor_path(hierarchy: &HierarchyDefinition) -> PropertyPath {
    let closure = hierarchy.primary_path.clone().zero_or_more();
    match &hierarchy.extension_path {
        Some(extension) => closure.then(extension.clone().zero_or_one()),
        None => closure,
    }
}

/// Ancestors of the node with uuid `target`, in a single query. The target
/// itself is never part of the result.
pub async fn fetch_ancestors(
    store: &dyn GraphStore,
    hierarchy: &HierarchyDefinition,
    target: &str,
    filter: Option<&FilterDefinition>,
    params: &BTreeMap<String, String>,
) -> Result<Vec<ConceptRef>> {
    let filter_pattern = filter
        .map(|f| f.apply_bounded(hierarchy, &hierarchy.primary_path, params))
        .unwrap_or(Pattern::Group(Vec::new()));

    let query = SelectQuery::select(&["nodeId"])
        .distinct()
        .pattern(uuid_pattern("target", Term::literal(target)))
        .pattern(Pattern::triple(
            Term::var("target"),
            ancestor_path(hierarchy),
            Term::var("node"),
        ))
        .pattern(uuid_pattern("node", Term::var("nodeId")))
        .patterns(hierarchy.restriction.iter().cloned())
        .pattern(filter_pattern)
        .to_string();

    log::debug!("Ancestors of {}:\n{}", target, query);
    let rows = store.query(&query).await?;

    let mut ancestors = ConceptSet::default();
    ancestors.extend_from_rows(&rows, Some(target));
    Ok(ancestors.into_vec())
}
