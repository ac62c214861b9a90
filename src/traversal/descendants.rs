use std::collections::{BTreeMap, HashSet};

use super::{uuid_pattern, ConceptRef, ConceptSet};
use crate::error::Result;
use crate::filter::{FilterDefinition, DEFAULT_FILTER_DEPTH};
use crate::hierarchy::{build_path, connect, HierarchyDefinition};
use crate::sparql::{Pattern, SelectQuery, Term};
use crate::store::GraphStore;

/// Level bound when no filter is given.
pub const UNFILTERED_MAX_LEVEL: usize = DEFAULT_FILTER_DEPTH;

/// Descendants of the node with uuid `target`, `levels` hops below it.
///
/// One query is compiled per filter level from 0 to the filter's depth (or
/// `UNFILTERED_MAX_LEVEL`), with the descendant macro bound to that level. Levels
/// that compile to an already issued query are skipped. Results are merged
/// into one set.
pub async fn fetch_children(
    store: &dyn GraphStore,
    hierarchy: &HierarchyDefinition,
    target: &str,
    levels: usize,
    filter: Option<&FilterDefinition>,
    params: &BTreeMap<String, String>,
) -> Result<Vec<ConceptRef>> {
    let levels = levels.max(1);
    let path = build_path(hierarchy, levels);
    let node_to_target = connect(&Term::var("node"), &Term::var("target"), hierarchy, levels);
    let max_level = filter.map(|f| f.max_depth).unwrap_or(UNFILTERED_MAX_LEVEL);

    let mut issued = HashSet::new();
    let mut children = ConceptSet::default();

    for level in 0..=max_level {
        let filter_pattern = filter
            .map(|f| f.apply_at_level(hierarchy, &path, params, level))
            .unwrap_or(Pattern::Group(Vec::new()));

        let query = SelectQuery::select(&["nodeId"])
            .distinct()
            .pattern(uuid_pattern("target", Term::literal(target)))
            .pattern(node_to_target.clone())
            .pattern(uuid_pattern("node", Term::var("nodeId")))
            .patterns(hierarchy.restriction.iter().cloned())
            .pattern(filter_pattern)
            .to_string();

        if !issued.insert(query.clone()) {
            continue;
        }

        log::debug!("Descendants of {} at filter level {}:\n{}", target, level, query);
        let rows = store.query(&query).await?;
        children.extend_from_rows(&rows, None);
    }

    Ok(children.into_vec())
}
