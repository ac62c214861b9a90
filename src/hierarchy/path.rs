//! Fixed-length paths along a hierarchy.

use super::HierarchyDefinition;
use crate::sparql::{Pattern, PropertyPath, Term};

/// Path of exactly `levels` hops along the primary path. `levels` below 1 is
/// treated as 1.
pub fn build_path(hierarchy: &HierarchyDefinition, levels: usize) -> PropertyPath {
    hierarchy.primary_path.repeat(levels)
}

/// Pattern connecting `from` to `to` in exactly `levels` hops.
///
/// With an extension path the last hop may use the extension instead of the
/// primary path, giving a union of the two shapes. The union is skipped when
/// both branches render identically.
pub fn connect(from: &Term, to: &Term, hierarchy: &HierarchyDefinition, levels: usize) -> Pattern {
    let levels = levels.max(1);
    let primary = Pattern::triple(from.clone(), build_path(hierarchy, levels), to.clone());

    let extension = match &hierarchy.extension_path {
        Some(extension) => extension.clone(),
        None => return primary,
    };

    let other_path = if levels > 1 {
        build_path(hierarchy, levels - 1).then(extension)
    } else {
        extension
    };
    let other = Pattern::triple(from.clone(), other_path, to.clone());

    if other.to_string() == primary.to_string() {
        return primary;
    }

    Pattern::Union(vec![vec![primary], vec![other]])
}
