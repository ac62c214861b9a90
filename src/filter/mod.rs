//! Named filters: reusable query fragments applied on top of a traversal.

mod registry;
mod template;

pub use registry::FilterRegistry;
pub use template::{descendant_to_node, FilterTemplate, MacroDepth, DESCENDANT_TO_NODE, PATH};

use std::collections::BTreeMap;

use crate::config::FiltersConfig;
use crate::hierarchy::HierarchyDefinition;
use crate::sparql::{Pattern, PropertyPath};

/// Request parameters with this prefix are bound into filter templates.
pub const FILTER_PARAM_PREFIX: &str = "filter-";

/// Depth bound used when a filter does not declare a usable one.
pub const DEFAULT_FILTER_DEPTH: usize = 5;

/// Largest `levels` or filter depth accepted unless configured otherwise.
pub const DEFAULT_MAX_LEVELS: usize = 50;

/// Depth defaults and the upper bound on requested and stored depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimits {
    pub default_depth: usize,
    pub max_levels: usize,
}

impl DepthLimits {
    pub fn new(default_depth: usize, max_levels: usize) -> Self {
        let max_levels = max_levels.max(1);
        Self {
            default_depth: default_depth.clamp(1, max_levels),
            max_levels,
        }
    }

    pub fn from_config(config: &FiltersConfig) -> Self {
        Self::new(config.default_depth, config.max_levels)
    }
}

impl Default for DepthLimits {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_DEPTH, DEFAULT_MAX_LEVELS)
    }
}

/// A stored filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDefinition {
    pub id: String,
    pub name: String,
    pub template: FilterTemplate,
    /// Bound for the descendant macro. Always at least 1.
    pub max_depth: usize,
}

impl FilterDefinition {
    /// `depth` is the stored depth text, if any. Missing, unparseable,
    /// non-positive or over-limit values fall back to the default depth.
    pub fn new(
        id: &str,
        name: &str,
        template: &str,
        depth: Option<&str>,
        limits: DepthLimits,
    ) -> Self {
        let fallback = limits.default_depth;
        let max_depth = match depth.map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => match text.parse::<i64>() {
                Ok(d) if d <= 0 => fallback,
                Ok(d) if d as u64 > limits.max_levels as u64 => {
                    log::warn!(
                        "Filter {} depth {} exceeds the limit of {}, using {}",
                        id,
                        d,
                        limits.max_levels,
                        fallback
                    );
                    fallback
                }
                Ok(d) => d as usize,
                Err(_) => {
                    log::warn!("Filter {} has unusable depth {:?}, using {}", id, text, fallback);
                    fallback
                }
            },
            None => fallback,
        };

        Self {
            id: id.to_string(),
            name: name.to_string(),
            template: FilterTemplate::parse(template),
            max_depth: max_depth.max(1),
        }
    }

    /// Filter fragment for one descendant level: the macro connects at exactly
    /// `level` hops.
    pub fn apply_at_level(
        &self,
        hierarchy: &HierarchyDefinition,
        traversal_path: &PropertyPath,
        params: &BTreeMap<String, String>,
        level: usize,
    ) -> Pattern {
        Pattern::raw(self.template.render(
            hierarchy,
            traversal_path,
            params,
            MacroDepth::Level(level),
        ))
    }

    /// Filter fragment for a single unbounded walk: the macro accepts any
    /// depth up to `max_depth`, or the node itself.
    pub fn apply_bounded(
        &self,
        hierarchy: &HierarchyDefinition,
        traversal_path: &PropertyPath,
        params: &BTreeMap<String, String>,
    ) -> Pattern {
        Pattern::raw(self.template.render(
            hierarchy,
            traversal_path,
            params,
            MacroDepth::UpTo(self.max_depth),
        ))
    }
}

/// Pick the `filter-` parameters out of a request, keyed by their stripped name.
pub fn filter_params<'a, I>(params: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    params
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(FILTER_PARAM_PREFIX)
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect()
}
