//! Service facade: request model, cache signatures and the traversal entry
//! points used by the HTTP layer and the CLI.

use chrono::Duration;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cache::{MarkerPolicy, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{
    filter_params, DepthLimits, FilterDefinition, FilterRegistry, FILTER_PARAM_PREFIX,
};
use crate::hierarchy::HierarchyResolver;
use crate::store::GraphStore;
use crate::traversal::{fetch_ancestors, fetch_children, ConceptRef};

/// Which way a traversal walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Descendants,
    Ancestors,
}

impl Direction {
    fn route_segment(self) -> &'static str {
        match self {
            Direction::Descendants => "target",
            Direction::Ancestors => "ancestors",
        }
    }
}

/// One traversal request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalRequest {
    pub hierarchy_id: String,
    pub concept_id: String,
    /// Requested hop count; `None` means 1.
    pub levels: Option<usize>,
    pub filter_id: Option<String>,
    /// Template parameters, keyed without the `filter-` prefix.
    pub filter_params: BTreeMap<String, String>,
}

impl TraversalRequest {
    pub fn new(hierarchy_id: impl Into<String>, concept_id: impl Into<String>) -> Self {
        Self {
            hierarchy_id: hierarchy_id.into(),
            concept_id: concept_id.into(),
            ..Self::default()
        }
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_filter(mut self, filter_id: impl Into<String>) -> Self {
        self.filter_id = Some(filter_id.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter_params.insert(name.into(), value.into());
        self
    }

    /// Build from query-string parameters. `levels` that is not a positive
    /// integer is ignored; an empty `filter` means no filter.
    pub fn from_query(
        hierarchy_id: impl Into<String>,
        concept_id: impl Into<String>,
        query: &HashMap<String, String>,
    ) -> Self {
        let levels = query.get("levels").map(String::as_str).and_then(parse_levels);
        let filter_id = query
            .get("filter")
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        Self {
            hierarchy_id: hierarchy_id.into(),
            concept_id: concept_id.into(),
            levels,
            filter_id,
            filter_params: filter_params(query),
        }
    }

    /// Hop count actually traversed.
    pub fn effective_levels(&self) -> usize {
        self.levels.filter(|l| *l > 0).unwrap_or(1)
    }

    /// Canonical cache key: the route plus the parameters that influence the
    /// result, sorted and URL-encoded.
    pub fn signature(&self, direction: Direction) -> String {
        let mut params: Vec<(String, String)> = Vec::new();
        if direction == Direction::Descendants {
            params.push(("levels".to_string(), self.effective_levels().to_string()));
        }
        if let Some(filter_id) = &self.filter_id {
            params.push(("filter".to_string(), filter_id.clone()));
        }
        for (name, value) in &self.filter_params {
            params.push((format!("{}{}", FILTER_PARAM_PREFIX, name), value.clone()));
        }
        params.sort();

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        format!(
            "/hierarchies/{}/{}/{}?{}",
            encode_segment(&self.hierarchy_id),
            direction.route_segment(),
            encode_segment(&self.concept_id),
            query
        )
    }
}

fn parse_levels(raw: &str) -> Option<usize> {
    match raw.trim().parse::<i64>() {
        Ok(levels) if levels > 0 => Some(levels as usize),
        Ok(_) => None,
        Err(_) => {
            log::warn!("Ignoring unparseable levels value {:?}", raw);
            None
        }
    }
}

fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Traversal entry points backed by a shared result cache and filter table.
pub struct HierarchyService {
    store: Arc<dyn GraphStore>,
    resolver: HierarchyResolver,
    filters: FilterRegistry,
    cache: ResultCache,
    limits: DepthLimits,
}

impl HierarchyService {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn GraphStore>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let refresh_interval = config
            .filters
            .refresh_interval_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds);
        let limits = DepthLimits::from_config(&config.filters);

        Self {
            resolver: HierarchyResolver::new(store.clone()),
            filters: FilterRegistry::new(
                store.clone(),
                clock.clone(),
                limits,
                refresh_interval,
            ),
            cache: ResultCache::new(
                MarkerPolicy::from_config(&config.cache),
                clock,
                config.cache.max_entries,
            ),
            store,
            limits,
        }
    }

    pub async fn fetch_descendants(&self, request: &TraversalRequest) -> Result<Vec<ConceptRef>> {
        let request = self.within_limits(request);
        let signature = request.signature(Direction::Descendants);
        self.cache
            .get_or_compute(&signature, || self.compute_descendants(&request))
            .await
    }

    pub async fn fetch_ancestors(&self, request: &TraversalRequest) -> Result<Vec<ConceptRef>> {
        let signature = request.signature(Direction::Ancestors);
        self.cache
            .get_or_compute(&signature, || self.compute_ancestors(request))
            .await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        log::info!("Result cache cleared");
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Reload the filter table. Cached results are kept.
    pub async fn reload_filters(&self) -> Result<usize> {
        self.filters.reload().await
    }

    async fn compute_descendants(&self, request: &TraversalRequest) -> Result<Vec<ConceptRef>> {
        let hierarchy = self.resolver.resolve(&request.hierarchy_id, false).await?;
        let filter = self.lookup_filter(request).await?;
        fetch_children(
            self.store.as_ref(),
            &hierarchy,
            &request.concept_id,
            request.effective_levels(),
            filter.as_deref(),
            &request.filter_params,
        )
        .await
    }

    async fn compute_ancestors(&self, request: &TraversalRequest) -> Result<Vec<ConceptRef>> {
        let hierarchy = self.resolver.resolve(&request.hierarchy_id, true).await?;
        let filter = self.lookup_filter(request).await?;
        fetch_ancestors(
            self.store.as_ref(),
            &hierarchy,
            &request.concept_id,
            filter.as_deref(),
            &request.filter_params,
        )
        .await
    }

    /// `request` with a `levels` above the configured maximum reset to the
    /// default.
    fn within_limits(&self, request: &TraversalRequest) -> TraversalRequest {
        let mut request = request.clone();
        if let Some(levels) = request.levels.filter(|l| *l > self.limits.max_levels) {
            log::warn!(
                "Ignoring levels {} above the limit of {}",
                levels,
                self.limits.max_levels
            );
            request.levels = None;
        }
        request
    }

    async fn lookup_filter(
        &self,
        request: &TraversalRequest,
    ) -> Result<Option<Arc<FilterDefinition>>> {
        let Some(filter_id) = &request.filter_id else {
            return Ok(None);
        };
        let filter = self.filters.get(filter_id).await?;
        if filter.is_none() {
            log::warn!("Unknown filter {}, traversing without it", filter_id);
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::HierarchyError;
    use crate::store::memory::{node_rows, MemoryStore};
    use crate::store::Row;
    use crate::vocab;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn service(store: MemoryStore) -> (HierarchyService, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::default());
        let service =
            HierarchyService::with_clock(store.clone(), &Config::default(), clock.clone());
        (service, store, clock)
    }

    fn filter_row() -> Row {
        Row::from_pairs(&[
            ("uuid", "by-status"),
            ("name", "By status"),
            ("filter", "?node <http://example.org/status> \"#{status}\" ."),
        ])
    }

    #[test]
    fn test_from_query() {
        let request = TraversalRequest::from_query(
            "h1",
            "n1",
            &query(&[
                ("levels", "3"),
                ("filter", "f1"),
                ("filter-status", "draft"),
                ("other", "x"),
            ]),
        );
        assert_eq!(request.levels, Some(3));
        assert_eq!(request.filter_id.as_deref(), Some("f1"));
        assert_eq!(request.filter_params.len(), 1);
        assert_eq!(request.filter_params.get("status").map(String::as_str), Some("draft"));
    }

    #[test]
    fn test_malformed_levels_fall_back() {
        for raw in ["abc", "0", "-4", ""] {
            let request = TraversalRequest::from_query("h1", "n1", &query(&[("levels", raw)]));
            assert_eq!(request.levels, None, "levels={:?}", raw);
            assert_eq!(request.effective_levels(), 1);
        }
    }

    #[test]
    fn test_empty_filter_is_none() {
        let request = TraversalRequest::from_query("h1", "n1", &query(&[("filter", "")]));
        assert!(request.filter_id.is_none());
    }

    #[test]
    fn test_signature_is_canonical() {
        let a = TraversalRequest::new("h1", "n1")
            .with_filter("f")
            .with_param("status", "draft")
            .with_param("lang", "en");
        let b = TraversalRequest::new("h1", "n1")
            .with_param("lang", "en")
            .with_param("status", "draft")
            .with_filter("f")
            .with_levels(1);
        assert_eq!(a.signature(Direction::Descendants), b.signature(Direction::Descendants));
        assert_eq!(
            a.signature(Direction::Descendants),
            "/hierarchies/h1/target/n1?filter=f&filter-lang=en&filter-status=draft&levels=1"
        );
        assert_eq!(
            a.signature(Direction::Ancestors),
            "/hierarchies/h1/ancestors/n1?filter=f&filter-lang=en&filter-status=draft"
        );
    }

    #[test]
    fn test_signature_encodes_values() {
        let request = TraversalRequest::new("h 1", "n/1").with_param("q", "a&b=c");
        assert_eq!(
            request.signature(Direction::Ancestors),
            "/hierarchies/h+1/ancestors/n%2F1?filter-q=a%26b%3Dc"
        );
    }

    #[tokio::test]
    async fn test_descendants_cached() {
        let (service, store, _) = service(
            MemoryStore::new().answer_containing(&["?nodeId", "\"n1\""], node_rows(&["A", "B"])),
        );
        let request = TraversalRequest::new("h1", "n1");

        let first = service.fetch_descendants(&request).await.unwrap();
        let issued = store.query_count();
        let second = service.fetch_descendants(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(store.query_count(), issued);
        assert_eq!(service.cache_size(), 1);

        service.clear_cache();
        assert_eq!(service.cache_size(), 0);
        service.fetch_descendants(&request).await.unwrap();
        assert!(store.query_count() > issued);
    }

    #[tokio::test]
    async fn test_levels_above_limit_fall_back() {
        let (service, store, _) = service(MemoryStore::new());
        let request = TraversalRequest::from_query("h1", "n1", &query(&[("levels", "2000000000")]));
        assert_eq!(request.levels, Some(2_000_000_000));

        service.fetch_descendants(&request).await.unwrap();
        let one_hop = format!("?node <{}> ?target .", vocab::SKOS_BROADER);
        assert!(store.queries().iter().all(|q| !q.contains("?nodeId") || q.contains(&one_hop)));

        // shares the cache entry of the default request
        let issued = store.query_count();
        service
            .fetch_descendants(&TraversalRequest::new("h1", "n1"))
            .await
            .unwrap();
        assert_eq!(store.query_count(), issued);
        assert_eq!(service.cache_size(), 1);
    }

    #[tokio::test]
    async fn test_levels_at_limit_kept() {
        let (service, store, _) = service(MemoryStore::new());
        let request = TraversalRequest::new("h1", "n1").with_levels(50);
        service.fetch_descendants(&request).await.unwrap();

        let hops = format!("<{}>", vocab::SKOS_BROADER);
        let traversal = store
            .queries()
            .into_iter()
            .find(|q| q.contains("?nodeId"))
            .unwrap();
        assert_eq!(traversal.matches(&hops).count(), 50);
    }

    #[tokio::test]
    async fn test_volatile_request_expires() {
        let (service, store, clock) = service(
            MemoryStore::new()
                .answer_containing(&[vocab::MU_HIERARCHY_FILTER_CLASS], vec![filter_row()])
                .answer_containing(&["?nodeId"], node_rows(&["A"])),
        );
        let request = TraversalRequest::new("h1", "n1")
            .with_filter("by-status")
            .with_param("status", "draft");

        service.fetch_ancestors(&request).await.unwrap();
        let issued = store.query_count();

        clock.advance(Duration::minutes(30));
        service.fetch_ancestors(&request).await.unwrap();
        assert_eq!(store.query_count(), issued);

        clock.advance(Duration::minutes(31));
        service.fetch_ancestors(&request).await.unwrap();
        assert!(store.query_count() > issued);
    }

    #[tokio::test]
    async fn test_filter_applied() {
        let (service, store, _) = service(
            MemoryStore::new()
                .answer_containing(&[vocab::MU_HIERARCHY_FILTER_CLASS], vec![filter_row()]),
        );
        let request = TraversalRequest::new("h1", "n1")
            .with_filter("by-status")
            .with_param("status", "published");
        service.fetch_descendants(&request).await.unwrap();

        let traversal = store
            .queries()
            .into_iter()
            .find(|q| q.contains("?nodeId"))
            .unwrap();
        assert!(traversal.contains("<http://example.org/status> \"published\""));
    }

    #[tokio::test]
    async fn test_unknown_filter_ignored() {
        let (service, store, _) = service(MemoryStore::new());
        let request = TraversalRequest::new("h1", "n1").with_filter("missing");
        let result = service.fetch_descendants(&request).await.unwrap();
        assert!(result.is_empty());
        assert!(store.queries().iter().any(|q| q.contains("?nodeId")));
    }

    #[tokio::test]
    async fn test_store_fault_not_cached() {
        let (service, _, _) = service(MemoryStore::new().fail(|_| true, "down"));
        let err = service
            .fetch_ancestors(&TraversalRequest::new("h1", "n1"))
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Store(_)));
        assert_eq!(service.cache_size(), 0);
    }

    #[tokio::test]
    async fn test_reload_filters() {
        let (service, _, _) = service(
            MemoryStore::new()
                .answer_containing(&[vocab::MU_HIERARCHY_FILTER_CLASS], vec![filter_row()]),
        );
        assert_eq!(service.reload_filters().await.unwrap(), 1);
    }
}
