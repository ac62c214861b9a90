//! Process-wide filter table.
//!
//! Loaded from the store on first use, then served from memory. The table is
//! replaced by an explicit `reload()`, or on first use after it has grown
//! older than the optional refresh interval.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use super::{DepthLimits, FilterDefinition};
use crate::clock::Clock;
use crate::error::Result;
use crate::sparql::{Pattern, PropertyPath, SelectQuery, Term};
use crate::store::GraphStore;
use crate::vocab;

struct LoadedTable {
    filters: HashMap<String, Arc<FilterDefinition>>,
    loaded_at: DateTime<Utc>,
}

pub struct FilterRegistry {
    store: Arc<dyn GraphStore>,
    clock: Arc<dyn Clock>,
    limits: DepthLimits,
    refresh_interval: Option<Duration>,
    table: RwLock<Option<LoadedTable>>,
    /// Serializes loads so concurrent first uses issue one query.
    load_lock: Mutex<()>,
}

impl FilterRegistry {
    pub fn new(
        store: Arc<dyn GraphStore>,
        clock: Arc<dyn Clock>,
        limits: DepthLimits,
        refresh_interval: Option<Duration>,
    ) -> Self {
        Self {
            store,
            clock,
            limits,
            refresh_interval,
            table: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Look up a filter by uuid, loading the table if needed. An unknown id
    /// is `None`, not an error.
    pub async fn get(&self, id: &str) -> Result<Option<Arc<FilterDefinition>>> {
        if let Some(found) = self.lookup_fresh(id) {
            return Ok(found);
        }

        let _guard = self.load_lock.lock().await;
        // another caller may have loaded while we waited
        if let Some(found) = self.lookup_fresh(id) {
            return Ok(found);
        }

        self.load().await?;
        Ok(self.lookup_fresh(id).flatten())
    }

    /// Replace the table with the current store contents. Returns the number
    /// of filters loaded.
    pub async fn reload(&self) -> Result<usize> {
        let _guard = self.load_lock.lock().await;
        self.load().await
    }

    /// `Some(lookup)` when a fresh table is loaded, `None` when a load is due.
    fn lookup_fresh(&self, id: &str) -> Option<Option<Arc<FilterDefinition>>> {
        let now = self.clock.now();
        self.read_table(|table| {
            let table = table?;
            if let Some(interval) = self.refresh_interval {
                if now - table.loaded_at >= interval {
                    return None;
                }
            }
            Some(table.filters.get(id).cloned())
        })
    }

    fn read_table<T>(&self, f: impl FnOnce(Option<&LoadedTable>) -> T) -> T {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        f(table.as_ref())
    }

    /// Caller must hold `load_lock`.
    async fn load(&self) -> Result<usize> {
        let rows = self.store.query(&filters_query()).await?;

        let mut filters = HashMap::new();
        for row in &rows {
            let (Some(id), Some(template)) = (row.get("uuid"), row.get("filter")) else {
                log::warn!("Skipping filter row without uuid or filter text");
                continue;
            };
            let definition = FilterDefinition::new(
                id,
                row.get("name").unwrap_or_default(),
                template,
                row.get("depth"),
                self.limits,
            );
            filters.insert(id.to_string(), Arc::new(definition));
        }

        let count = filters.len();
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        *table = Some(LoadedTable {
            filters,
            loaded_at: self.clock.now(),
        });
        log::info!("Loaded {} filters", count);

        Ok(count)
    }
}

fn filters_query() -> String {
    let f = Term::var("f");
    SelectQuery::select(&["uuid", "name", "filter", "depth"])
        .pattern(Pattern::triple(
            f.clone(),
            PropertyPath::iri(vocab::RDF_TYPE),
            Term::iri(vocab::MU_HIERARCHY_FILTER_CLASS),
        ))
        .pattern(Pattern::triple(
            f.clone(),
            PropertyPath::iri(vocab::MU_CORE_UUID),
            Term::var("uuid"),
        ))
        .pattern(Pattern::triple(
            f.clone(),
            PropertyPath::iri(vocab::MU_HIERARCHY_FILTER),
            Term::var("filter"),
        ))
        .pattern(Pattern::triple(
            f.clone(),
            PropertyPath::iri(vocab::SKOS_PREF_LABEL),
            Term::var("name"),
        ))
        .pattern(Pattern::Optional(vec![Pattern::triple(
            f,
            PropertyPath::iri(vocab::MU_HIERARCHY_DEPTH),
            Term::var("depth"),
        )]))
        .to_string()
}
