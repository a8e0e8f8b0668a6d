//! Project-wide config value store.

use std::sync::Arc;

use dashmap::DashMap;
use edge_core::{Mode, PageId};

use crate::error::LoadResult;
use crate::loader::load_config_values;
use crate::page_config::{PageConfigLoaded, PageConfigRuntime, PageConfigState};

/// Cache of every page config record of the project, keyed by page id.
///
/// Built once from the discovery output and read by every request. Entries are
/// immutable; loading a page replaces its `Unloaded` entry by a `Loaded` one in
/// a single insert, so readers never observe a half-loaded record.
#[derive(Debug, Default)]
pub struct ConfigValueStore {
    entries: DashMap<PageId, PageConfigState>,
    order: Vec<PageId>,
}

impl ConfigValueStore {
    /// Build the store from discovery records. When two records share a page
    /// id the first one is kept.
    pub fn new(records: impl IntoIterator<Item = PageConfigRuntime>) -> Self {
        let entries = DashMap::new();
        let mut order = Vec::new();

        for record in records {
            if entries.contains_key(&record.page_id) {
                tracing::warn!(page_id = %record.page_id, "duplicate page config record ignored");
                continue;
            }
            order.push(record.page_id.clone());
            entries.insert(record.page_id.clone(), PageConfigState::from(record));
        }

        Self { entries, order }
    }

    /// Number of page config records.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store has no record.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Page ids in discovery order.
    pub fn page_ids(&self) -> &[PageId] {
        &self.order
    }

    /// Current state of a page's config record, if the page has one.
    pub fn find(&self, page_id: &str) -> Option<PageConfigState> {
        self.entries.get(page_id).map(|entry| entry.value().clone())
    }

    /// Load a page's config values and cache the loaded record.
    ///
    /// `Ok(None)` means the page has no config record of its own.
    pub async fn load(
        &self,
        page_id: &str,
        mode: Mode,
    ) -> LoadResult<Option<Arc<PageConfigLoaded>>> {
        match self.find(page_id) {
            Some(state) => self.load_state(&state, mode).await.map(Some),
            None => Ok(None),
        }
    }

    /// Load `state` and cache the result.
    ///
    /// Concurrent loads of the same page may each run the loader; the last one
    /// to finish is cached. All of them hold the same logical values. A load
    /// that started before the page was invalidated returns its values but
    /// does not cache them.
    pub async fn load_state(
        &self,
        state: &PageConfigState,
        mode: Mode,
    ) -> LoadResult<Arc<PageConfigLoaded>> {
        let loaded = load_config_values(state, mode).await?;

        let unchanged = matches!(state, PageConfigState::Loaded(prev) if Arc::ptr_eq(prev, &loaded));
        if !unchanged {
            match self.entries.get_mut(state.page_id()) {
                Some(mut entry) if Arc::ptr_eq(entry.runtime(), state.runtime()) => {
                    *entry = PageConfigState::Loaded(Arc::clone(&loaded));
                }
                _ => {
                    tracing::trace!(page_id = %state.page_id(), "record changed during load, not cached");
                }
            }
        }

        Ok(loaded)
    }

    /// Drop the loaded values of a page so the next load runs the loader again.
    pub fn invalidate(&self, page_id: &str) {
        if let Some(mut entry) = self.entries.get_mut(page_id) {
            // New record identity: loads still running against the old one
            // must not cache their result.
            let runtime = Arc::new(PageConfigRuntime::clone(entry.runtime()));
            *entry = PageConfigState::Unloaded(runtime);
        }
    }

    /// Drop the loaded values of every page.
    pub fn invalidate_all(&self) {
        for page_id in &self.order {
            self.invalidate(page_id.as_str());
        }
    }
}
