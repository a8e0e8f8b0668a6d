//! Lazy config value loading.

use std::sync::Arc;

use edge_core::Mode;

use crate::error::LoadResult;
use crate::page_config::{PageConfigLoaded, PageConfigState};
use crate::serialized::parse_config_values_serialized;

/// Whether loading `state` in `mode` has to run the bulk loader.
///
/// A loaded record is final in production. In development the sources behind
/// it can change between calls, so it is always reloaded.
pub fn needs_load(state: &PageConfigState, mode: Mode) -> bool {
    !state.is_all_loaded() || mode.is_dev()
}

/// Materialize every config value of a page.
///
/// Returns the cached record without any async work when it is already loaded
/// and `mode` is production. Otherwise runs the bulk loader, decodes the
/// serialized values and overlays them onto the values known so far (new names
/// are added, existing names are overwritten). Loader failures are returned
/// unchanged.
///
/// This does not update any cache; see [`ConfigValueStore::load`] for that.
///
/// [`ConfigValueStore::load`]: crate::ConfigValueStore::load
pub async fn load_config_values(
    state: &PageConfigState,
    mode: Mode,
) -> LoadResult<Arc<PageConfigLoaded>> {
    if let PageConfigState::Loaded(loaded) = state {
        if !mode.is_dev() {
            return Ok(Arc::clone(loaded));
        }
    }

    let runtime = Arc::clone(state.runtime());
    let serialized = runtime.loader().load_all().await?;
    let parsed = parse_config_values_serialized(serialized, runtime.imports())?;

    let mut config_values = state.config_values().clone();
    config_values.extend(parsed);

    tracing::trace!(
        page_id = %runtime.page_id,
        values = config_values.len(),
        "config values loaded"
    );

    Ok(Arc::new(PageConfigLoaded::new(runtime, config_values)))
}
