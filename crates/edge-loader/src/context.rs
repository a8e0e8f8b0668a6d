//! Page context: the per-request holder of loaded exports.

use std::sync::Arc;

use edge_config::{needs_load, LoadResult};
use edge_core::{LifecycleObserver, LoadPhase, Mode, PageId, RequestContext};
use edge_observability::{
    ConfigCacheStatus, LoadMetrics, LoadMetricsCollector, LoadOutcome, LogFormat, LogLevel,
    StructuredLogger,
};

use crate::exports::{ExportValue, ExportsAddendum};
use crate::orchestrator::PageLoader;

/// Request-scoped page context.
///
/// Loading merges an [`ExportsAddendum`] into the context. Loading again
/// replaces it, and a failed load clears it; when several navigations race,
/// the caller keeps whichever context it rendered last.
pub struct PageContext {
    /// Request identity, environment and timing.
    pub request: RequestContext,
    /// Page being rendered.
    pub page_id: PageId,
    exports: Option<ExportsAddendum>,
    metrics: Option<LoadMetrics>,
    logger: StructuredLogger,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl PageContext {
    /// Create a context for rendering `page_id`.
    pub fn new(request: RequestContext, page_id: impl Into<PageId>) -> Self {
        let page_id = page_id.into();
        let logger = match request.mode {
            Mode::Development => StructuredLogger::new(request.request_id.clone())
                .with_format(LogFormat::Human)
                .with_min_level(LogLevel::Debug),
            Mode::Production => StructuredLogger::new(request.request_id.clone()),
        }
        .with_page_id(page_id.as_str());

        Self {
            request,
            page_id,
            exports: None,
            metrics: None,
            logger,
            observers: Vec::new(),
        }
    }

    /// Replace the logger.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Add a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Load the page's exports for the request's environment and merge them
    /// into this context.
    pub async fn load_exports(&mut self, loader: &PageLoader) -> LoadResult<&ExportsAddendum> {
        let env = self.request.environment;
        let mut metrics =
            LoadMetricsCollector::new(self.request.request_id.clone(), self.page_id.as_str(), env);

        let cache = match loader.assets().page_configs.find(self.page_id.as_str()) {
            None => ConfigCacheStatus::NoRecord,
            Some(state) => {
                if let Some(route) = &state.runtime().route {
                    self.logger = self.logger.clone().with_route(route.as_str());
                }
                if needs_load(&state, loader.mode()) {
                    ConfigCacheStatus::Miss
                } else {
                    ConfigCacheStatus::Hit
                }
            }
        };
        if cache == ConfigCacheStatus::Hit {
            self.logger.debug("config values served from cache");
        }
        metrics.record_config_cache(cache);

        self.emit(LoadPhase::Start);

        match loader.load(self.page_id.as_str(), env).await {
            Ok(addendum) => {
                if let Some(load_time) = addendum.config_load_time {
                    metrics.record_config_loaded(load_time);
                    self.emit(LoadPhase::ConfigLoaded);
                }
                for file in &addendum.loaded_page_files {
                    let Some(load_time) = addendum.file_load_times.get(&file.file_path) else {
                        continue;
                    };
                    metrics.record_file(&file.file_path, *load_time);
                    self.emit(LoadPhase::FileLoaded(file.file_path.clone()));
                }
                self.emit(LoadPhase::Completion);

                self.metrics = Some(metrics.finalize(LoadOutcome::Success, None));
                let exports = self.exports.insert(addendum);
                Ok(&*exports)
            }
            Err(err) => {
                self.exports = None;
                let outcome = if err.is_stale_asset() {
                    LoadOutcome::StaleAsset
                } else {
                    LoadOutcome::Failed
                };
                self.emit(LoadPhase::Error(err.to_string()));
                self.metrics = Some(metrics.finalize(outcome, Some(err.to_string())));
                Err(err)
            }
        }
    }

    /// Loaded exports, if the last load succeeded.
    pub fn exports(&self) -> Option<&ExportsAddendum> {
        self.exports.as_ref()
    }

    /// Final value of a config.
    pub fn config(&self, name: &str) -> Option<&ExportValue> {
        self.exports.as_ref()?.config.get(name)
    }

    /// Final value of an export.
    pub fn export(&self, name: &str) -> Option<&ExportValue> {
        self.exports.as_ref()?.exports.get(name)
    }

    /// Metrics of the last load.
    pub fn metrics(&self) -> Option<&LoadMetrics> {
        self.metrics.as_ref()
    }

    fn emit(&mut self, phase: LoadPhase) {
        self.request.timing.mark_phase(&phase);
        let elapsed = self.request.timing.elapsed();
        self.logger.on_phase(phase.clone(), elapsed);
        for observer in &self.observers {
            observer.on_phase(phase.clone(), elapsed);
        }
    }
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("request", &self.request)
            .field("page_id", &self.page_id)
            .field("exports", &self.exports)
            .field("observers", &self.observers.len())
            .finish()
    }
}
