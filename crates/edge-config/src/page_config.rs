//! Page config records.
//!
//! A page config starts out as an immutable [`PageConfigRuntime`] built during
//! discovery. Loading never mutates it: it produces a new immutable
//! [`PageConfigLoaded`], and the cache entry ([`PageConfigState`]) is swapped
//! from `Unloaded` to `Loaded`.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{DefinedAt, ExportValue, PageId};

use crate::imports::ImportRegistry;
use crate::serialized::SerializedConfigValue;

/// A materialized config value plus where it was defined.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    /// The data or hook handed to application code.
    pub value: ExportValue,
    /// Definition sites, for diagnostics only.
    pub defined_at: DefinedAt,
}

impl ConfigValue {
    /// A value with no user definition site.
    pub fn internal(value: impl Into<ExportValue>) -> Self {
        Self {
            value: value.into(),
            defined_at: Vec::new(),
        }
    }

    /// A value with the given definition sites.
    pub fn new(value: impl Into<ExportValue>, defined_at: DefinedAt) -> Self {
        Self {
            value: value.into(),
            defined_at,
        }
    }
}

/// Config values keyed by config name.
pub type ConfigValues = BTreeMap<String, ConfigValue>;

/// Bulk loader of the serialized config values of one page.
///
/// In the browser this fetches the page's config chunk; on the server it
/// imports the build output.
#[async_trait]
pub trait ConfigValuesLoader: Send + Sync {
    /// Load every serialized config value of the page.
    async fn load_all(&self) -> anyhow::Result<Vec<SerializedConfigValue>>;
}

/// Loader backed by values that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigValues(pub Vec<SerializedConfigValue>);

impl StaticConfigValues {
    /// Wrap the values into a shareable loader.
    pub fn shared(values: Vec<SerializedConfigValue>) -> Arc<dyn ConfigValuesLoader> {
        Arc::new(Self(values))
    }
}

#[async_trait]
impl ConfigValuesLoader for StaticConfigValues {
    async fn load_all(&self) -> anyhow::Result<Vec<SerializedConfigValue>> {
        Ok(self.0.clone())
    }
}

/// Loader backed by an async closure.
pub struct FnConfigValuesLoader<F>(F);

#[async_trait]
impl<F, Fut> ConfigValuesLoader for FnConfigValuesLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<SerializedConfigValue>>> + Send + 'static,
{
    async fn load_all(&self) -> anyhow::Result<Vec<SerializedConfigValue>> {
        (self.0)().await
    }
}

/// Build a loader from an async closure.
pub fn config_values_loader<F, Fut>(f: F) -> Arc<dyn ConfigValuesLoader>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Vec<SerializedConfigValue>>> + Send + 'static,
{
    Arc::new(FnConfigValuesLoader(f))
}

/// One page's config record as produced by discovery, values not yet loaded.
#[derive(Clone)]
pub struct PageConfigRuntime {
    /// Page identifier.
    pub page_id: PageId,
    /// Route string of the page, if it has one (error pages don't).
    pub route: Option<String>,
    /// Values known at discovery time.
    pub config_values: ConfigValues,
    loader: Arc<dyn ConfigValuesLoader>,
    imports: Arc<ImportRegistry>,
}

impl PageConfigRuntime {
    /// Create a record with a bulk loader.
    pub fn new(page_id: impl Into<PageId>, loader: Arc<dyn ConfigValuesLoader>) -> Self {
        Self {
            page_id: page_id.into(),
            route: None,
            config_values: BTreeMap::new(),
            loader,
            imports: Arc::default(),
        }
    }

    /// Set the route string.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Add a value known at discovery time.
    pub fn with_config_value(mut self, name: impl Into<String>, value: ConfigValue) -> Self {
        self.config_values.insert(name.into(), value);
        self
    }

    /// Resolve code references of loaded values through `imports`.
    pub fn with_imports(mut self, imports: Arc<ImportRegistry>) -> Self {
        self.imports = imports;
        self
    }

    /// The bulk loader.
    pub fn loader(&self) -> &Arc<dyn ConfigValuesLoader> {
        &self.loader
    }

    /// Callables code references resolve to.
    pub fn imports(&self) -> &ImportRegistry {
        &self.imports
    }
}

impl fmt::Debug for PageConfigRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageConfigRuntime")
            .field("page_id", &self.page_id)
            .field("route", &self.route)
            .field("config_values", &self.config_values)
            .finish_non_exhaustive()
    }
}

/// A page config record with every value materialized.
#[derive(Debug, Clone)]
pub struct PageConfigLoaded {
    runtime: Arc<PageConfigRuntime>,
    config_values: ConfigValues,
}

impl PageConfigLoaded {
    pub(crate) fn new(runtime: Arc<PageConfigRuntime>, config_values: ConfigValues) -> Self {
        Self {
            runtime,
            config_values,
        }
    }

    /// Page identifier.
    pub fn page_id(&self) -> &PageId {
        &self.runtime.page_id
    }

    /// The record this was loaded from.
    pub fn runtime(&self) -> &Arc<PageConfigRuntime> {
        &self.runtime
    }

    /// All materialized values.
    pub fn config_values(&self) -> &ConfigValues {
        &self.config_values
    }

    /// Get one value.
    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.config_values.get(name)
    }
}

/// Cached state of one page config record.
#[derive(Debug, Clone)]
pub enum PageConfigState {
    /// Values not loaded yet.
    Unloaded(Arc<PageConfigRuntime>),
    /// All values loaded.
    Loaded(Arc<PageConfigLoaded>),
}

impl PageConfigState {
    /// Page identifier.
    pub fn page_id(&self) -> &PageId {
        &self.runtime().page_id
    }

    /// The underlying discovery record.
    pub fn runtime(&self) -> &Arc<PageConfigRuntime> {
        match self {
            Self::Unloaded(runtime) => runtime,
            Self::Loaded(loaded) => loaded.runtime(),
        }
    }

    /// Whether every value has been materialized.
    pub fn is_all_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Values available right now.
    pub fn config_values(&self) -> &ConfigValues {
        match self {
            Self::Unloaded(runtime) => &runtime.config_values,
            Self::Loaded(loaded) => loaded.config_values(),
        }
    }
}

impl From<PageConfigRuntime> for PageConfigState {
    fn from(runtime: PageConfigRuntime) -> Self {
        Self::Unloaded(Arc::new(runtime))
    }
}
