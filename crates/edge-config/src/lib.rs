//! Config values of every page: storage, lookup and lazy loading.
//!
//! This crate provides:
//! - `SerializedConfigValue` - Wire form of config values produced at build time
//! - `ImportRegistry` - Callables referenced by config values
//! - `PageConfigRuntime` / `PageConfigLoaded` - Unloaded and loaded page config records
//! - `ConfigValueStore` - Project-wide cache of page config records
//! - `find_page_config` - Page config lookup by page id
//! - `load_config_values` - Lazy config value materialization
//! - `LoadError` - Loading failures, including stale-asset fetch failures
//!
//! # Example
//!
//! ```ignore
//! use edge_config::{ConfigValueStore, PageConfigRuntime, StaticConfigValues};
//! use edge_core::Mode;
//!
//! let store = ConfigValueStore::new(vec![
//!     PageConfigRuntime::new("/pages/index", StaticConfigValues::shared(values)),
//! ]);
//!
//! // First call runs the loader, later production calls hit the cache.
//! let loaded = store.load("/pages/index", Mode::Production).await?;
//! ```

mod error;
mod imports;
mod loader;
mod page_config;
mod resolver;
mod serialized;
mod store;

pub use error::*;
pub use imports::*;
pub use loader::*;
pub use page_config::*;
pub use resolver::*;
pub use serialized::*;
pub use store::*;
