//! Code references of config values.
//!
//! A config value that points at code (`onRenderHtml: import('./onRenderHtml')`)
//! is serialized as an import path plus export name. The build bundles every
//! such module, so by the time a page's config values are loaded the code is
//! already available; the registry maps each reference to its callable.

use std::collections::HashMap;

use edge_core::Hook;

/// Callables reachable from serialized config values, keyed by import path and
/// export name.
#[derive(Debug, Clone, Default)]
pub struct ImportRegistry {
    hooks: HashMap<(String, String), Hook>,
}

impl ImportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callable exported as `export_name` by `import_path`.
    pub fn register(&mut self, import_path: impl Into<String>, export_name: impl Into<String>, hook: Hook) {
        self.hooks.insert((import_path.into(), export_name.into()), hook);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_hook(mut self, import_path: impl Into<String>, export_name: impl Into<String>, hook: Hook) -> Self {
        self.register(import_path, export_name, hook);
        self
    }

    /// Look up a code reference.
    pub fn resolve(&self, import_path: &str, export_name: &str) -> Option<&Hook> {
        self.hooks
            .get(&(import_path.to_string(), export_name.to_string()))
    }

    /// Number of registered callables.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
