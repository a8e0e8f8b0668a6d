//! Hooks and export values.
//!
//! A page's config values and exports are either plain data or callables
//! (`onRenderHtml`, `data`, ...). Both the config system and legacy page
//! files produce them, so the type lives here.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// Signature of a hook.
pub type HookFn =
    dyn Fn(serde_json::Value) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync;

/// A callable export, e.g. `onRenderHtml` or `data`.
#[derive(Clone)]
pub struct Hook {
    name: String,
    f: Arc<HookFn>,
}

impl Hook {
    /// Wrap an async function as a hook.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |arg| -> BoxFuture<'static, anyhow::Result<serde_json::Value>> {
                Box::pin(f(arg))
            }),
        }
    }

    /// Hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the hook.
    pub async fn call(&self, arg: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        (self.f)(arg).await
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.name)
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

/// Value of one config or export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    /// Plain data.
    Value(serde_json::Value),
    /// Callable.
    Hook(Hook),
}

impl ExportValue {
    /// The data, if this is not a hook.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Hook(_) => None,
        }
    }

    /// The hook, if this is one.
    pub fn as_hook(&self) -> Option<&Hook> {
        match self {
            Self::Hook(hook) => Some(hook),
            Self::Value(_) => None,
        }
    }

    /// Whether this is a hook.
    pub fn is_hook(&self) -> bool {
        matches!(self, Self::Hook(_))
    }
}

impl PartialEq<serde_json::Value> for ExportValue {
    fn eq(&self, other: &serde_json::Value) -> bool {
        self.as_value() == Some(other)
    }
}

impl From<serde_json::Value> for ExportValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<Hook> for ExportValue {
    fn from(hook: Hook) -> Self {
        Self::Hook(hook)
    }
}
