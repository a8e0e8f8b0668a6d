//! Request identity and per-request context.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::Mode;
use crate::lifecycle::TimingContext;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_COUNTER: AtomicU32 = AtomicU32::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let id = format!(
            "{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Environment a page is loaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Server-side rendering.
    Server,
    /// Browser runtime (hydration and client-side navigation).
    Client,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Request-scoped data shared by every stage of page loading.
#[derive(Debug)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// URL as received, including query string.
    pub url_original: String,
    /// Environment this request runs in.
    pub environment: Environment,
    /// Development or production.
    pub mode: Mode,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(url_original: impl Into<String>, environment: Environment, mode: Mode) -> Self {
        Self {
            request_id: RequestId::generate(),
            url_original: url_original.into(),
            environment,
            mode,
            timing: TimingContext::new(),
        }
    }

    /// URL without query string or hash.
    pub fn url_pathname(&self) -> &str {
        let end = self
            .url_original
            .find(['?', '#'])
            .unwrap_or(self.url_original.len());
        &self.url_original[..end]
    }

    /// Whether this request runs in development mode.
    pub fn is_dev(&self) -> bool {
        self.mode.is_dev()
    }
}
