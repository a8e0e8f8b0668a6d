//! Observability for page loading.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request and page context
//! - `LoadMetricsCollector` / `LoadMetrics` - Per-page-load timing metrics

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export RequestId and TimingContext from edge-core for convenience
pub use edge_core::{RequestId, TimingContext};
