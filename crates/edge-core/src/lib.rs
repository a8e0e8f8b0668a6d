//! Core types for page config resolution and loading.
//!
//! This crate provides the fundamental types shared by every stage:
//! - `PageId` - Stable page identifier
//! - `DefinedAtFile` / `format_defined_at` - Definition-site diagnostics
//! - `Hook` / `ExportValue` - Callable and plain config values
//! - `FrameworkConfig` / `Mode` - Framework configuration
//! - `RequestContext` - Request identity, environment and timing
//! - `LoadPhase` - Page loading lifecycle tracking

mod config;
mod context;
mod defined_at;
mod hook;
mod lifecycle;
mod page;

pub use config::*;
pub use context::*;
pub use defined_at::*;
pub use hook::*;
pub use lifecycle::*;
pub use page::*;
