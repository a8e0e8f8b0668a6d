//! Page loading: page files, exports aggregation and runtime orchestration.
//!
//! This crate provides:
//! - `PageFile` / `PageFileLoader` - Discovered code files and their loaders
//! - `aggregate` / `ExportsAddendum` - Merged exports of a page
//! - `FetchFailurePatterns` - Stale-asset fetch failure detection
//! - `PageLoader` - Client and server loading of a page
//! - `PageContext` - Request-scoped holder of loaded exports
//!
//! # Example
//!
//! ```ignore
//! use edge_loader::{PageAssets, PageLoader};
//!
//! let loader = PageLoader::new(Arc::new(PageAssets::new(files, store)), &config);
//! match loader.load_page_files_client_side("/pages/index").await {
//!     Ok(addendum) => render(addendum),
//!     Err(err) if is_error_fetching_static_assets(&err) => reload_page(),
//!     Err(err) => return Err(err.into()),
//! }
//! ```

mod context;
mod exports;
mod fetch_error;
mod orchestrator;
mod page_file;

pub use context::*;
pub use exports::*;
pub use fetch_error::*;
pub use orchestrator::*;
pub use page_file::*;
