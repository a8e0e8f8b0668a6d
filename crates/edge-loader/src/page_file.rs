//! Page files and their loading.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use edge_config::LoadResult;
use edge_core::{Environment, PageId};
use futures::future::try_join_all;

use crate::exports::{FileExports, LoadedPageFile};

/// Which pages a file applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFileScope {
    /// Applies to every page (e.g. `/renderer/+onRenderHtml.js`).
    All,
    /// Applies to one page only.
    Page(PageId),
}

/// Which environments a file is loaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageFileType {
    /// Page component. Loaded everywhere; its default export becomes the page
    /// exports.
    Page,
    /// Client-only code.
    Client,
    /// Server-only code.
    Server,
    /// Shared code, loaded everywhere.
    Shared,
}

impl PageFileType {
    /// Whether files of this type are loaded in `env`.
    pub fn is_loaded_in(&self, env: Environment) -> bool {
        match self {
            Self::Page | Self::Shared => true,
            Self::Client => env == Environment::Client,
            Self::Server => env == Environment::Server,
        }
    }
}

/// Loads the exports of one page file.
#[async_trait]
pub trait PageFileLoader: Send + Sync {
    /// Load the file. Errors are returned as-is; classification happens in
    /// the orchestrator.
    async fn load_file(&self) -> anyhow::Result<FileExports>;
}

/// Loader returning fixed exports.
#[derive(Debug, Clone)]
pub struct StaticExports(pub FileExports);

#[async_trait]
impl PageFileLoader for StaticExports {
    async fn load_file(&self) -> anyhow::Result<FileExports> {
        Ok(self.0.clone())
    }
}

/// Loader backed by an async closure.
pub struct FnPageFileLoader<F>(F);

#[async_trait]
impl<F, Fut> PageFileLoader for FnPageFileLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FileExports>> + Send + 'static,
{
    async fn load_file(&self) -> anyhow::Result<FileExports> {
        (self.0)().await
    }
}

/// Wrap an async closure as a page file loader.
pub fn page_file_loader<F, Fut>(f: F) -> Arc<dyn PageFileLoader>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<FileExports>> + Send + 'static,
{
    Arc::new(FnPageFileLoader(f))
}

/// A code file discovered for the project.
#[derive(Clone)]
pub struct PageFile {
    /// Project-relative path.
    pub file_path: String,
    /// Pages the file applies to.
    pub scope: PageFileScope,
    /// Environments the file is loaded in.
    pub file_type: PageFileType,
    loader: Option<Arc<dyn PageFileLoader>>,
}

impl PageFile {
    /// A file without loader. It is selected but contributes no exports.
    pub fn new(file_path: impl Into<String>, scope: PageFileScope, file_type: PageFileType) -> Self {
        Self {
            file_path: file_path.into(),
            scope,
            file_type,
            loader: None,
        }
    }

    /// Attach a loader.
    pub fn with_loader(mut self, loader: Arc<dyn PageFileLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Attach fixed exports.
    pub fn with_exports(self, exports: FileExports) -> Self {
        self.with_loader(Arc::new(StaticExports(exports)))
    }

    /// Whether the file has a loader.
    pub fn is_loadable(&self) -> bool {
        self.loader.is_some()
    }

    /// Whether the file applies to `page_id`.
    pub fn applies_to(&self, page_id: &str) -> bool {
        match &self.scope {
            PageFileScope::All => true,
            PageFileScope::Page(id) => id == page_id,
        }
    }

    /// Load the file. `None` when it has no loader.
    pub async fn load(&self) -> LoadResult<Option<FileExports>> {
        match &self.loader {
            Some(loader) => Ok(Some(loader.load_file().await?)),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for PageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFile")
            .field("file_path", &self.file_path)
            .field("scope", &self.scope)
            .field("file_type", &self.file_type)
            .field("loadable", &self.is_loadable())
            .finish()
    }
}

impl PartialEq for PageFile {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
            && self.scope == other.scope
            && self.file_type == other.file_type
    }
}

/// Files that apply to `page_id`, in input order.
pub fn filter_applicable(page_files_all: &[PageFile], page_id: &str) -> Vec<PageFile> {
    page_files_all
        .iter()
        .filter(|file| file.applies_to(page_id))
        .cloned()
        .collect()
}

/// Files loaded in `env`, in input order.
pub fn filter_for_environment(page_files: Vec<PageFile>, env: Environment) -> Vec<PageFile> {
    page_files
        .into_iter()
        .filter(|file| file.file_type.is_loaded_in(env))
        .collect()
}

/// Load every file concurrently.
///
/// The result keeps the order of `page_files` regardless of completion order.
/// The first failure aborts the whole load. Each file carries the time its own
/// loader took.
pub async fn load_page_files(page_files: Vec<PageFile>) -> LoadResult<Vec<LoadedPageFile>> {
    try_join_all(page_files.into_iter().map(|file| async move {
        let start = Instant::now();
        let exports = file.load().await?;
        let load_time = exports.as_ref().map(|_| start.elapsed());
        tracing::trace!(file = %file.file_path, ?load_time, "page file loaded");
        LoadResult::Ok(LoadedPageFile {
            file,
            exports,
            load_time,
        })
    }))
    .await
}
