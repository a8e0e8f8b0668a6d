//! Page config lookup.

use crate::page_config::PageConfigRuntime;

/// Find the config record of `page_id`.
///
/// `None` is not an error: the page then only has global configuration.
pub fn find_page_config<'a>(
    page_configs: &'a [PageConfigRuntime],
    page_id: &str,
) -> Option<&'a PageConfigRuntime> {
    page_configs.iter().find(|config| config.page_id == page_id)
}
