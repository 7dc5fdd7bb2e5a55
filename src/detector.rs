/// Duplicate lookup for a single tab, and the global duplicate count
use crate::domain::canonical_url;
use crate::host::{BrowserHost, HostError};
use crate::operations::count_duplicate_tabs;
use crate::tab_data::{TabId, TabInfo};

/// Find another open tab showing the same page as `tab_id`.
///
/// Both sides go through [`canonical_url`], so for the webmail host two tabs
/// that differ only in their fragment match. The first match in tab order wins.
pub async fn find_duplicate<H: BrowserHost>(
    host: &H,
    tab_id: TabId,
    url: &str,
    webmail_host: &str,
) -> Result<Option<TabInfo>, HostError> {
    let wanted = canonical_url(url, webmail_host);
    let tabs = host.query_tabs().await?;

    Ok(tabs.into_iter().find(|tab| {
        tab.id != tab_id && tab.url().is_some_and(|other| canonical_url(other, webmail_host) == wanted)
    }))
}

/// Tabs that belong to a group of identical URLs, across all windows
pub async fn duplicate_count<H: BrowserHost>(host: &H) -> Result<usize, HostError> {
    let tabs = host.query_tabs().await?;
    Ok(count_duplicate_tabs(&tabs))
}
