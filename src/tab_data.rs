/// Data structures for tabOptions
use serde::{Deserialize, Serialize};

/// Browser-assigned tab handle. Reused by the browser after a tab closes.
pub type TabId = i32;

/// Browser-assigned window handle
pub type WindowId = i32;

/// Information about a browser tab, as reported by `chrome.tabs`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pending_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    pub fn new(id: TabId, window_id: WindowId, url: &str) -> TabInfo {
        TabInfo {
            id,
            window_id,
            url: Some(url.to_string()),
            ..TabInfo::default()
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Loading status carried by `chrome.tabs.onUpdated`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
}

/// The `changeInfo` argument of `chrome.tabs.onUpdated`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<TabStatus>,
}

impl ChangeInfo {
    pub fn url(url: &str) -> ChangeInfo {
        ChangeInfo {
            url: Some(url.to_string()),
            status: None,
        }
    }

    pub fn status(status: TabStatus) -> ChangeInfo {
        ChangeInfo {
            url: None,
            status: Some(status),
        }
    }
}

/// A tab saved for later
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
}

impl SavedTab {
    pub fn from_tab(tab: &TabInfo) -> Option<SavedTab> {
        let url = tab.url.clone()?;
        Some(SavedTab {
            title: tab.title.clone().unwrap_or_default(),
            url,
            fav_icon_url: tab.fav_icon_url.clone(),
        })
    }
}

/// Tabs sharing one exact URL
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub url: String,
    pub tabs: Vec<TabInfo>,
}

/// Cumulative duplicate counters kept under `duplicateTabsStats`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateStats {
    pub identified: u64,
    pub closed: u64,
}
