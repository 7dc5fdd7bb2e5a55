/// The browser seam: everything the extension asks of `chrome.*`
use crate::messages::{Ack, DialogRequest};
use crate::tab_data::{TabId, TabInfo, WindowId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    #[error("no tab with id {0}")]
    TabGone(TabId),

    #[error("cannot access tab: {0}")]
    Permission(String),

    #[error("tab {0} did not acknowledge the confirmation prompt")]
    NoAcknowledgement(TabId),

    #[error("could not convert browser value: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl HostError {
    /// Classify an error message thrown by a browser API.
    pub fn from_message(tab_id: Option<TabId>, message: &str) -> HostError {
        let lower = message.to_lowercase();
        if lower.contains("no tab with id") || lower.contains("invalid tab id") {
            HostError::TabGone(tab_id.unwrap_or_default())
        } else if lower.contains("cannot access")
            || lower.contains("permission")
            || lower.contains("cannot be scripted")
        {
            HostError::Permission(message.to_string())
        } else if lower.contains("receiving end does not exist")
            || lower.contains("could not establish connection")
        {
            HostError::NoAcknowledgement(tab_id.unwrap_or_default())
        } else {
            HostError::Other(message.to_string())
        }
    }

    /// The tab or window went away; nothing to report to the user.
    pub fn is_target_gone(&self) -> bool {
        matches!(self, HostError::TabGone(_))
    }

    /// Failures that are expected while tabs open and close under us
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HostError::TabGone(_) | HostError::Permission(_) | HostError::NoAcknowledgement(_)
        )
    }
}

/// Tabs, windows, scripting, badge and runtime messaging.
///
/// Every call may fail because the target tab closed in the meantime.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    /// Every open tab in every window
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError>;

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError>;

    /// Active tab of the focused window
    async fn current_tab(&self) -> Result<Option<TabInfo>, HostError>;

    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo, HostError>;

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    async fn execute_script(&self, tab_id: TabId, file: &str) -> Result<(), HostError>;

    async fn insert_css(&self, tab_id: TabId, file: &str) -> Result<(), HostError>;

    /// Send a message to the dialog in a tab; `None` when nothing answered
    async fn send_to_tab(&self, tab_id: TabId, request: &DialogRequest) -> Result<Option<Ack>, HostError>;

    /// Show `notice` on the page for `duration_ms`, then go back one history entry
    async fn navigate_back(&self, tab_id: TabId, notice: &str, duration_ms: u32) -> Result<(), HostError>;

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError>;

    async fn set_badge_color(&self, color: &str) -> Result<(), HostError>;

    /// Tell open management pages to reload their lists
    async fn broadcast_refresh(&self) -> Result<(), HostError>;

    async fn sleep(&self, ms: u32);

    /// Absolute URL of a file packaged with the extension
    fn extension_url(&self, path: &str) -> String;
}

/// Best-effort key-value store (`chrome.storage.local`)
#[allow(async_fn_in_trait)]
pub trait StorageArea {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, HostError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), HostError>;

    async fn remove(&self, key: &str) -> Result<(), HostError>;
}
