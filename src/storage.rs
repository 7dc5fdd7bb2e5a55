/// Storage layout and serialization for chrome.storage.local

use crate::host::{HostError, StorageArea};
use crate::tab_data::{DuplicateStats, SavedTab};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const SAVED_TABS_KEY: &str = "savedTabs";
pub const STATS_KEY: &str = "duplicateTabsStats";
pub const SETTINGS_KEY: &str = "settings";

/// The saved-for-later list, unique by URL, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SavedTabs {
    pub tabs: Vec<SavedTab>,
}

impl SavedTabs {
    pub fn new() -> Self {
        SavedTabs { tabs: Vec::new() }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.tabs.iter().any(|t| t.url == url)
    }

    /// Append unless the URL is already saved
    pub fn add(&mut self, tab: SavedTab) -> bool {
        if self.contains(&tab.url) {
            return false;
        }
        self.tabs.push(tab);
        true
    }

    /// Append every tab whose URL is new; returns how many were added
    pub fn extend_new(&mut self, tabs: impl IntoIterator<Item = SavedTab>) -> usize {
        tabs.into_iter().map(|tab| self.add(tab)).filter(|added| *added).count()
    }

    pub fn remove(&mut self, url: &str) -> bool {
        let original_len = self.tabs.len();
        self.tabs.retain(|t| t.url != url);
        self.tabs.len() < original_len
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

async fn load<T, S>(store: &S, key: &str) -> Result<Option<T>, HostError>
where
    T: DeserializeOwned,
    S: StorageArea,
{
    match store.get(key).await? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| HostError::Serialization(format!("{}: {}", key, e))),
    }
}

async fn store_value<T, S>(store: &S, key: &str, value: &T) -> Result<(), HostError>
where
    T: Serialize,
    S: StorageArea,
{
    let value = serde_json::to_value(value)
        .map_err(|e| HostError::Serialization(format!("{}: {}", key, e)))?;
    store.set(key, value).await
}

pub async fn load_saved_tabs<S: StorageArea>(store: &S) -> Result<SavedTabs, HostError> {
    log::debug!("Attempting to get saved tabs from storage.");
    let saved: SavedTabs = load(store, SAVED_TABS_KEY).await?.unwrap_or_default();
    log::debug!("Retrieved {} saved tabs.", saved.len());
    Ok(saved)
}

pub async fn save_saved_tabs<S: StorageArea>(store: &S, saved: &SavedTabs) -> Result<(), HostError> {
    store_value(store, SAVED_TABS_KEY, saved).await?;
    log::info!("{} tabs saved to storage.", saved.len());
    Ok(())
}

pub async fn clear_saved_tabs<S: StorageArea>(store: &S) -> Result<(), HostError> {
    store.remove(SAVED_TABS_KEY).await?;
    log::info!("All saved tabs cleared from storage.");
    Ok(())
}

pub async fn load_stats<S: StorageArea>(store: &S) -> Result<DuplicateStats, HostError> {
    Ok(load(store, STATS_KEY).await?.unwrap_or_default())
}

/// Bump the duplicate counters by the given amounts.
pub async fn record_stats<S: StorageArea>(
    store: &S,
    identified: u64,
    closed: u64,
) -> Result<DuplicateStats, HostError> {
    let mut stats = load_stats(store).await?;
    stats.identified += identified;
    stats.closed += closed;
    store_value(store, STATS_KEY, &stats).await?;
    Ok(stats)
}

/// Raw `settings` overrides, if any were stored
pub async fn load_settings<S: StorageArea>(store: &S) -> Result<Option<serde_json::Value>, HostError> {
    load(store, SETTINGS_KEY).await
}
