/// Operations behind the management page: listing, closing, saving for later,
/// export and import.
use crate::domain::{is_fullscreen_page, is_savable_url, FULLSCREEN_QUERY};
use crate::export::{parse_import, render_export, ExportEntry, ExportFile, ExportKind, ImportError};
use crate::host::{BrowserHost, HostError, StorageArea};
use crate::operations::{group_duplicates, listable_tabs, redundant_tab_ids, savable_tabs};
use crate::storage::{self, SavedTabs};
use crate::tab_data::{DuplicateGroup, DuplicateStats, SavedTab, TabId, TabInfo};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("{0} is not in the saved list")]
    NotSaved(String),

    #[error("There are no saved tabs to delete.")]
    NothingSaved,
}

/// Everything the management page renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tabs: Vec<TabInfo>,
    pub duplicates: Vec<DuplicateGroup>,
    pub saved: SavedTabs,
    pub current_tab_id: Option<TabId>,
    pub stats: DuplicateStats,
}

pub struct TabManager<H> {
    host: H,
}

impl<H: BrowserHost + StorageArea> TabManager<H> {
    pub fn new(host: H) -> Self {
        TabManager { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ManagerError> {
        let tabs = listable_tabs(&self.host.query_tabs().await?);
        let duplicates = group_duplicates(&tabs);
        let current_tab_id = self.host.current_tab().await?.map(|tab| tab.id);
        let saved = storage::load_saved_tabs(&self.host).await?;
        // Stats are informational; a bad value should not blank the page.
        let stats = storage::load_stats(&self.host).await.unwrap_or_else(|e| {
            log::warn!("Could not read duplicate stats: {}", e);
            DuplicateStats::default()
        });

        Ok(Snapshot {
            tabs,
            duplicates,
            saved,
            current_tab_id,
            stats,
        })
    }

    /// Bring a tab and its window to the front.
    pub async fn activate(&self, tab_id: TabId) -> Result<(), ManagerError> {
        let tab = self.host.get_tab(tab_id).await?;
        self.host.activate_tab(tab_id).await?;
        self.host.focus_window(tab.window_id).await?;
        Ok(())
    }

    pub async fn close_tab(&self, tab_id: TabId) -> Result<(), ManagerError> {
        self.host.remove_tabs(&[tab_id]).await?;
        Ok(())
    }

    /// Save the tab for later if its URL can be reopened, then close it.
    ///
    /// Returns whether it was added to the saved list.
    pub async fn save_and_close(&self, tab_id: TabId) -> Result<bool, ManagerError> {
        let tab = self.host.get_tab(tab_id).await?;

        let added = match SavedTab::from_tab(&tab).filter(|saved| is_savable_url(&saved.url)) {
            Some(saved_tab) => {
                let mut saved = storage::load_saved_tabs(&self.host).await?;
                let added = saved.add(saved_tab);
                if added {
                    storage::save_saved_tabs(&self.host, &saved).await?;
                }
                added
            }
            None => {
                log::info!("Tab {} has no savable URL, closing without saving", tab_id);
                false
            }
        };

        self.host.remove_tabs(&[tab_id]).await?;
        Ok(added)
    }

    /// Close every tab on `url` except the first one. Returns how many closed.
    pub async fn close_duplicates(&self, url: &str) -> Result<usize, ManagerError> {
        let tabs = self.host.query_tabs().await?;
        let redundant: Vec<TabId> = group_duplicates(&tabs)
            .iter()
            .filter(|group| group.url == url)
            .flat_map(redundant_tab_ids)
            .collect();
        self.close_redundant(&redundant).await
    }

    pub async fn close_all_duplicates(&self) -> Result<usize, ManagerError> {
        let tabs = self.host.query_tabs().await?;
        let redundant: Vec<TabId> = group_duplicates(&tabs).iter().flat_map(redundant_tab_ids).collect();
        self.close_redundant(&redundant).await
    }

    async fn close_redundant(&self, tab_ids: &[TabId]) -> Result<usize, ManagerError> {
        if tab_ids.is_empty() {
            return Ok(0);
        }
        self.host.remove_tabs(tab_ids).await?;
        log::info!("Closed {} duplicate tabs", tab_ids.len());
        if let Err(e) = storage::record_stats(&self.host, 0, tab_ids.len() as u64).await {
            log::warn!("Could not update duplicate stats: {}", e);
        }
        Ok(tab_ids.len())
    }

    /// Show the management page in a tab of its own, reusing one that is
    /// already open.
    ///
    /// `page` is the page's path inside the extension, e.g. `popup.html`.
    pub async fn open_fullscreen(&self, page: &str) -> Result<TabId, ManagerError> {
        let origin = self.host.extension_url("");
        let tabs = self.host.query_tabs().await?;
        let existing = tabs
            .iter()
            .find(|tab| tab.url().is_some_and(|url| is_fullscreen_page(url, &origin)));

        if let Some(tab) = existing {
            log::debug!("Reusing full-screen tab {}", tab.id);
            self.host.activate_tab(tab.id).await?;
            self.host.focus_window(tab.window_id).await?;
            return Ok(tab.id);
        }

        let url = self.host.extension_url(&format!("{}?{}", page, FULLSCREEN_QUERY));
        let tab = self.host.create_tab(&url, true).await?;
        log::info!("Opened full-screen view in tab {}", tab.id);
        Ok(tab.id)
    }

    /// Save and close every savable tab except the one the user is looking at
    /// and the full-screen management page.
    ///
    /// Returns how many tabs were closed.
    pub async fn save_all_and_close(&self) -> Result<usize, ManagerError> {
        let current = self.host.current_tab().await?.map(|tab| tab.id);
        let origin = self.host.extension_url("");
        let tabs: Vec<TabInfo> = savable_tabs(&self.host.query_tabs().await?)
            .into_iter()
            .filter(|tab| Some(tab.id) != current)
            .filter(|tab| !tab.url().is_some_and(|url| is_fullscreen_page(url, &origin)))
            .collect();
        if tabs.is_empty() {
            return Ok(0);
        }

        let mut saved = storage::load_saved_tabs(&self.host).await?;
        let added = saved.extend_new(tabs.iter().filter_map(SavedTab::from_tab));
        storage::save_saved_tabs(&self.host, &saved).await?;
        log::info!("Saved {} new tabs for later", added);

        let tab_ids: Vec<TabId> = tabs.iter().map(|tab| tab.id).collect();
        self.host.remove_tabs(&tab_ids).await?;
        Ok(tab_ids.len())
    }

    /// Take a tab off the saved list and open it in the foreground.
    pub async fn reopen_saved(&self, url: &str) -> Result<TabInfo, ManagerError> {
        let mut saved = storage::load_saved_tabs(&self.host).await?;
        if !saved.remove(url) {
            return Err(ManagerError::NotSaved(url.to_string()));
        }
        storage::save_saved_tabs(&self.host, &saved).await?;
        Ok(self.host.create_tab(url, true).await?)
    }

    pub async fn delete_saved(&self, url: &str) -> Result<(), ManagerError> {
        let mut saved = storage::load_saved_tabs(&self.host).await?;
        if !saved.remove(url) {
            return Err(ManagerError::NotSaved(url.to_string()));
        }
        storage::save_saved_tabs(&self.host, &saved).await?;
        Ok(())
    }

    pub async fn delete_all_saved(&self) -> Result<(), ManagerError> {
        if storage::load_saved_tabs(&self.host).await?.is_empty() {
            return Err(ManagerError::NothingSaved);
        }
        storage::clear_saved_tabs(&self.host).await?;
        Ok(())
    }

    /// Open every saved tab in the background and empty the list.
    pub async fn reopen_all(&self) -> Result<usize, ManagerError> {
        let saved = storage::load_saved_tabs(&self.host).await?;
        if saved.is_empty() {
            return Ok(0);
        }
        for tab in &saved.tabs {
            self.host.create_tab(&tab.url, false).await?;
        }
        storage::clear_saved_tabs(&self.host).await?;
        Ok(saved.len())
    }

    pub async fn export_saved(&self, date: &str) -> Result<ExportFile, ManagerError> {
        let saved = storage::load_saved_tabs(&self.host).await?;
        let entries: Vec<ExportEntry> = saved.tabs.iter().map(ExportEntry::from).collect();
        Ok(render_export(ExportKind::SavedTabs, &entries, date))
    }

    pub async fn export_open(&self, date: &str) -> Result<ExportFile, ManagerError> {
        let tabs = listable_tabs(&self.host.query_tabs().await?);
        let entries: Vec<ExportEntry> = tabs.iter().filter_map(ExportEntry::from_tab).collect();
        Ok(render_export(ExportKind::OpenTabs, &entries, date))
    }

    /// Append the links of an exported file to the saved list, skipping URLs
    /// already there. Returns how many were added.
    pub async fn import_saved(&self, html: &str) -> Result<usize, ManagerError> {
        let links = parse_import(html)?;
        let mut saved = storage::load_saved_tabs(&self.host).await?;
        let added = saved.extend_new(links.into_iter().map(SavedTab::from));
        if added > 0 {
            storage::save_saved_tabs(&self.host, &saved).await?;
        }
        log::info!("Imported {} new saved tabs", added);
        Ok(added)
    }

    /// Open every link of an exported file as a background tab.
    pub async fn import_and_open(&self, html: &str) -> Result<usize, ManagerError> {
        let links = parse_import(html)?;
        for link in &links {
            self.host.create_tab(&link.url, false).await?;
        }
        Ok(links.len())
    }
}
