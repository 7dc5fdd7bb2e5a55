/// Background coordination: tab events in, confirmation prompts out.
///
/// A tab moves `Idle → Prompting → Idle`. It becomes Prompting once the
/// dialog acknowledged `showConfirmation`, and returns to Idle on a decision
/// message, on any failure while showing the dialog, or when the tab closes.
///
/// Handlers run on a single thread but interleave at every browser call, so
/// tracker state is only touched between awaits, never across one.
use crate::badge;
use crate::config::Config;
use crate::detector::find_duplicate;
use crate::domain::is_checkable_url;
use crate::host::{BrowserHost, HostError, StorageArea};
use crate::messages::{Decision, DecisionResponse, DialogRequest};
use crate::storage;
use crate::tab_data::{ChangeInfo, TabId, TabInfo, TabStatus};
use crate::tracker::{DeferredCheck, TabTracker};
use std::cell::RefCell;
use std::rc::Rc;

pub struct Coordinator<H> {
    host: H,
    config: RefCell<Rc<Config>>,
    tracker: RefCell<TabTracker>,
}

impl<H: BrowserHost + StorageArea> Coordinator<H> {
    pub fn new(host: H, config: Config) -> Self {
        Coordinator {
            host,
            config: RefCell::new(Rc::new(config)),
            tracker: RefCell::new(TabTracker::new()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> Rc<Config> {
        self.config.borrow().clone()
    }

    /// Swap in settings loaded after the listeners were registered.
    pub fn apply_config(&self, config: Config) {
        *self.config.borrow_mut() = Rc::new(config);
    }

    pub fn is_prompting(&self, tab_id: TabId) -> bool {
        self.tracker.borrow().is_prompting(tab_id)
    }

    pub fn is_newly_created(&self, tab_id: TabId) -> bool {
        self.tracker.borrow().is_newly_created(tab_id)
    }

    /// Is any transient state still held for this tab?
    pub fn tracks(&self, tab_id: TabId) -> bool {
        self.tracker.borrow().knows(tab_id)
    }

    /// Publish the badge for the tabs that were open before the worker started.
    pub async fn start(&self) {
        log::info!("Background coordinator started");
        self.refresh_badge().await;
    }

    pub async fn on_tab_created(&self, tab: TabInfo) {
        log::info!("Tab created: {}", tab.id);
        self.tracker.borrow_mut().track_created(tab.id);

        let pending_web_url = tab.pending_url.as_deref().is_some_and(is_checkable_url);
        if !pending_web_url {
            self.refresh_badge().await;
            return;
        }

        // The pending URL often changes again right away; look once it settles.
        let delay = self.config().new_tab_check_delay_ms;
        self.host.sleep(delay).await;
        self.recheck_created_tab(tab.id).await;
    }

    /// Deferred half of `on_tab_created`: only runs the check if the tab is
    /// still open and not already prompting.
    async fn recheck_created_tab(&self, tab_id: TabId) {
        let tab = match self.host.get_tab(tab_id).await {
            Ok(tab) => tab,
            Err(e) => {
                log::debug!("Tab {} likely closed before delayed check: {}", tab_id, e);
                self.refresh_badge().await;
                return;
            }
        };

        let prompting = self.tracker.borrow().is_prompting(tab_id);
        match tab.url {
            Some(url) if !prompting => self.check_for_duplicate_and_confirm(tab_id, &url, false).await,
            _ => self.refresh_badge().await,
        }
    }

    pub async fn on_tab_updated(&self, tab_id: TabId, change: ChangeInfo, tab: TabInfo) {
        let url_changed = change.url.is_some();
        let loading_started = change.status == Some(TabStatus::Loading);
        let load_completed =
            change.status == Some(TabStatus::Complete) && tab.url().is_some_and(is_checkable_url);

        if !(url_changed || loading_started || load_completed) {
            return;
        }
        log::debug!("Tab updated: {}, changeInfo: {:?}", tab_id, change);

        let check_url = if load_completed { tab.url } else { change.url };
        match check_url.filter(|url| is_checkable_url(url)) {
            Some(url) => {
                let is_navigation = {
                    let mut tracker = self.tracker.borrow_mut();
                    let is_navigation = tracker.is_navigation(tab_id);
                    if load_completed {
                        tracker.resolve_first_load(tab_id);
                    }
                    is_navigation
                };
                self.check_for_duplicate_and_confirm(tab_id, &url, is_navigation).await;
            }
            None if url_changed => {
                // Moved to an internal page: its first load is over all the same.
                self.tracker.borrow_mut().resolve_first_load(tab_id);
                self.refresh_badge().await;
            }
            None => {
                // Loading without a URL yet; the next update carries it.
            }
        }
    }

    pub async fn on_tab_removed(&self, tab_id: TabId) {
        log::info!("Tab removed: {}", tab_id);
        let forgotten = self.tracker.borrow_mut().forget(tab_id);
        if forgotten.was_prompting {
            log::info!("Tab {} closed while prompting. Treating as keep.", tab_id);
        }
        if forgotten.was_checking {
            log::debug!("Tab {} closed during its duplicate check.", tab_id);
        }
        if forgotten.was_newly_created {
            log::debug!("Tab {} closed before its first load completed.", tab_id);
        }
        self.refresh_badge().await;
    }

    /// Look for a duplicate of `tab_id` and, if one exists, show the
    /// merge/keep dialog in it.
    ///
    /// A URL reported for the tab while its check runs is checked next,
    /// unless that check ended in a prompt.
    pub async fn check_for_duplicate_and_confirm(&self, tab_id: TabId, url: &str, is_navigation: bool) {
        let mut next = Some(DeferredCheck {
            url: url.to_string(),
            is_navigation,
        });
        while let Some(check) = next.take() {
            next = self.check_once(tab_id, &check.url, check.is_navigation).await;
        }
    }

    async fn check_once(&self, tab_id: TabId, url: &str, is_navigation: bool) -> Option<DeferredCheck> {
        if !is_checkable_url(url) {
            self.refresh_badge().await;
            return None;
        }

        // Reserved before the first await: a second update for this tab
        // arriving mid-check is queued behind it instead.
        {
            let mut tracker = self.tracker.borrow_mut();
            if !tracker.begin_check(tab_id, url) {
                if tracker.defer_check(tab_id, url, is_navigation) {
                    log::debug!("Tab {} is already being checked; queued {}", tab_id, url);
                } else {
                    log::debug!("Tab {} is already being prompted.", tab_id);
                }
                return None;
            }
        }
        let outcome = self.show_prompt(tab_id, url, is_navigation).await;
        let (still_open, deferred) = {
            let mut tracker = self.tracker.borrow_mut();
            (tracker.end_check(tab_id), tracker.take_deferred(tab_id))
        };

        match outcome {
            Ok(Some(existing)) if still_open => {
                self.tracker.borrow_mut().mark_prompting(tab_id);
                log::info!(
                    "Confirmation prompt shown in tab {} (duplicate of tab {})",
                    tab_id,
                    existing.id
                );
                if let Err(e) = storage::record_stats(&self.host, 1, 0).await {
                    log::warn!("Could not update duplicate stats: {}", e);
                }
                return None;
            }
            Ok(Some(_)) => {
                log::info!("Tab {} closed before its prompt was answered.", tab_id);
                self.refresh_badge().await;
            }
            Ok(None) => self.refresh_badge().await,
            Err(e) => {
                report_check_failure(tab_id, &e);
                self.refresh_badge().await;
            }
        }
        deferred
    }

    /// Inject the dialog and wait for it to confirm it is showing.
    ///
    /// `Ok(None)` means there was no duplicate to prompt about.
    async fn show_prompt(
        &self,
        tab_id: TabId,
        url: &str,
        is_navigation: bool,
    ) -> Result<Option<TabInfo>, HostError> {
        let config = self.config();
        let Some(existing) = find_duplicate(&self.host, tab_id, url, &config.webmail_host).await? else {
            return Ok(None);
        };
        log::info!("Duplicate detected: Tab {} ({}) vs Tab {}", tab_id, url, existing.id);

        self.host.execute_script(tab_id, &config.dialog_script).await?;
        self.host.insert_css(tab_id, &config.dialog_style).await?;

        let request = DialogRequest::ShowConfirmation {
            existing_tab_id: existing.id,
            current_tab_id: tab_id,
            is_navigation,
        };
        match self.host.send_to_tab(tab_id, &request).await? {
            Some(ack) if ack.is_received() => Ok(Some(existing)),
            Some(ack) => {
                log::warn!("Confirmation prompt in tab {} answered {:?}", tab_id, ack.status);
                Err(HostError::NoAcknowledgement(tab_id))
            }
            None => Err(HostError::NoAcknowledgement(tab_id)),
        }
    }

    /// Apply the user's answer from the dialog running in `sender_tab`.
    ///
    /// Returns the response for the dialog, or `None` when the message did
    /// not come from a tab.
    pub async fn handle_decision(&self, sender_tab: Option<TabId>, decision: Decision) -> Option<DecisionResponse> {
        let Some(tab_id) = sender_tab else {
            log::debug!("Ignoring {:?} without a sender tab", decision);
            return None;
        };

        let response = match decision {
            Decision::MergeTabs { existing_tab_id, .. } => {
                log::info!(
                    "User chose MERGE for Tab {}. Focusing {} and closing {}",
                    tab_id,
                    existing_tab_id,
                    tab_id
                );
                self.tracker.borrow_mut().clear_prompting(tab_id);
                let response = match self.merge(tab_id, existing_tab_id).await {
                    Ok(()) => {
                        if let Err(e) = storage::record_stats(&self.host, 0, 1).await {
                            log::warn!("Could not update duplicate stats: {}", e);
                        }
                        DecisionResponse::merge_complete()
                    }
                    Err(e) => {
                        if e.is_target_gone() {
                            log::warn!("Merge for tab {} hit a closed tab: {}", tab_id, e);
                        } else {
                            log::error!("Error during merge action: {}", e);
                        }
                        DecisionResponse::merge_failed(e.to_string())
                    }
                };
                self.refresh_badge().await;
                response
            }
            Decision::KeepTab { is_navigation, .. } => {
                log::info!("User chose KEEP for Tab {}", tab_id);
                self.keep(tab_id, is_navigation).await;
                if is_navigation {
                    DecisionResponse::keep_navigating_back()
                } else {
                    DecisionResponse::keep_completed()
                }
            }
            Decision::PromptClosed { .. } => {
                log::info!("Confirmation prompt closed by user in Tab {}. Keeping tab.", tab_id);
                self.keep(tab_id, false).await;
                DecisionResponse::closed_processed()
            }
        };

        Some(response)
    }

    async fn merge(&self, tab_id: TabId, existing_tab_id: TabId) -> Result<(), HostError> {
        self.host.activate_tab(existing_tab_id).await?;
        let existing = self.host.get_tab(existing_tab_id).await?;
        self.host.focus_window(existing.window_id).await?;
        self.host.remove_tabs(&[tab_id]).await
    }

    async fn keep(&self, tab_id: TabId, go_back: bool) {
        self.tracker.borrow_mut().clear_prompting(tab_id);

        if go_back {
            log::info!("Tab {} resulted from navigation, attempting to go back.", tab_id);
            let config = self.config();
            if let Err(e) = self
                .host
                .navigate_back(tab_id, &config.back_notice_text, config.back_notice_ms)
                .await
            {
                log::warn!("Failed to navigate back in tab {}: {}", tab_id, e);
            }
        }

        self.refresh_badge().await;
    }

    async fn refresh_badge(&self) {
        let config = self.config();
        badge::refresh(&self.host, &config).await;
    }
}

fn report_check_failure(tab_id: TabId, error: &HostError) {
    if error.is_target_gone() {
        log::warn!("Tab {} related to duplicate check was likely closed: {}", tab_id, error);
    } else if error.is_recoverable() {
        log::warn!("Failed to show confirmation prompt in tab {}: {}", tab_id, error);
    } else {
        log::error!("Unexpected error during duplicate check for tab {}: {}", tab_id, error);
    }
}
