/// Transient per-tab state kept by the background worker.
///
/// Nothing here is persisted: a restarted worker starts with empty sets, which
/// is correct because every entry describes something in flight.
use crate::tab_data::TabId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct TabTracker {
    /// Tabs showing an unanswered confirmation dialog
    prompting: HashSet<TabId>,
    /// Tabs whose first load has not completed yet
    newly_created: HashSet<TabId>,
    /// Tabs with a duplicate check between lookup and acknowledgment, and
    /// the URL that check is about
    checking: HashMap<TabId, String>,
    /// Newest URL reported while the tab's check was running
    deferred: HashMap<TabId, DeferredCheck>,
}

/// A check to run once the one in flight for the same tab ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredCheck {
    pub url: String,
    pub is_navigation: bool,
}

/// What a removed tab was still part of
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Forgotten {
    pub was_prompting: bool,
    pub was_newly_created: bool,
    pub was_checking: bool,
}

impl TabTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_created(&mut self, tab_id: TabId) {
        self.newly_created.insert(tab_id);
    }

    /// A URL change on a tab that already finished loading once is a navigation.
    pub fn is_navigation(&self, tab_id: TabId) -> bool {
        !self.newly_created.contains(&tab_id)
    }

    /// The tab's first load is over; later URL changes are navigations.
    pub fn resolve_first_load(&mut self, tab_id: TabId) -> bool {
        self.newly_created.remove(&tab_id)
    }

    pub fn is_prompting(&self, tab_id: TabId) -> bool {
        self.prompting.contains(&tab_id)
    }

    pub fn is_newly_created(&self, tab_id: TabId) -> bool {
        self.newly_created.contains(&tab_id)
    }

    /// Reserve the tab for one duplicate check of `url`. False if the tab
    /// is prompting or another check is already running.
    pub fn begin_check(&mut self, tab_id: TabId, url: &str) -> bool {
        if self.prompting.contains(&tab_id) || self.checking.contains_key(&tab_id) {
            return false;
        }
        self.checking.insert(tab_id, url.to_string());
        true
    }

    /// Note a URL that arrived while the tab's check was running.
    ///
    /// Only the newest one is kept, and only if it differs from the URL
    /// being checked. False if no check is running.
    pub fn defer_check(&mut self, tab_id: TabId, url: &str, is_navigation: bool) -> bool {
        let Some(checking) = self.checking.get(&tab_id) else {
            return false;
        };
        if checking == url {
            self.deferred.remove(&tab_id);
        } else {
            self.deferred.insert(
                tab_id,
                DeferredCheck {
                    url: url.to_string(),
                    is_navigation,
                },
            );
        }
        true
    }

    /// Release the reservation. False if the tab was removed while the check ran.
    pub fn end_check(&mut self, tab_id: TabId) -> bool {
        self.checking.remove(&tab_id).is_some()
    }

    /// The check that arrived while the last one ran, if any
    pub fn take_deferred(&mut self, tab_id: TabId) -> Option<DeferredCheck> {
        self.deferred.remove(&tab_id)
    }

    pub fn mark_prompting(&mut self, tab_id: TabId) {
        self.prompting.insert(tab_id);
    }

    pub fn clear_prompting(&mut self, tab_id: TabId) -> bool {
        self.prompting.remove(&tab_id)
    }

    /// Drop every trace of a closed tab.
    pub fn forget(&mut self, tab_id: TabId) -> Forgotten {
        self.deferred.remove(&tab_id);
        Forgotten {
            was_prompting: self.prompting.remove(&tab_id),
            was_newly_created: self.newly_created.remove(&tab_id),
            was_checking: self.checking.remove(&tab_id).is_some(),
        }
    }

    /// Does any set still mention this tab?
    pub fn knows(&self, tab_id: TabId) -> bool {
        self.prompting.contains(&tab_id)
            || self.newly_created.contains(&tab_id)
            || self.checking.contains_key(&tab_id)
            || self.deferred.contains_key(&tab_id)
    }
}
