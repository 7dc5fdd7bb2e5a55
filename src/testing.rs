/// In-memory browser used by the unit tests.
///
/// Every call yields to the executor once before touching state, so futures
/// joined with `futures::join!` interleave the way browser callbacks do.

use crate::host::{BrowserHost, HostError, StorageArea};
use crate::messages::{Ack, DialogRequest};
use crate::tab_data::{TabId, TabInfo, WindowId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Origin of the fake extension's own pages
pub const EXTENSION_ORIGIN: &str = "chrome-extension://tab-options-test/";

/// Browser calls with side effects, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTab(String, bool),
    ActivateTab(TabId),
    FocusWindow(WindowId),
    RemoveTabs(Vec<TabId>),
    ExecuteScript(TabId, String),
    InsertCss(TabId, String),
    SendToTab(TabId, DialogRequest),
    NavigateBack(TabId),
    SetBadgeText(String),
    SetBadgeColor(String),
    BroadcastRefresh,
    Sleep(u32),
}

/// How the dialog answers `showConfirmation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AckMode {
    Received,
    Silent,
    Unexpected,
}

struct FakeState {
    tabs: Vec<TabInfo>,
    storage: HashMap<String, serde_json::Value>,
    calls: Vec<Call>,
    next_id: TabId,
    ack: AckMode,
    fail_injection: bool,
    fail_badge: bool,
    fail_refresh: bool,
    fail_query: bool,
}

pub struct FakeBrowser {
    state: RefCell<FakeState>,
}

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

fn yield_now() -> YieldNow {
    YieldNow(false)
}

impl FakeBrowser {
    pub fn new() -> Self {
        FakeBrowser {
            state: RefCell::new(FakeState {
                tabs: Vec::new(),
                storage: HashMap::new(),
                calls: Vec::new(),
                next_id: 1,
                ack: AckMode::Received,
                fail_injection: false,
                fail_badge: false,
                fail_refresh: false,
                fail_query: false,
            }),
        }
    }

    /// Open a tab in window 1 and return its id
    pub fn open_tab(&self, url: &str) -> TabId {
        self.open_tab_in(1, url)
    }

    pub fn open_tab_in(&self, window_id: WindowId, url: &str) -> TabId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.tabs.push(TabInfo {
            title: Some(format!("Tab {}", id)),
            ..TabInfo::new(id, window_id, url)
        });
        id
    }

    /// The user closes a tab
    pub fn close_tab(&self, tab_id: TabId) {
        self.state.borrow_mut().tabs.retain(|t| t.id != tab_id);
    }

    pub fn set_url(&self, tab_id: TabId, url: &str) {
        if let Some(tab) = self.state.borrow_mut().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.url = Some(url.to_string());
        }
    }

    pub fn set_active(&self, tab_id: TabId) {
        for tab in self.state.borrow_mut().tabs.iter_mut() {
            tab.active = tab.id == tab_id;
        }
    }

    pub fn tab(&self, tab_id: TabId) -> Option<TabInfo> {
        self.state.borrow().tabs.iter().find(|t| t.id == tab_id).cloned()
    }

    pub fn has_tab(&self, tab_id: TabId) -> bool {
        self.tab(tab_id).is_some()
    }

    pub fn open_urls(&self) -> Vec<String> {
        self.state.borrow().tabs.iter().filter_map(|t| t.url.clone()).collect()
    }

    pub fn set_ack(&self, ack: AckMode) {
        self.state.borrow_mut().ack = ack;
    }

    pub fn fail_injection(&self) {
        self.state.borrow_mut().fail_injection = true;
    }

    pub fn fail_badge(&self) {
        self.state.borrow_mut().fail_badge = true;
    }

    pub fn fail_refresh(&self) {
        self.state.borrow_mut().fail_refresh = true;
    }

    pub fn fail_query(&self) {
        self.state.borrow_mut().fail_query = true;
    }

    pub fn put_storage(&self, key: &str, value: serde_json::Value) {
        self.state.borrow_mut().storage.insert(key.to_string(), value);
    }

    pub fn storage_value(&self, key: &str) -> Option<serde_json::Value> {
        self.state.borrow().storage.get(key).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| matches(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Last badge text that was set successfully
    pub fn badge_text(&self) -> Option<String> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            Call::SetBadgeText(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn badge_color(&self) -> Option<String> {
        self.state.borrow().calls.iter().rev().find_map(|c| match c {
            Call::SetBadgeColor(color) => Some(color.clone()),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn require_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.tab(tab_id).ok_or(HostError::TabGone(tab_id))
    }
}

impl BrowserHost for FakeBrowser {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        yield_now().await;
        let state = self.state.borrow();
        if state.fail_query {
            return Err(HostError::Other("tabs.query failed".to_string()));
        }
        Ok(state.tabs.clone())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        yield_now().await;
        self.require_tab(tab_id)
    }

    async fn current_tab(&self) -> Result<Option<TabInfo>, HostError> {
        yield_now().await;
        Ok(self.state.borrow().tabs.iter().find(|t| t.active).cloned())
    }

    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo, HostError> {
        yield_now().await;
        self.record(Call::CreateTab(url.to_string(), active));
        let id = self.open_tab(url);
        if active {
            self.set_active(id);
        }
        self.require_tab(id)
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        yield_now().await;
        let tab = self.require_tab(tab_id)?;
        for other in self.state.borrow_mut().tabs.iter_mut() {
            if other.window_id == tab.window_id {
                other.active = other.id == tab_id;
            }
        }
        self.record(Call::ActivateTab(tab_id));
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        yield_now().await;
        self.record(Call::FocusWindow(window_id));
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        yield_now().await;
        self.record(Call::RemoveTabs(tab_ids.to_vec()));
        let missing = tab_ids.iter().copied().find(|id| !self.has_tab(*id));
        self.state.borrow_mut().tabs.retain(|t| !tab_ids.contains(&t.id));
        match missing {
            Some(id) => Err(HostError::TabGone(id)),
            None => Ok(()),
        }
    }

    async fn execute_script(&self, tab_id: TabId, file: &str) -> Result<(), HostError> {
        yield_now().await;
        self.require_tab(tab_id)?;
        if self.state.borrow().fail_injection {
            return Err(HostError::Permission(format!("Cannot access contents of tab {}", tab_id)));
        }
        self.record(Call::ExecuteScript(tab_id, file.to_string()));
        Ok(())
    }

    async fn insert_css(&self, tab_id: TabId, file: &str) -> Result<(), HostError> {
        yield_now().await;
        self.require_tab(tab_id)?;
        self.record(Call::InsertCss(tab_id, file.to_string()));
        Ok(())
    }

    async fn send_to_tab(&self, tab_id: TabId, request: &DialogRequest) -> Result<Option<Ack>, HostError> {
        yield_now().await;
        if !self.has_tab(tab_id) {
            return Err(HostError::NoAcknowledgement(tab_id));
        }
        self.record(Call::SendToTab(tab_id, request.clone()));
        let ack = self.state.borrow().ack;
        Ok(match ack {
            AckMode::Received => Some(Ack::received()),
            AckMode::Silent => None,
            AckMode::Unexpected => Some(Ack {
                status: "busy".to_string(),
            }),
        })
    }

    async fn navigate_back(&self, tab_id: TabId, _notice: &str, _duration_ms: u32) -> Result<(), HostError> {
        yield_now().await;
        self.require_tab(tab_id)?;
        self.record(Call::NavigateBack(tab_id));
        Ok(())
    }

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError> {
        yield_now().await;
        if self.state.borrow().fail_badge && !text.is_empty() {
            return Err(HostError::Other("action.setBadgeText failed".to_string()));
        }
        self.record(Call::SetBadgeText(text.to_string()));
        Ok(())
    }

    async fn set_badge_color(&self, color: &str) -> Result<(), HostError> {
        yield_now().await;
        self.record(Call::SetBadgeColor(color.to_string()));
        Ok(())
    }

    async fn broadcast_refresh(&self) -> Result<(), HostError> {
        yield_now().await;
        self.record(Call::BroadcastRefresh);
        if self.state.borrow().fail_refresh {
            return Err(HostError::NoAcknowledgement(0));
        }
        Ok(())
    }

    async fn sleep(&self, ms: u32) {
        self.record(Call::Sleep(ms));
        yield_now().await;
    }

    fn extension_url(&self, path: &str) -> String {
        format!("{}{}", EXTENSION_ORIGIN, path)
    }
}

impl StorageArea for FakeBrowser {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, HostError> {
        yield_now().await;
        Ok(self.storage_value(key))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), HostError> {
        yield_now().await;
        self.put_storage(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), HostError> {
        yield_now().await;
        self.state.borrow_mut().storage.remove(key);
        Ok(())
    }
}
