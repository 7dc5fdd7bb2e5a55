/// `chrome.*` bindings: the production [`BrowserHost`] and [`StorageArea`]
use crate::host::{BrowserHost, HostError, StorageArea};
use crate::messages::{Ack, DialogRequest, UiNotice};
use crate::tab_data::{TabId, TabInfo, WindowId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getCurrentTab() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(url: &str, active: bool) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn activateTab(tab_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn focusWindow(window_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn executeScript(tab_id: i32, file: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn insertCss(tab_id: i32, file: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendToTab(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn navigateBack(tab_id: i32, notice: &str, duration_ms: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setBadgeText(text: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setBadgeColor(color: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn broadcastMessage(message: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn delay(ms: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> Result<(), JsValue>;

    /// `tabs.onCreated`, `tabs.onUpdated` and `tabs.onRemoved`
    #[wasm_bindgen(js_name = addTabListeners)]
    pub(crate) fn add_tab_listeners(
        on_created: &Closure<dyn Fn(JsValue)>,
        on_updated: &Closure<dyn Fn(JsValue, JsValue, JsValue)>,
        on_removed: &Closure<dyn Fn(JsValue)>,
    );

    /// `runtime.onMessage` for dialog decisions. The handler gets the message
    /// and the sender tab id, and its promise resolves to the response.
    #[wasm_bindgen(js_name = addDecisionListener)]
    pub(crate) fn add_decision_listener(handler: &Closure<dyn Fn(JsValue, JsValue) -> js_sys::Promise>);

    /// `runtime.onMessage` for `refreshUI`
    #[wasm_bindgen(js_name = addRefreshListener)]
    pub(crate) fn add_refresh_listener(handler: &Closure<dyn Fn()>);

    #[wasm_bindgen(js_name = downloadHtml)]
    pub(crate) fn download_html(filename: &str, html: &str);

    #[wasm_bindgen(js_name = extensionUrl)]
    fn runtime_url(path: &str) -> String;
}

/// Turn a rejected browser promise into a [`HostError`].
pub(crate) fn js_error(tab_id: Option<TabId>, err: JsValue) -> HostError {
    let message = err
        .as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", err));
    HostError::from_message(tab_id, &message)
}

/// Maps become plain objects, which is what `chrome.*` expects.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, HostError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::Serialization(e.to_string()))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Serialization(e.to_string()))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeHost;

impl BrowserHost for ChromeHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        let tabs = queryTabs().await.map_err(|e| js_error(None, e))?;
        from_js(tabs)
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        let tab = getTab(tab_id).await.map_err(|e| js_error(Some(tab_id), e))?;
        from_js(tab)
    }

    async fn current_tab(&self) -> Result<Option<TabInfo>, HostError> {
        let tab = getCurrentTab().await.map_err(|e| js_error(None, e))?;
        from_js(tab)
    }

    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo, HostError> {
        let tab = createTab(url, active).await.map_err(|e| js_error(None, e))?;
        from_js(tab)
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        activateTab(tab_id).await.map_err(|e| js_error(Some(tab_id), e))
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        focusWindow(window_id).await.map_err(|e| js_error(None, e))
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        let ids = to_js(tab_ids)?;
        removeTabs(ids)
            .await
            .map_err(|e| js_error(tab_ids.first().copied(), e))
    }

    async fn execute_script(&self, tab_id: TabId, file: &str) -> Result<(), HostError> {
        executeScript(tab_id, file).await.map_err(|e| js_error(Some(tab_id), e))
    }

    async fn insert_css(&self, tab_id: TabId, file: &str) -> Result<(), HostError> {
        insertCss(tab_id, file).await.map_err(|e| js_error(Some(tab_id), e))
    }

    async fn send_to_tab(&self, tab_id: TabId, request: &DialogRequest) -> Result<Option<Ack>, HostError> {
        let message = to_js(request)?;
        let response = sendToTab(tab_id, message)
            .await
            .map_err(|e| js_error(Some(tab_id), e))?;
        // Anything that is not an acknowledgment counts as no answer.
        Ok(from_js::<Option<Ack>>(response).unwrap_or(None))
    }

    async fn navigate_back(&self, tab_id: TabId, notice: &str, duration_ms: u32) -> Result<(), HostError> {
        navigateBack(tab_id, notice, duration_ms)
            .await
            .map_err(|e| js_error(Some(tab_id), e))
    }

    async fn set_badge_text(&self, text: &str) -> Result<(), HostError> {
        setBadgeText(text).await.map_err(|e| js_error(None, e))
    }

    async fn set_badge_color(&self, color: &str) -> Result<(), HostError> {
        setBadgeColor(color).await.map_err(|e| js_error(None, e))
    }

    async fn broadcast_refresh(&self) -> Result<(), HostError> {
        let message = to_js(&UiNotice::RefreshUi)?;
        broadcastMessage(message).await.map_err(|e| js_error(None, e))
    }

    async fn sleep(&self, ms: u32) {
        if let Err(e) = delay(ms).await {
            log::debug!("Timer rejected: {:?}", e);
        }
    }

    fn extension_url(&self, path: &str) -> String {
        runtime_url(path)
    }
}

impl StorageArea for ChromeHost {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, HostError> {
        let value = getStorage(key).await.map_err(|e| js_error(None, e))?;
        from_js(value)
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), HostError> {
        let value = to_js(&value)?;
        setStorage(key, value).await.map_err(|e| js_error(None, e))
    }

    async fn remove(&self, key: &str) -> Result<(), HostError> {
        removeStorage(key).await.map_err(|e| js_error(None, e))
    }
}

// Needs a JS engine: run with `wasm-pack test --headless --chrome`.
#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_js_error_from_string() {
        let err = js_error(Some(5), JsValue::from_str("No tab with id: 5."));
        assert_eq!(err, HostError::TabGone(5));
    }

    #[wasm_bindgen_test]
    fn test_js_error_from_error_object() {
        let err = js_error(None, js_sys::Error::new("Cannot access a chrome:// URL").into());
        assert!(matches!(err, HostError::Permission(_)));
    }

    #[wasm_bindgen_test]
    fn test_request_becomes_plain_object() {
        let request = DialogRequest::ShowConfirmation {
            existing_tab_id: 1,
            current_tab_id: 2,
            is_navigation: false,
        };
        let value = to_js(&request).unwrap();
        let action = js_sys::Reflect::get(&value, &JsValue::from_str("action")).unwrap();
        assert_eq!(action.as_string().as_deref(), Some("showConfirmation"));
    }
}
