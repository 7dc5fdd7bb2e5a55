/// Service-worker entry: wires `chrome.*` events to the [`Coordinator`].
///
/// `bridge.js` holds events that arrive before these handlers attach. They
/// attach before any await, with default settings; stored settings are
/// applied once they load.
use crate::chrome::{add_decision_listener, add_tab_listeners, from_js, to_js, ChromeHost};
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::messages::Decision;
use crate::storage;
use crate::tab_data::{ChangeInfo, TabId, TabInfo};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type Background = Rc<Coordinator<ChromeHost>>;

pub fn start() {
    let coordinator: Background = Rc::new(Coordinator::new(ChromeHost, Config::default()));

    register_tab_listeners(&coordinator);
    register_decision_listener(&coordinator);

    spawn_local(async move {
        let config = match storage::load_settings(coordinator.host()).await {
            Ok(overrides) => Config::from_overrides(overrides),
            Err(e) => {
                log::warn!("Could not read settings, using defaults: {}", e);
                Config::default()
            }
        };
        log::set_max_level(config.log_level);
        coordinator.apply_config(config);
        coordinator.start().await;
    });
}

fn tab_id_from_js(value: &JsValue) -> Option<TabId> {
    value.as_f64().map(|id| id as TabId)
}

fn register_tab_listeners(coordinator: &Background) {
    let on_created = {
        let coordinator = coordinator.clone();
        Closure::<dyn Fn(JsValue)>::new(move |tab: JsValue| match from_js::<TabInfo>(tab) {
            Ok(tab) => {
                let coordinator = coordinator.clone();
                spawn_local(async move { coordinator.on_tab_created(tab).await });
            }
            Err(e) => log::error!("Unreadable tabs.onCreated payload: {}", e),
        })
    };

    let on_updated = {
        let coordinator = coordinator.clone();
        Closure::<dyn Fn(JsValue, JsValue, JsValue)>::new(move |tab_id: JsValue, change: JsValue, tab: JsValue| {
            let Some(tab_id) = tab_id_from_js(&tab_id) else {
                return;
            };
            let parsed = from_js::<ChangeInfo>(change).and_then(|change| Ok((change, from_js::<TabInfo>(tab)?)));
            match parsed {
                Ok((change, tab)) => {
                    let coordinator = coordinator.clone();
                    spawn_local(async move { coordinator.on_tab_updated(tab_id, change, tab).await });
                }
                Err(e) => log::error!("Unreadable tabs.onUpdated payload for tab {}: {}", tab_id, e),
            }
        })
    };

    let on_removed = {
        let coordinator = coordinator.clone();
        Closure::<dyn Fn(JsValue)>::new(move |tab_id: JsValue| {
            if let Some(tab_id) = tab_id_from_js(&tab_id) {
                let coordinator = coordinator.clone();
                spawn_local(async move { coordinator.on_tab_removed(tab_id).await });
            }
        })
    };

    add_tab_listeners(&on_created, &on_updated, &on_removed);

    // The listeners live as long as the worker.
    on_created.forget();
    on_updated.forget();
    on_removed.forget();
}

fn register_decision_listener(coordinator: &Background) {
    let coordinator = coordinator.clone();
    let on_decision = Closure::<dyn Fn(JsValue, JsValue) -> js_sys::Promise>::new(
        move |message: JsValue, sender_tab: JsValue| {
            let coordinator = coordinator.clone();
            future_to_promise(async move {
                let decision: Decision =
                    from_js(message).map_err(|e| JsValue::from_str(&e.to_string()))?;
                match coordinator.handle_decision(tab_id_from_js(&sender_tab), decision).await {
                    Some(response) => to_js(&response).map_err(|e| JsValue::from_str(&e.to_string())),
                    None => Ok(JsValue::UNDEFINED),
                }
            })
        },
    );

    add_decision_listener(&on_decision);
    on_decision.forget();
}
