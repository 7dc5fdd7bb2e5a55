/// Popup UI for tabOptions: open tabs, duplicate groups and the saved list

use crate::chrome::{add_refresh_listener, download_html, ChromeHost};
use crate::host::HostError;
use crate::manager::{ManagerError, Snapshot, TabManager};
use crate::tab_data::TabId;
use crate::ui::components::{DuplicateGroupView, SavedTabRow, TabRow};
use patternfly_yew::prelude::*;
use std::future::Future;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Notice(String),
    Error(String),
}

/// What the hidden file input feeds once a file is picked
#[derive(Clone, Copy, PartialEq)]
enum ImportMode {
    SavedList,
    OpenTabs,
}

/// Extension page that hosts this app
const POPUP_PAGE: &str = "popup.html";

fn manager() -> TabManager<ChromeHost> {
    TabManager::new(ChromeHost)
}

async fn load_snapshot(snapshot: UseStateHandle<Option<Snapshot>>, state: UseStateHandle<AppState>) {
    match manager().snapshot().await {
        Ok(loaded) => snapshot.set(Some(loaded)),
        Err(e) => {
            log::error!("Failed to fetch tab data: {}", e);
            state.set(AppState::Error(format!("Failed to load tabs: {}", e)));
        }
    }
}

/// Run a manager action, report its outcome, then reload the lists.
fn run_action<F>(
    snapshot: UseStateHandle<Option<Snapshot>>,
    state: UseStateHandle<AppState>,
    busy_message: &str,
    action: F,
) where
    F: Future<Output = Result<Option<String>, ManagerError>> + 'static,
{
    state.set(AppState::Loading(busy_message.to_string()));
    spawn_local(async move {
        match action.await {
            Ok(Some(message)) => state.set(AppState::Notice(message)),
            Ok(None) => state.set(AppState::Idle),
            Err(e) => {
                log::error!("Action failed: {}", e);
                state.set(AppState::Error(e.to_string()));
            }
        }
        load_snapshot(snapshot, state).await;
    });
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// Was this page opened as a tab (`?mode=fullscreen`) rather than as the popup?
fn is_fullscreen_view() -> bool {
    let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
        return false;
    };
    search.trim_start_matches('?').split('&').any(|pair| pair == "mode=fullscreen")
}

/// Let the page use the whole tab instead of the popup's fixed width.
fn enter_fullscreen_layout() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    document.set_title("Tab Options - Full Screen View");
    if let Some(body) = document.body() {
        if let Err(e) = body.class_list().add_1("fullscreen-mode") {
            log::warn!("Could not switch to the full-screen layout: {:?}", e);
        }
    }
}

/// Today as `YYYY-MM-DD` (UTC), for export file names
fn today() -> String {
    let iso = String::from(js_sys::Date::new_0().to_iso_string());
    iso.split('T').next().unwrap_or_default().to_string()
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Idle);
    let snapshot = use_state(|| None::<Snapshot>);
    let import_mode = use_state(|| ImportMode::SavedList);
    let file_input = use_node_ref();
    let fullscreen = use_memo((), |_| is_fullscreen_view());

    // Initial load, then reload whenever the background reports a change
    {
        let snapshot = snapshot.clone();
        let state = state.clone();
        let fullscreen = *fullscreen;
        use_effect_with((), move |_| {
            if fullscreen {
                enter_fullscreen_layout();
            }
            spawn_local(load_snapshot(snapshot.clone(), state.clone()));

            let on_refresh = Closure::<dyn Fn()>::new(move || {
                spawn_local(load_snapshot(snapshot.clone(), state.clone()));
            });
            add_refresh_listener(&on_refresh);
            // The page and the listener go away together.
            on_refresh.forget();
            || ()
        });
    }

    let on_open_fullscreen = {
        let state = state.clone();
        Callback::from(move |_: MouseEvent| {
            let state = state.clone();
            spawn_local(async move {
                if let Err(e) = manager().open_fullscreen(POPUP_PAGE).await {
                    log::error!("Failed to open full-screen view: {}", e);
                    state.set(AppState::Error(e.to_string()));
                }
            });
        })
    };

    let on_activate = Callback::from(move |tab_id: TabId| {
        spawn_local(async move {
            if let Err(e) = manager().activate(tab_id).await {
                log::error!("Failed to activate tab/window: {}", e);
            }
        });
    });

    let on_close = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |tab_id: TabId| {
            run_action(snapshot.clone(), state.clone(), "Closing tab...", async move {
                manager().close_tab(tab_id).await.map(|_| None)
            });
        })
    };

    let on_save_and_close = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |tab_id: TabId| {
            run_action(snapshot.clone(), state.clone(), "Saving tab...", async move {
                manager().save_and_close(tab_id).await.map(|_| None)
            });
        })
    };

    let on_close_duplicates = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |url: String| {
            run_action(snapshot.clone(), state.clone(), "Closing duplicates...", async move {
                manager().close_duplicates(&url).await.map(|_| None)
            });
        })
    };

    let on_close_all_duplicates = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            run_action(snapshot.clone(), state.clone(), "Closing duplicates...", async move {
                let closed = manager().close_all_duplicates().await?;
                Ok((closed == 0).then(|| "No duplicate tabs to close.".to_string()))
            });
        })
    };

    let on_save_all_and_close = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            run_action(snapshot.clone(), state.clone(), "Saving tabs...", async move {
                let closed = manager().save_all_and_close().await?;
                Ok(Some(format!("Saved and closed {} tabs.", closed)))
            });
        })
    };

    let on_reopen = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |url: String| {
            run_action(snapshot.clone(), state.clone(), "Reopening tab...", async move {
                manager().reopen_saved(&url).await.map(|_| None)
            });
        })
    };

    let on_delete_saved = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |url: String| {
            run_action(snapshot.clone(), state.clone(), "Deleting saved tab...", async move {
                manager().delete_saved(&url).await.map(|_| None)
            });
        })
    };

    let on_delete_all_saved = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            let nothing_saved = (*snapshot).as_ref().is_none_or(|s| s.saved.is_empty());
            if nothing_saved {
                alert(&ManagerError::NothingSaved.to_string());
                return;
            }
            if !confirm("Are you sure you want to delete ALL saved tabs? This action cannot be undone.") {
                log::debug!("User cancelled deletion of all saved tabs.");
                return;
            }
            run_action(snapshot.clone(), state.clone(), "Deleting saved tabs...", async move {
                manager().delete_all_saved().await?;
                Ok(Some("All saved tabs have been deleted.".to_string()))
            });
        })
    };

    let on_reopen_all = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            run_action(snapshot.clone(), state.clone(), "Reopening tabs...", async move {
                let opened = manager().reopen_all().await?;
                Ok((opened == 0).then(|| "There are no saved tabs to reopen.".to_string()))
            });
        })
    };

    let on_export_saved = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            run_action(snapshot.clone(), state.clone(), "Exporting...", async move {
                let file = manager().export_saved(&today()).await?;
                download_html(&file.filename, &file.html);
                log::info!("Saved tabs exported to {}", file.filename);
                Ok(None)
            });
        })
    };

    let on_export_open = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        Callback::from(move |_: MouseEvent| {
            run_action(snapshot.clone(), state.clone(), "Exporting...", async move {
                let file = manager().export_open(&today()).await?;
                download_html(&file.filename, &file.html);
                log::info!("Open tabs exported to {}", file.filename);
                Ok(None)
            });
        })
    };

    let pick_file = |mode: ImportMode| {
        let import_mode = import_mode.clone();
        let file_input = file_input.clone();
        Callback::from(move |_: MouseEvent| {
            import_mode.set(mode);
            if let Some(input) = file_input.cast::<HtmlInputElement>() {
                input.click();
            }
        })
    };

    let on_file_chosen = {
        let (snapshot, state) = (snapshot.clone(), state.clone());
        let mode = *import_mode;
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            // Picking the same file twice should fire `change` again.
            input.set_value("");

            run_action(snapshot.clone(), state.clone(), "Importing...", async move {
                let text = JsFuture::from(file.text())
                    .await
                    .map_err(|e| HostError::Other(format!("Could not read file: {:?}", e)))?;
                let html = text.as_string().unwrap_or_default();
                let count = match mode {
                    ImportMode::SavedList => manager().import_saved(&html).await,
                    ImportMode::OpenTabs => manager().import_and_open(&html).await,
                };
                match count {
                    Ok(count) => Ok(Some(format!("Imported {} tabs.", count))),
                    Err(e @ ManagerError::Import(_)) => {
                        alert(&e.to_string());
                        Err(e)
                    }
                    Err(e) => Err(e),
                }
            });
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));

    let content = match &*snapshot {
        None => html! {
            <div class="loading-text-center">
                <Spinner />
            </div>
        },
        Some(snapshot) => html! {
            <>
                <div class="header-group">
                    <h2 id="all-tabs-header">{format!("All Open Tabs ({})", snapshot.tabs.len())}</h2>
                    <Button onclick={on_export_open} disabled={is_busy} variant={ButtonVariant::Link}>{"Export"}</Button>
                    <Button onclick={pick_file(ImportMode::OpenTabs)} disabled={is_busy} variant={ButtonVariant::Link}>{"Import & Open"}</Button>
                    <Button onclick={on_close_all_duplicates} disabled={is_busy} variant={ButtonVariant::Link}>{"Close Duplicate Tabs"}</Button>
                    <Button onclick={on_save_all_and_close} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                        {"Save all tabs & close"}
                    </Button>
                </div>

                if !snapshot.duplicates.is_empty() {
                    <div class="stats-container">
                        <h2 class="stats-title">{"Duplicate Tabs"}</h2>
                        {for snapshot.duplicates.iter().map(|group| html! {
                            <DuplicateGroupView
                                group={group.clone()}
                                on_close_duplicates={on_close_duplicates.clone()}
                                on_activate={on_activate.clone()}
                            />
                        })}
                    </div>
                }

                <ul class="tab-list">
                    {for snapshot.tabs.iter().map(|tab| html! {
                        <TabRow
                            tab={tab.clone()}
                            current={snapshot.current_tab_id == Some(tab.id)}
                            on_activate={on_activate.clone()}
                            on_save_and_close={on_save_and_close.clone()}
                            on_close={on_close.clone()}
                        />
                    })}
                </ul>

                <div class="header-group">
                    <h2>{"Saved Tabs"}</h2>
                    <Button onclick={on_export_saved} disabled={is_busy} variant={ButtonVariant::Link}>{"Export List"}</Button>
                    <Button onclick={pick_file(ImportMode::SavedList)} disabled={is_busy} variant={ButtonVariant::Link}>{"Import List"}</Button>
                    <Button onclick={on_delete_all_saved} disabled={is_busy} variant={ButtonVariant::Link}>{"Delete All Saved Tabs"}</Button>
                    <Button onclick={on_reopen_all} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                        {"Reopen all tabs"}
                    </Button>
                </div>

                <ul class="tab-list">
                    {for snapshot.saved.tabs.iter().map(|tab| html! {
                        <SavedTabRow
                            tab={tab.clone()}
                            on_reopen={on_reopen.clone()}
                            on_delete={on_delete_saved.clone()}
                        />
                    })}
                </ul>

                <p class="footer-popup">
                    {format!(
                        "Duplicates caught: {} · closed: {}",
                        snapshot.stats.identified, snapshot.stats.closed
                    )}
                </p>
            </>
        },
    };

    html! {
        <div class="padding-20">
            <div class="popup-header">
                <h1 class="popup-title">{"Tab Options"}</h1>
                if !*fullscreen {
                    <Button onclick={on_open_fullscreen} variant={ButtonVariant::Link}>{"Open in Full Screen"}</Button>
                }
            </div>

            <input
                type="file"
                accept=".html,text/html"
                class="hidden-input"
                ref={file_input}
                onchange={on_file_chosen}
            />

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Notice(msg) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Info} title={msg.clone()} inline={true}>
                        </Alert>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            {content}
        </div>
    }
}
