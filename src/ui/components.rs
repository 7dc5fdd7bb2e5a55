/// List rows for the management page

use crate::tab_data::{DuplicateGroup, SavedTab, TabId, TabInfo};
use patternfly_yew::prelude::*;
use yew::prelude::*;

const NO_TITLE: &str = "(No Title)";
const FALLBACK_ICON: &str = "icons/icon16.png";

fn favicon(url: Option<&str>) -> Html {
    let src = url.filter(|u| !u.is_empty()).unwrap_or(FALLBACK_ICON).to_string();
    html! { <img class="icon" src={src} alt="Favicon" /> }
}

/// Wrap a row callback so the click does not also reach the row itself.
fn row_action<T: Clone + 'static>(callback: &Callback<T>, value: T) -> Callback<MouseEvent> {
    let callback = callback.clone();
    Callback::from(move |e: MouseEvent| {
        e.stop_propagation();
        callback.emit(value.clone());
    })
}

#[derive(Properties, PartialEq)]
pub struct TabRowProps {
    pub tab: TabInfo,
    #[prop_or(false)]
    pub current: bool,
    pub on_activate: Callback<TabId>,
    pub on_save_and_close: Callback<TabId>,
    pub on_close: Callback<TabId>,
}

/// An open tab: click to switch to it
#[function_component(TabRow)]
pub fn tab_row(props: &TabRowProps) -> Html {
    let tab = &props.tab;
    let onclick = {
        let on_activate = props.on_activate.clone();
        let id = tab.id;
        Callback::from(move |_: MouseEvent| on_activate.emit(id))
    };
    let class = if props.current { "tab-list-item current" } else { "tab-list-item" };

    html! {
        <li {class} {onclick}>
            {favicon(tab.fav_icon_url.as_deref())}
            <span class="tab-info">
                <span class="tab-title">{tab.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(NO_TITLE)}</span>
                <span class="tab-url">{tab.url().unwrap_or_default()}</span>
            </span>
            <Button variant={ButtonVariant::Secondary} onclick={row_action(&props.on_save_and_close, tab.id)}>
                {"Save & Close"}
            </Button>
            <Button variant={ButtonVariant::Secondary} onclick={row_action(&props.on_close, tab.id)}>
                {"Close"}
            </Button>
        </li>
    }
}

#[derive(Properties, PartialEq)]
pub struct SavedTabRowProps {
    pub tab: SavedTab,
    pub on_reopen: Callback<String>,
    pub on_delete: Callback<String>,
}

#[function_component(SavedTabRow)]
pub fn saved_tab_row(props: &SavedTabRowProps) -> Html {
    let tab = &props.tab;
    let title = if tab.title.is_empty() { NO_TITLE } else { tab.title.as_str() };

    html! {
        <li class="tab-list-item">
            {favicon(tab.fav_icon_url.as_deref())}
            <span class="tab-info">
                <span class="tab-title">{title}</span>
                <span class="tab-url">{&tab.url}</span>
            </span>
            <Button variant={ButtonVariant::Secondary} onclick={row_action(&props.on_reopen, tab.url.clone())}>
                {"Reopen"}
            </Button>
            <Button variant={ButtonVariant::Danger} onclick={row_action(&props.on_delete, tab.url.clone())}>
                {"Delete"}
            </Button>
        </li>
    }
}

#[derive(Properties, PartialEq)]
pub struct DuplicateGroupViewProps {
    pub group: DuplicateGroup,
    pub on_close_duplicates: Callback<String>,
    pub on_activate: Callback<TabId>,
}

/// One repeated URL with the tabs showing it
#[function_component(DuplicateGroupView)]
pub fn duplicate_group_view(props: &DuplicateGroupViewProps) -> Html {
    let group = &props.group;

    html! {
        <div class="duplicate-group">
            <div class="duplicate-group-header">
                <span class="tab-url">{&group.url}</span>
                <span class="duplicate-count">{format!("{} tabs", group.tabs.len())}</span>
                <Button variant={ButtonVariant::Danger} onclick={row_action(&props.on_close_duplicates, group.url.clone())}>
                    {"Close duplicates"}
                </Button>
            </div>
            <ul class="tab-list">
                {for group.tabs.iter().map(|tab| {
                    let on_activate = props.on_activate.clone();
                    let id = tab.id;
                    html! {
                        <li class="tab-list-item" onclick={Callback::from(move |_: MouseEvent| on_activate.emit(id))}>
                            {favicon(tab.fav_icon_url.as_deref())}
                            <span class="tab-title">{tab.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(NO_TITLE)}</span>
                        </li>
                    }
                })}
            </ul>
        </div>
    }
}
