/// Messages exchanged between the background worker, the dialog and the
/// management page
use crate::tab_data::TabId;
use serde::{Deserialize, Serialize};

/// Background → dialog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DialogRequest {
    ShowConfirmation {
        existing_tab_id: TabId,
        current_tab_id: TabId,
        is_navigation: bool,
    },
}

/// Dialog → background: the user's answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Decision {
    MergeTabs {
        existing_tab_id: TabId,
        #[serde(default)]
        current_tab_id: Option<TabId>,
    },
    KeepTab {
        #[serde(default)]
        current_tab_id: Option<TabId>,
        #[serde(default)]
        is_navigation: bool,
    },
    PromptClosed {
        #[serde(default)]
        current_tab_id: Option<TabId>,
        #[serde(default)]
        is_navigation: bool,
    },
}

/// Background → management page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum UiNotice {
    #[serde(rename = "refreshUI")]
    RefreshUi,
}

/// Dialog's acknowledgment of `showConfirmation`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub const RECEIVED: &'static str = "received";

    pub fn received() -> Ack {
        Ack {
            status: Ack::RECEIVED.to_string(),
        }
    }

    pub fn is_received(&self) -> bool {
        self.status == Ack::RECEIVED
    }
}

/// Background's answer to a [`Decision`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionResponse {
    fn status(status: &str) -> DecisionResponse {
        DecisionResponse {
            status: status.to_string(),
            error: None,
        }
    }

    pub fn merge_complete() -> DecisionResponse {
        DecisionResponse::status("merge complete")
    }

    pub fn merge_failed(error: String) -> DecisionResponse {
        DecisionResponse {
            status: "merge failed".to_string(),
            error: Some(error),
        }
    }

    pub fn keep_completed() -> DecisionResponse {
        DecisionResponse::status("keep completed")
    }

    pub fn keep_navigating_back() -> DecisionResponse {
        DecisionResponse::status("keep completed, navigating back")
    }

    pub fn closed_processed() -> DecisionResponse {
        DecisionResponse::status("closed processed")
    }
}
