/// Runtime settings for the background worker
use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// How long a freshly created tab gets to settle before its URL is checked
    pub new_tab_check_delay_ms: u32,
    /// Host whose URL fragments are ignored when matching duplicates
    pub webmail_host: String,
    pub badge_alert_color: String,
    pub badge_clear_color: String,
    /// Dialog files injected into a duplicate tab, relative to the extension root
    pub dialog_script: String,
    pub dialog_style: String,
    pub back_notice_text: String,
    pub back_notice_ms: u32,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            new_tab_check_delay_ms: 300,
            webmail_host: "mail.google.com".to_string(),
            badge_alert_color: "#FF0000".to_string(),
            badge_clear_color: "#FFFFFF00".to_string(),
            dialog_script: "content_script.js".to_string(),
            dialog_style: "style.css".to_string(),
            back_notice_text: "Redirecting back to prevent duplicate tab...".to_string(),
            back_notice_ms: 3000,
            log_level: LevelFilter::Debug,
        }
    }
}

impl Config {
    /// Build a config from the stored `settings` overrides.
    ///
    /// Missing keys keep their defaults; a value that does not parse as a
    /// settings object is ignored as a whole.
    pub fn from_overrides(overrides: Option<serde_json::Value>) -> Config {
        match overrides {
            None => Config::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings: {}", e);
                Config::default()
            }),
        }
    }
}
