/// URL rules: which URLs take part in duplicate checks and how they compare
use url::Url;

/// Is this one of the browser's new-tab pages?
pub fn is_new_tab_page(url: &str) -> bool {
    url.starts_with("chrome://new-tab") || url.starts_with("chrome://newtab")
}

/// Only plain web pages are checked for duplicates.
///
/// Internal pages (`chrome://`, `about:`, extension pages) are excluded here,
/// but still count towards the badge.
pub fn is_checkable_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Query string of the management page when it runs in its own tab
pub const FULLSCREEN_QUERY: &str = "mode=fullscreen&name=tab-options";

/// Is `url` this extension's management page opened as a full tab?
pub fn is_fullscreen_page(url: &str, extension_origin: &str) -> bool {
    url.starts_with(extension_origin) && url.contains(FULLSCREEN_QUERY)
}

/// Can this URL be put on the saved list?
pub fn is_savable_url(url: &str) -> bool {
    !url.is_empty()
        && !url.starts_with("chrome:")
        && !url.starts_with("chrome-extension:")
        && !url.starts_with("moz-extension:")
        && !url.starts_with("about:")
}

/// URL used when looking up duplicates.
///
/// The webmail client keeps its view state in the fragment, so two tabs on
/// the same mailbox differ only after `#`. For that host alone the fragment is
/// dropped; every other URL is compared verbatim.
pub fn canonical_url<'a>(url: &'a str, webmail_host: &str) -> &'a str {
    if !webmail_host.is_empty() && url.contains(webmail_host) {
        if let Some((before, _fragment)) = url.split_once('#') {
            return before;
        }
    }
    url
}

/// Hostname of a URL, used as a fallback title for imported links
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_string()))
        .filter(|host| !host.is_empty())
}
