/// HTML export and import of tab lists
use crate::domain::{hostname, is_checkable_url};
use crate::tab_data::{SavedTab, TabInfo};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

const NO_TITLE: &str = "(No Title)";

static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<ul\b[^>]*>(.*?)</ul\s*>").unwrap());
static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").unwrap());
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\shref\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>(.*?)</a\s*>"#).unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos);").unwrap());

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportError {
    #[error("No valid tabs found in the imported file.")]
    NoEntries,
}

/// Which list is being exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    SavedTabs,
    OpenTabs,
}

impl ExportKind {
    fn heading(self, date: &str) -> String {
        match self {
            ExportKind::SavedTabs => format!("Exported Saved Tab List ({})", date),
            ExportKind::OpenTabs => format!("Exported Open Tabs ({})", date),
        }
    }

    fn intro(self) -> &'static str {
        match self {
            ExportKind::SavedTabs => "This file contains a list of your tabs saved for later from the tabOptions extension.",
            ExportKind::OpenTabs => "This file contains a list of your currently open tabs exported from the tabOptions extension.",
        }
    }

    pub fn filename(self, date: &str) -> String {
        match self {
            ExportKind::SavedTabs => format!("tab_options_saved_tabs_export_{}.html", date),
            ExportKind::OpenTabs => format!("tab_options_open_tabs_export_{}.html", date),
        }
    }
}

/// One exported line
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    pub title: Option<String>,
    pub url: String,
}

impl From<&SavedTab> for ExportEntry {
    fn from(tab: &SavedTab) -> Self {
        ExportEntry {
            title: Some(tab.title.clone()).filter(|t| !t.is_empty()),
            url: tab.url.clone(),
        }
    }
}

impl ExportEntry {
    pub fn from_tab(tab: &TabInfo) -> Option<ExportEntry> {
        Some(ExportEntry {
            title: tab.title.clone().filter(|t| !t.is_empty()),
            url: tab.url.clone()?,
        })
    }
}

/// A ready-to-download export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub html: String,
}

/// A link recognized in an imported file
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedLink {
    pub title: String,
    pub url: String,
}

impl From<ImportedLink> for SavedTab {
    fn from(link: ImportedLink) -> Self {
        SavedTab {
            title: link.title,
            url: link.url,
            fav_icon_url: None,
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn unescape_html(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let digits = &entity[1..];
                    let code = match digits.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => digits.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Render a tab list as a standalone HTML page.
///
/// Only `http`/`https` entries are written.
pub fn render_export<'a>(kind: ExportKind, entries: impl IntoIterator<Item = &'a ExportEntry>, date: &str) -> ExportFile {
    let items: String = entries
        .into_iter()
        .filter(|entry| is_checkable_url(&entry.url))
        .map(|entry| {
            let title = escape_html(entry.title.as_deref().unwrap_or(NO_TITLE));
            let url = escape_html(&entry.url);
            format!(
                r#"
          <li>
              <div class="tab-info">
                  <a href="{url}" target="_blank" rel="noopener noreferrer" class="tab-title-link">{title}</a>
                  <span class="url">{url}</span>
              </div>
          </li>"#
            )
        })
        .collect();

    let heading = escape_html(&kind.heading(date));
    let empty_note = if items.is_empty() {
        r#"<p class="no-tabs-message">No tabs were exported.</p>"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>tabOptions - {heading}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 15px; background-color: #f4f7f6; }}
        .container {{ max-width: 700px; margin: 15px auto; background-color: #fff; padding: 20px 25px; border-radius: 8px; box-shadow: 0 3px 10px rgba(0, 0, 0, 0.07); }}
        h1 {{ color: #0056b3; text-align: center; margin-top: 0; font-size: 1.6em; }}
        p.intro {{ color: #555; text-align: center; }}
        ul {{ list-style: none; padding: 0; margin: 0 0 20px 0; }}
        li {{ background-color: #f8f9fa; border: 1px solid #e9ecef; margin-bottom: 10px; padding: 10px 15px; border-radius: 6px; }}
        .tab-info a.tab-title-link {{ text-decoration: none; color: #007bff; font-weight: 600; display: block; }}
        .tab-info .url {{ font-size: 0.8em; color: #6c757d; display: block; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }}
        .no-tabs-message {{ text-align: center; color: #777; font-style: italic; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{heading}</h1>
        <p class="intro">{intro}</p>
        <ul>{items}</ul>
        {empty_note}
    </div>
</body>
</html>"#,
        intro = escape_html(kind.intro()),
    );

    ExportFile {
        filename: kind.filename(date),
        html,
    }
}

/// Pull the links out of an exported page.
///
/// Only the first anchor of each `<li>` inside a `<ul>` counts, and only
/// absolute `http`/`https` targets. Anything else is skipped silently; a
/// page with no usable link at all is an error. Repeated URLs are kept once.
pub fn parse_import(html: &str) -> Result<Vec<ImportedLink>, ImportError> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for list in LIST_RE.captures_iter(html) {
        for item in ITEM_RE.captures_iter(&list[1]) {
            let Some(anchor) = ANCHOR_RE.captures(&item[1]) else {
                continue;
            };
            let href = anchor.get(1).or_else(|| anchor.get(2)).map_or("", |m| m.as_str());
            let url = unescape_html(href.trim());
            if !is_checkable_url(&url) || hostname(&url).is_none() {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let text = unescape_html(&TAG_RE.replace_all(&anchor[3], ""));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let title = if text.is_empty() || text == NO_TITLE {
                hostname(&url).unwrap_or_else(|| url.clone())
            } else {
                text
            };

            links.push(ImportedLink { title, url });
        }
    }

    if links.is_empty() {
        log::warn!("No valid URLs found in imported file");
        return Err(ImportError::NoEntries);
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SavedTabs;

    fn saved(title: &str, url: &str) -> SavedTab {
        SavedTab {
            title: title.to_string(),
            url: url.to_string(),
            fav_icon_url: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &amp;amp; b"), "a &amp; b");
        assert_eq!(unescape_html("&lt;&#39;&#x27;&quot;&gt;"), "<''\">");
        assert_eq!(unescape_html("&nbsp; stays"), "&nbsp; stays");
    }

    #[test]
    fn test_render_export_lists_web_tabs_only() {
        let entries = vec![
            ExportEntry::from(&saved("Rust", "https://www.rust-lang.org/")),
            ExportEntry::from(&saved("Settings", "chrome://settings/")),
            ExportEntry::from(&saved("", "http://a.example/?q=1&r=2")),
        ];

        let file = render_export(ExportKind::SavedTabs, &entries, "2024-05-01");

        assert_eq!(file.filename, "tab_options_saved_tabs_export_2024-05-01.html");
        assert!(file.html.contains("Exported Saved Tab List (2024-05-01)"));
        assert!(file.html.contains(r#"href="https://www.rust-lang.org/""#));
        assert!(!file.html.contains("chrome://settings/"));
        assert!(file.html.contains(r#"href="http://a.example/?q=1&amp;r=2""#));
        assert!(file.html.contains(">(No Title)</a>"));
        assert!(!file.html.contains("No tabs were exported."));
    }

    #[test]
    fn test_render_empty_export() {
        let file = render_export(ExportKind::OpenTabs, &[], "2024-05-01");

        assert_eq!(file.filename, "tab_options_open_tabs_export_2024-05-01.html");
        assert!(file.html.contains("No tabs were exported."));
    }

    #[test]
    fn test_parse_import_skips_unrecognized_anchors() {
        let html = r#"
            <p><a href="https://outside.example/">not in a list</a></p>
            <ol><li><a href="https://ordered.example/">ordered list</a></li></ol>
            <ul>
                <li><a class="x" href="https://a.example/">Alpha <b>site</b></a></li>
                <li>no anchor here</li>
                <li><a href="javascript:alert(1)">script</a></li>
                <li><a href='https://b.example/path'>   </a></li>
                <li><a href="relative/path">relative</a></li>
                <li><a href="https://a.example/">Alpha again</a></li>
            </ul>"#;

        let links = parse_import(html).unwrap();

        assert_eq!(
            links,
            vec![
                ImportedLink {
                    title: "Alpha site".to_string(),
                    url: "https://a.example/".to_string()
                },
                ImportedLink {
                    title: "b.example".to_string(),
                    url: "https://b.example/path".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_import_without_entries() {
        assert_eq!(parse_import("<html><body>nothing</body></html>"), Err(ImportError::NoEntries));
        assert_eq!(parse_import(""), Err(ImportError::NoEntries));
        assert_eq!(parse_import("<ul><li>plain</li></ul>"), Err(ImportError::NoEntries));
    }

    #[test]
    fn test_export_then_import_keeps_urls() {
        let mut original = SavedTabs::new();
        original.add(saved("Rust", "https://www.rust-lang.org/"));
        original.add(saved("Query <&>", "https://a.example/search?q=tabs&page=2#top"));
        original.add(saved("", "http://b.example/"));

        let entries: Vec<ExportEntry> = original.tabs.iter().map(ExportEntry::from).collect();
        let file = render_export(ExportKind::SavedTabs, &entries, "2024-05-01");

        // Overlapping list: one URL is already saved.
        let mut restored = SavedTabs::new();
        restored.add(saved("Already here", "http://b.example/"));
        let links = parse_import(&file.html).unwrap();
        let added = restored.extend_new(links.into_iter().map(SavedTab::from));

        assert_eq!(added, 2);
        let mut urls: Vec<&str> = restored.tabs.iter().map(|t| t.url.as_str()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                "http://b.example/",
                "https://a.example/search?q=tabs&page=2#top",
                "https://www.rust-lang.org/",
            ]
        );
        assert_eq!(restored.tabs.iter().find(|t| t.url == "https://a.example/search?q=tabs&page=2#top").unwrap().title, "Query <&>");
    }
}
