/// Tab operations: duplicate grouping and counting

use crate::domain::{is_new_tab_page, is_savable_url};
use crate::tab_data::{DuplicateGroup, TabId, TabInfo};
use std::collections::HashMap;

/// Group open tabs by exact URL, keeping only groups with more than one tab.
///
/// Groups come out in the order their URL was first seen, and tabs keep the
/// order they were given in. Tabs without a URL are ignored.
pub fn group_duplicates(tabs: &[TabInfo]) -> Vec<DuplicateGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_url: HashMap<&str, Vec<TabInfo>> = HashMap::new();

    for tab in tabs {
        let Some(url) = tab.url() else { continue };
        by_url
            .entry(url)
            .or_insert_with(|| {
                order.push(url);
                Vec::new()
            })
            .push(tab.clone());
    }

    order
        .into_iter()
        .filter_map(|url| {
            let group = by_url.remove(url)?;
            (group.len() > 1).then(|| DuplicateGroup {
                url: url.to_string(),
                tabs: group,
            })
        })
        .collect()
}

/// Number of tabs that belong to some duplicate group.
///
/// Three tabs on one URL count as 3, not 2. Internal pages are counted too.
pub fn count_duplicate_tabs(tabs: &[TabInfo]) -> usize {
    tabs.iter()
        .filter_map(|tab| tab.url())
        .fold(HashMap::<&str, usize>::new(), |mut counts, url| {
            *counts.entry(url).or_insert(0) += 1;
            counts
        })
        .into_values()
        .filter(|count| *count > 1)
        .sum()
}

/// Every tab in the group except the first (which is kept)
pub fn redundant_tab_ids(group: &DuplicateGroup) -> Vec<TabId> {
    group.tabs.iter().skip(1).map(|tab| tab.id).collect()
}

/// Tabs shown in the management page's "all tabs" list
pub fn listable_tabs(tabs: &[TabInfo]) -> Vec<TabInfo> {
    tabs.iter()
        .filter(|tab| tab.url().is_some_and(|url| !is_new_tab_page(url)))
        .cloned()
        .collect()
}

/// Tabs that "save all & close" puts on the saved list
pub fn savable_tabs(tabs: &[TabInfo]) -> Vec<TabInfo> {
    tabs.iter()
        .filter(|tab| tab.url().is_some_and(is_savable_url))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tab(id: TabId, url: &str) -> TabInfo {
        TabInfo::new(id, 1, url)
    }

    #[test]
    fn test_count_duplicate_tabs() {
        let tabs = vec![
            create_test_tab(1, "https://a.example/x"),
            create_test_tab(2, "https://b.example/"),
            create_test_tab(3, "https://a.example/x"),
            create_test_tab(4, "https://c.example/"),
            create_test_tab(5, "https://a.example/x"),
        ];

        assert_eq!(count_duplicate_tabs(&tabs), 3);
    }

    #[test]
    fn test_count_duplicate_tabs_no_duplicates() {
        let tabs = vec![
            create_test_tab(1, "https://a.example/"),
            create_test_tab(2, "https://b.example/"),
            create_test_tab(3, "https://c.example/"),
        ];

        assert_eq!(count_duplicate_tabs(&tabs), 0);
        assert_eq!(count_duplicate_tabs(&[]), 0);
    }

    #[test]
    fn test_count_includes_internal_pages() {
        let tabs = vec![
            create_test_tab(1, "chrome://newtab/"),
            create_test_tab(2, "chrome://newtab/"),
            create_test_tab(3, "https://a.example/"),
        ];

        assert_eq!(count_duplicate_tabs(&tabs), 2);
    }

    #[test]
    fn test_count_ignores_tabs_without_url() {
        let tabs = vec![
            TabInfo { id: 1, ..TabInfo::default() },
            TabInfo { id: 2, ..TabInfo::default() },
        ];

        assert_eq!(count_duplicate_tabs(&tabs), 0);
    }

    #[test]
    fn test_group_duplicates() {
        let tabs = vec![
            create_test_tab(1, "https://b.example/"),
            create_test_tab(2, "https://a.example/"),
            create_test_tab(3, "https://b.example/"),
            create_test_tab(4, "https://c.example/"),
            create_test_tab(5, "https://a.example/"),
            create_test_tab(6, "https://b.example/"),
        ];

        let groups = group_duplicates(&tabs);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].url, "https://b.example/");
        assert_eq!(groups[0].tabs.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 6]);
        assert_eq!(groups[1].url, "https://a.example/");
        assert_eq!(redundant_tab_ids(&groups[0]), vec![3, 6]);
        assert_eq!(redundant_tab_ids(&groups[1]), vec![5]);
    }

    #[test]
    fn test_listable_tabs_hides_new_tab_pages() {
        let tabs = vec![
            create_test_tab(1, "chrome://newtab/"),
            create_test_tab(2, "https://a.example/"),
            TabInfo { id: 3, ..TabInfo::default() },
        ];

        let listed = listable_tabs(&tabs);

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 2);
    }

    #[test]
    fn test_savable_tabs() {
        let tabs = vec![
            create_test_tab(1, "chrome://extensions/"),
            create_test_tab(2, "https://a.example/"),
            create_test_tab(3, "chrome-extension://abc/popup.html?mode=fullscreen"),
            create_test_tab(4, "http://b.example/"),
        ];

        let ids: Vec<TabId> = savable_tabs(&tabs).iter().map(|t| t.id).collect();

        assert_eq!(ids, vec![2, 4]);
    }
}
