/// Persisted shelf layout and its in-place mutations

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::now_millis;
use crate::error::{ImportError, Result};
use crate::grouping::GroupResolver;
use crate::tab_data::{Group, NewEntry, SaveResult, SearchHit, Session, Settings, TabEntry};

const EXPORT_VERSION: u32 = 1;

/// How an import combines with what is already shelved
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Merge,
    Replace,
}

/// Root storage structure: the `groups`, `sessions` and `settings` keys
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageData {
    pub groups: Vec<Group>,
    /// Most recent first
    pub sessions: Vec<Session>,
    pub settings: Settings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSnapshot<'a> {
    version: u32,
    exported_at: i64,
    groups: &'a [Group],
    sessions: &'a [Session],
    settings: &'a Settings,
}

#[derive(Deserialize)]
struct ImportSnapshot {
    groups: Vec<Group>,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    settings: Option<Settings>,
}

impl StorageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert entries, skipping any URL already shelved (in any group, or
    /// earlier in this batch). `self.groups` is the accumulator handed to the
    /// resolver, so groups created for early entries are reused by later ones.
    pub fn save_tabs(&mut self, entries: Vec<NewEntry>, resolver: &dyn GroupResolver) -> SaveResult {
        let mut known: HashSet<String> = self
            .groups
            .iter()
            .flat_map(|g| g.tabs.iter().map(|t| t.url.clone()))
            .collect();
        let mut result = SaveResult::default();

        for entry in entries {
            if !known.insert(entry.url.clone()) {
                debug!("Already shelved: {}", entry.url);
                result.duplicates += 1;
                continue;
            }
            let group = resolver.resolve(&entry, &mut self.groups);
            group.tabs.push(TabEntry::from_new(entry));
            result.saved += 1;
        }

        result
    }

    /// Record a session at the front, evicting the oldest beyond `max_sessions`
    pub fn create_session(&mut self, tab_count: usize, group_ids: Vec<String>, max_sessions: usize) {
        self.sessions.insert(0, Session::new(tab_count, group_ids));
        self.sessions.truncate(max_sessions);
    }

    pub fn group_by_id(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Remove one tab record; the (possibly empty) group stays
    pub fn remove_tab(&mut self, group_id: &str, tab_id: &str) -> bool {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .map(|group| {
                let original_len = group.tabs.len();
                group.tabs.retain(|t| t.id != tab_id);
                group.tabs.len() < original_len
            })
            .unwrap_or(false)
    }

    pub fn delete_group(&mut self, group_id: &str) -> bool {
        let original_len = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        self.groups.len() < original_len
    }

    pub fn total_tab_count(&self) -> usize {
        self.groups.iter().map(|g| g.tabs.len()).sum()
    }

    /// Drop every group and session; settings survive
    pub fn clear(&mut self) {
        self.groups.clear();
        self.sessions.clear();
    }

    pub fn export(&self) -> Result<String> {
        let snapshot = ExportSnapshot {
            version: EXPORT_VERSION,
            exported_at: now_millis(),
            groups: &self.groups,
            sessions: &self.sessions,
            settings: &self.settings,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Apply an exported snapshot. The payload is parsed and validated in
    /// full before anything changes, so a rejected import leaves the shelf
    /// exactly as it was.
    pub fn import(&mut self, text: &str, mode: ImportMode, max_sessions: usize) -> std::result::Result<(), ImportError> {
        let snapshot = parse_snapshot(text)?;

        match mode {
            ImportMode::Replace => {
                self.groups = snapshot.groups;
                self.sessions = snapshot.sessions;
                if let Some(settings) = snapshot.settings {
                    self.settings = settings;
                }
            }
            ImportMode::Merge => {
                self.merge_groups(snapshot.groups);
                let known: HashSet<String> = self.sessions.iter().map(|s| s.id.clone()).collect();
                self.sessions
                    .extend(snapshot.sessions.into_iter().filter(|s| !known.contains(&s.id)));
            }
        }

        self.sessions.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        self.sessions.truncate(max_sessions);
        info!(
            "Imported shelf ({:?}): {} groups, {} tabs",
            mode,
            self.groups.len(),
            self.total_tab_count()
        );
        Ok(())
    }

    fn merge_groups(&mut self, incoming: Vec<Group>) {
        let mut known_urls: HashSet<String> = self
            .groups
            .iter()
            .flat_map(|g| g.tabs.iter().map(|t| t.url.clone()))
            .collect();

        for mut group in incoming {
            let tabs: Vec<TabEntry> = std::mem::take(&mut group.tabs)
                .into_iter()
                .filter(|t| known_urls.insert(t.url.clone()))
                .collect();

            if let Some(existing) = self.groups.iter_mut().find(|g| g.domain == group.domain) {
                existing.tabs.extend(tabs);
                continue;
            }

            if self.groups.iter().any(|g| g.id == group.id) {
                group.id = Uuid::new_v4().to_string();
            }
            group.tabs = tabs;
            self.groups.push(group);
        }
    }
}

fn parse_snapshot(text: &str) -> std::result::Result<ImportSnapshot, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(ImportError::Malformed)?;
    if !value.get("groups").is_some_and(|g| g.is_array()) {
        return Err(ImportError::MissingGroups);
    }
    let snapshot: ImportSnapshot = serde_json::from_value(value).map_err(ImportError::Malformed)?;

    let mut domains = HashSet::new();
    for group in &snapshot.groups {
        if !domains.insert(group.domain.as_str()) {
            return Err(ImportError::DuplicateDomain(group.domain.clone()));
        }
        if group.tabs.iter().any(|t| t.url.is_empty()) {
            return Err(ImportError::EmptyUrl(group.name.clone()));
        }
    }

    Ok(snapshot)
}

/// Case-insensitive substring match over tab titles, URLs and group names.
/// An empty query matches nothing.
pub fn search_tabs(groups: &[Group], query: &str) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    groups
        .iter()
        .flat_map(|group| {
            let group_matches = group.name.to_lowercase().contains(&query);
            let query = query.clone();
            group
                .tabs
                .iter()
                .filter(move |tab| {
                    group_matches
                        || tab.title.to_lowercase().contains(&query)
                        || tab.url.to_lowercase().contains(&query)
                })
                .map(move |tab| SearchHit {
                    tab: tab.clone(),
                    group_id: group.id.clone(),
                    group_name: group.name.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingConfig;
    use crate::grouping::GroupingEngine;

    fn engine() -> GroupingEngine {
        GroupingEngine::new(GroupingConfig::default())
    }

    fn entries(urls: &[&str]) -> Vec<NewEntry> {
        urls.iter().map(|u| NewEntry::normalized(u, None, None)).collect()
    }

    fn create_test_storage() -> StorageData {
        let mut storage = StorageData::new();
        storage.save_tabs(
            entries(&[
                "https://github.com/rust-lang/rust",
                "https://docs.google.com/document/1",
                "https://github.com/yewstack/yew",
            ]),
            &engine(),
        );
        storage
    }

    #[test]
    fn test_storage_data_new() {
        let storage = StorageData::new();
        assert_eq!(storage.groups.len(), 0);
        assert_eq!(storage.sessions.len(), 0);
        assert_eq!(storage.total_tab_count(), 0);
    }

    #[test]
    fn test_save_tabs_groups_by_domain() {
        let storage = create_test_storage();

        assert_eq!(storage.groups.len(), 2);
        assert_eq!(storage.groups[0].domain, "github.com");
        assert_eq!(storage.groups[0].tabs.len(), 2);
        assert_eq!(storage.groups[0].tabs[1].url, "https://github.com/yewstack/yew");
        assert_eq!(storage.total_tab_count(), 3);
    }

    #[test]
    fn test_save_tabs_counts_duplicates() {
        let mut storage = create_test_storage();

        let result = storage.save_tabs(
            entries(&[
                "https://github.com/rust-lang/rust",
                "https://example.org",
                "https://example.org",
            ]),
            &engine(),
        );

        assert_eq!(result, SaveResult { saved: 1, duplicates: 2 });
        assert_eq!(storage.total_tab_count(), 4);
    }

    #[test]
    fn test_create_session_caps_and_orders() {
        let mut storage = StorageData::new();
        for count in 1..=4 {
            storage.create_session(count, vec!["g".to_string()], 3);
        }

        assert_eq!(storage.sessions.len(), 3);
        assert_eq!(storage.sessions[0].tab_count, 4);
        assert_eq!(storage.sessions[2].tab_count, 2);
    }

    #[test]
    fn test_remove_tab_keeps_empty_group() {
        let mut storage = create_test_storage();
        let group_id = storage.groups[1].id.clone();
        let tab_id = storage.groups[1].tabs[0].id.clone();

        assert!(storage.remove_tab(&group_id, &tab_id));
        assert_eq!(storage.groups.len(), 2);
        assert!(storage.groups[1].tabs.is_empty());
    }

    #[test]
    fn test_remove_nonexistent_tab() {
        let mut storage = create_test_storage();
        let group_id = storage.groups[0].id.clone();

        assert!(!storage.remove_tab(&group_id, "missing"));
        assert!(!storage.remove_tab("missing", "missing"));
        assert_eq!(storage.total_tab_count(), 3);
    }

    #[test]
    fn test_delete_group() {
        let mut storage = create_test_storage();
        let group_id = storage.groups[0].id.clone();

        assert!(storage.delete_group(&group_id));
        assert!(!storage.delete_group(&group_id));
        assert!(storage.group_by_id(&group_id).is_none());
        assert_eq!(storage.total_tab_count(), 1);
    }

    #[test]
    fn test_clear_keeps_settings() {
        let mut storage = create_test_storage();
        storage.settings.theme = crate::tab_data::Theme::Dark;
        storage.create_session(3, Vec::new(), 50);

        storage.clear();

        assert!(storage.groups.is_empty());
        assert!(storage.sessions.is_empty());
        assert_eq!(storage.settings.theme, crate::tab_data::Theme::Dark);
    }

    #[test]
    fn test_search_tabs() {
        let storage = create_test_storage();

        let hits = search_tabs(&storage.groups, "YEW");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].group_name, "GitHub");
        assert_eq!(hits[0].group_id, storage.groups[0].id);

        // Group name matches return every tab in the group
        assert_eq!(search_tabs(&storage.groups, "google docs").len(), 1);
        assert_eq!(search_tabs(&storage.groups, "github").len(), 2);
        assert!(search_tabs(&storage.groups, "   ").is_empty());
    }

    #[test]
    fn test_export_then_replace_import() {
        let storage = create_test_storage();
        let json = storage.export().unwrap();

        let mut restored = StorageData::new();
        restored.import(&json, ImportMode::Replace, 50).unwrap();

        assert_eq!(restored.groups, storage.groups);
    }

    #[test]
    fn test_merge_import_skips_known_urls() {
        let mut storage = create_test_storage();
        let mut other = StorageData::new();
        other.save_tabs(
            entries(&["https://github.com/rust-lang/rust", "https://github.com/tokio-rs/tokio", "https://example.org"]),
            &engine(),
        );
        let json = other.export().unwrap();

        storage.import(&json, ImportMode::Merge, 50).unwrap();

        assert_eq!(storage.groups.len(), 3);
        assert_eq!(storage.groups[0].tabs.len(), 3);
        assert_eq!(storage.total_tab_count(), 5);
        let domains: HashSet<&str> = storage.groups.iter().map(|g| g.domain.as_str()).collect();
        assert_eq!(domains.len(), storage.groups.len());
    }

    #[test]
    fn test_failed_import_leaves_state_untouched() {
        let mut storage = create_test_storage();
        let before = storage.clone();

        assert!(matches!(
            storage.import("{ not json", ImportMode::Replace, 50),
            Err(ImportError::Malformed(_))
        ));
        assert!(matches!(
            storage.import(r#"{"sessions": []}"#, ImportMode::Merge, 50),
            Err(ImportError::MissingGroups)
        ));

        let duplicate = r##"{"groups": [
            {"id": "a", "name": "A", "domain": "x.com", "color": "#000", "createdAt": 1, "tabs": []},
            {"id": "b", "name": "B", "domain": "x.com", "color": "#000", "createdAt": 1, "tabs": []}
        ]}"##;
        assert!(matches!(
            storage.import(duplicate, ImportMode::Replace, 50),
            Err(ImportError::DuplicateDomain(_))
        ));

        let empty_url = r##"{"groups": [
            {"id": "a", "name": "A", "domain": "x.com", "color": "#000", "createdAt": 1,
             "tabs": [{"id": "t", "url": "", "title": "", "savedAt": 1}]}
        ]}"##;
        assert!(matches!(
            storage.import(empty_url, ImportMode::Merge, 50),
            Err(ImportError::EmptyUrl(name)) if name == "A"
        ));

        assert_eq!(storage, before);
    }

    #[test]
    fn test_serialization() {
        let storage = create_test_storage();

        let json = serde_json::to_string(&storage).unwrap();
        let deserialized: StorageData = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, storage);
    }
}
