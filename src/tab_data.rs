/// Data structures for Tab Shelf
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::now_millis;

/// An open browser tab as reported by the tab surface.
///
/// Every field may be missing: the browser omits `url` for tabs the
/// extension has no permission to read, and link-only saves have no tab
/// handle at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenTab {
    pub id: Option<i32>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub fav_icon_url: Option<String>,
    pub pinned: bool,
}

impl OpenTab {
    pub fn new(id: i32, url: &str, title: &str) -> OpenTab {
        OpenTab {
            id: Some(id),
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            fav_icon_url: None,
            pinned: false,
        }
    }
}

/// A tab normalized for persistence but not yet assigned an id or group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub url: String,
    pub title: String,
    pub fav_icon_url: String,
}

impl NewEntry {
    /// Normalize raw tab fields: an empty title falls back to the URL and a
    /// missing favicon becomes the empty string.
    pub fn normalized(url: &str, title: Option<&str>, fav_icon_url: Option<&str>) -> NewEntry {
        let title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => url.to_string(),
        };

        NewEntry {
            url: url.to_string(),
            title,
            fav_icon_url: fav_icon_url.unwrap_or_default().to_string(),
        }
    }
}

/// A shelved tab, owned by its group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: String,
    pub saved_at: i64,
}

impl TabEntry {
    pub fn from_new(entry: NewEntry) -> TabEntry {
        TabEntry {
            id: Uuid::new_v4().to_string(),
            url: entry.url,
            title: entry.title,
            fav_icon_url: entry.fav_icon_url,
            saved_at: now_millis(),
        }
    }
}

/// A named, colored bucket of shelved tabs keyed by domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub color: String,
    pub created_at: i64,
    #[serde(default)]
    pub is_auto_generated: bool,
    #[serde(default)]
    pub tabs: Vec<TabEntry>,
}

impl Group {
    /// Most recent activity: the newest tab's save time, or creation time
    /// for an empty group.
    pub fn latest_activity(&self) -> i64 {
        self.tabs
            .iter()
            .map(|t| t.saved_at)
            .max()
            .unwrap_or(self.created_at)
    }
}

/// Audit record of one shelving operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub saved_at: i64,
    pub tab_count: usize,
    #[serde(default)]
    pub group_ids: Vec<String>,
}

impl Session {
    pub fn new(tab_count: usize, group_ids: Vec<String>) -> Session {
        Session {
            id: Uuid::new_v4().to_string(),
            saved_at: now_millis(),
            tab_count,
            group_ids,
        }
    }
}

/// Outcome of a save request as reported by the store
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveResult {
    pub saved: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
}

/// A search match, annotated with the group it was found in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub tab: TabEntry,
    pub group_id: String,
    pub group_name: String,
}
