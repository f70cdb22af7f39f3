/// Browser surfaces the orchestrator drives: tabs and the toolbar badge

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tab_data::OpenTab;

/// Filter for tab queries, mirroring `chrome.tabs.query`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
}

impl TabQuery {
    pub fn current_window() -> TabQuery {
        TabQuery {
            active: None,
            current_window: Some(true),
        }
    }

    pub fn active_in_current_window() -> TabQuery {
        TabQuery {
            active: Some(true),
            current_window: Some(true),
        }
    }
}

#[async_trait(?Send)]
pub trait TabControl {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<OpenTab>>;

    async fn create_tab(&self, url: &str) -> Result<()>;

    async fn remove_tabs(&self, handles: &[i32]) -> Result<()>;
}

#[async_trait(?Send)]
pub trait Badge {
    async fn set_text(&self, text: &str) -> Result<()>;

    async fn set_background_color(&self, color: &str) -> Result<()>;
}

/// Badge text for a shelved-tab count: blank when nothing is shelved
pub fn badge_text(count: usize) -> String {
    if count > 0 {
        count.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(0), "");
        assert_eq!(badge_text(1), "1");
        assert_eq!(badge_text(120), "120");
    }

    #[test]
    fn test_tab_query_serializes_like_chrome() {
        let json = serde_json::to_string(&TabQuery::active_in_current_window()).unwrap();
        assert_eq!(json, r#"{"active":true,"currentWindow":true}"#);

        let json = serde_json::to_string(&TabQuery::current_window()).unwrap();
        assert_eq!(json, r#"{"currentWindow":true}"#);
    }
}
