/// Save orchestrator: turns open tabs into shelved entries and back

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::browser::{badge_text, Badge, TabControl, TabQuery};
use crate::config::ShelfConfig;
use crate::error::Result;
use crate::grouping::GroupingEngine;
use crate::operations::{closable_handles, filter_saveable, needs_placeholder, to_entries};
use crate::store::{ShelfStore, StorageChange, StorageKey};
use crate::tab_data::{OpenTab, SaveResult, Session};

/// Counter summary shown by the popup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShelfStats {
    pub total_tabs: usize,
    pub last_session: Option<Session>,
}

pub struct Shelver<S, T, B> {
    store: S,
    tabs: T,
    badge: B,
    engine: GroupingEngine,
    config: ShelfConfig,
}

impl<S, T, B> Shelver<S, T, B>
where
    S: ShelfStore,
    T: TabControl,
    B: Badge,
{
    pub fn new(store: S, tabs: T, badge: B, config: ShelfConfig) -> Self {
        let engine = GroupingEngine::new(config.grouping.clone());
        Shelver {
            store,
            tabs,
            badge,
            engine,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    pub fn badge(&self) -> &B {
        &self.badge
    }

    /// Startup hook: bring the badge in line with whatever is stored
    pub async fn initialize(&self) -> Result<()> {
        self.refresh_badge().await
    }

    pub async fn save_all_open_tabs(&self) -> Result<SaveResult> {
        let tabs = self.tabs.query_tabs(TabQuery::current_window()).await?;
        self.save_and_close(tabs).await
    }

    /// Shelve the active tab; zero counts when the window has none
    pub async fn save_current_tab(&self) -> Result<SaveResult> {
        let mut active = self
            .tabs
            .query_tabs(TabQuery::active_in_current_window())
            .await?;
        if active.is_empty() {
            return Ok(SaveResult::default());
        }
        active.truncate(1);
        self.save_and_close(active).await
    }

    /// Shelve a link without closing anything
    pub async fn save_link(&self, url: &str, title: Option<&str>) -> Result<SaveResult> {
        let link = OpenTab {
            id: None,
            url: Some(url.to_string()),
            title: title.map(str::to_string),
            fav_icon_url: None,
            pinned: false,
        };
        let saveable = filter_saveable(&[link], &self.config);
        if saveable.is_empty() {
            return Ok(SaveResult::default());
        }

        let result = self.store.save_tabs(to_entries(&saveable), &self.engine).await?;
        self.refresh_badge().await?;
        Ok(result)
    }

    /// Shelve a batch of tabs and close them.
    ///
    /// Pinned, URL-less and browser-internal tabs are left alone. A session
    /// is recorded only when something new was saved. The window is never
    /// left empty: if every tab in it is about to close, a fresh tab is
    /// opened first.
    pub async fn save_and_close(&self, tabs: Vec<OpenTab>) -> Result<SaveResult> {
        let saveable = filter_saveable(&tabs, &self.config);
        if saveable.is_empty() {
            debug!("Nothing saveable among {} tabs", tabs.len());
            return Ok(SaveResult::default());
        }

        let result = self.store.save_tabs(to_entries(&saveable), &self.engine).await?;
        info!(
            "Shelved {} tabs ({} already shelved)",
            result.saved, result.duplicates
        );

        if result.saved > 0 {
            // Every current group, not only the ones this batch touched
            let group_ids = self
                .store
                .groups()
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            self.store.create_session(result.saved, group_ids).await?;
        }

        let handles = closable_handles(&saveable);
        if !handles.is_empty() {
            self.close_keeping_window_open(&handles).await?;
        }

        self.refresh_badge().await?;
        Ok(result)
    }

    async fn close_keeping_window_open(&self, handles: &[i32]) -> Result<()> {
        let window_total = self.tabs.query_tabs(TabQuery::current_window()).await?.len();
        if needs_placeholder(window_total, handles.len()) {
            debug!("Closing all {} tabs, opening a placeholder first", window_total);
            self.tabs.create_tab(&self.config.new_tab_url).await?;
        }
        self.tabs.remove_tabs(handles).await
    }

    pub async fn stats(&self) -> Result<ShelfStats> {
        let total_tabs = self.store.total_tab_count().await?;
        let last_session = self.store.sessions().await?.into_iter().next();
        Ok(ShelfStats {
            total_tabs,
            last_session,
        })
    }

    /// Reopen one shelved URL, optionally dropping its record afterwards.
    /// The record is only removed when both ids are known.
    pub async fn restore_tab(
        &self,
        url: Option<&str>,
        group_id: Option<&str>,
        tab_id: Option<&str>,
        remove_after_restore: bool,
    ) -> Result<()> {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.tabs.create_tab(url).await?;
        }

        if remove_after_restore {
            if let (Some(group_id), Some(tab_id)) = (group_id, tab_id) {
                self.store.remove_tab(group_id, tab_id).await?;
                self.refresh_badge().await?;
            }
        }
        Ok(())
    }

    /// Reopen every tab of a group in save order. A group that no longer
    /// exists is a no-op.
    pub async fn restore_group(&self, group_id: &str, remove_after_restore: bool) -> Result<()> {
        let Some(group) = self.store.group_by_id(group_id).await? else {
            debug!("Group {} is gone, nothing to restore", group_id);
            return Ok(());
        };

        for tab in &group.tabs {
            self.tabs.create_tab(&tab.url).await?;
        }
        info!("Restored {} tabs from '{}'", group.tabs.len(), group.name);

        if remove_after_restore {
            self.store.delete_group(group_id).await?;
            self.refresh_badge().await?;
        }
        Ok(())
    }

    /// Recompute the shelved-tab count and push it to the badge. Safe to
    /// call redundantly.
    pub async fn refresh_badge(&self) -> Result<()> {
        let count = self.store.total_tab_count().await?;
        self.badge.set_text(&badge_text(count)).await?;
        self.badge.set_background_color(&self.config.badge_color).await
    }

    /// React to a storage notification from any surface
    pub async fn on_storage_changed(&self, change: &StorageChange) -> Result<()> {
        if change.touches(StorageKey::Groups) {
            self.refresh_badge().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ShelfError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    /// One browser window: tabs in order, the first one active
    #[derive(Default)]
    pub(crate) struct MockTabs {
        pub(crate) window: RefCell<Vec<OpenTab>>,
        pub(crate) opened: RefCell<Vec<String>>,
        pub(crate) next_id: Cell<i32>,
        pub(crate) fail: Cell<bool>,
    }

    impl MockTabs {
        pub(crate) fn with_tabs(tabs: Vec<OpenTab>) -> MockTabs {
            let next_id = tabs.iter().filter_map(|t| t.id).max().unwrap_or(0) + 1;
            MockTabs {
                window: RefCell::new(tabs),
                next_id: Cell::new(next_id),
                ..MockTabs::default()
            }
        }

        pub(crate) fn urls(&self) -> Vec<String> {
            self.window
                .borrow()
                .iter()
                .filter_map(|t| t.url.clone())
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl TabControl for MockTabs {
        async fn query_tabs(&self, query: TabQuery) -> Result<Vec<OpenTab>> {
            if self.fail.get() {
                return Err(ShelfError::tabs("tab surface unavailable"));
            }
            let window = self.window.borrow();
            if query.active == Some(true) {
                return Ok(window.iter().take(1).cloned().collect());
            }
            Ok(window.clone())
        }

        async fn create_tab(&self, url: &str) -> Result<()> {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.window
                .borrow_mut()
                .push(OpenTab::new(id, url, url));
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }

        async fn remove_tabs(&self, handles: &[i32]) -> Result<()> {
            self.window
                .borrow_mut()
                .retain(|t| !t.id.is_some_and(|id| handles.contains(&id)));
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockBadge {
        pub(crate) text: RefCell<Option<String>>,
        pub(crate) color: RefCell<Option<String>>,
        pub(crate) updates: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl Badge for MockBadge {
        async fn set_text(&self, text: &str) -> Result<()> {
            *self.text.borrow_mut() = Some(text.to_string());
            self.updates.set(self.updates.get() + 1);
            Ok(())
        }

        async fn set_background_color(&self, color: &str) -> Result<()> {
            *self.color.borrow_mut() = Some(color.to_string());
            Ok(())
        }
    }

    pub(crate) type TestShelver = Shelver<MemoryStore, MockTabs, MockBadge>;

    pub(crate) fn shelver_with(tabs: Vec<OpenTab>) -> TestShelver {
        Shelver::new(
            MemoryStore::new(50),
            MockTabs::with_tabs(tabs),
            MockBadge::default(),
            ShelfConfig::default(),
        )
    }

    fn create_test_tab(id: i32, url: &str) -> OpenTab {
        OpenTab::new(id, url, "")
    }

    fn pinned(id: i32, url: &str) -> OpenTab {
        OpenTab {
            pinned: true,
            ..create_test_tab(id, url)
        }
    }

    #[test]
    fn test_save_all_keeps_window_open() {
        let shelver = shelver_with(vec![
            create_test_tab(1, "https://github.com/a"),
            create_test_tab(2, "https://docs.google.com/document/1"),
            create_test_tab(3, "https://my-cool-blog.dev/post"),
        ]);

        let result = block_on(shelver.save_all_open_tabs()).unwrap();

        assert_eq!(result, SaveResult { saved: 3, duplicates: 0 });
        assert_eq!(shelver.tabs().urls(), vec!["chrome://newtab".to_string()]);
        assert_eq!(shelver.badge().text.borrow().as_deref(), Some("3"));
        assert_eq!(shelver.badge().color.borrow().as_deref(), Some("#6366F1"));
    }

    #[test]
    fn test_no_placeholder_when_tabs_remain() {
        let shelver = shelver_with(vec![
            pinned(1, "https://mail.google.com"),
            create_test_tab(2, "chrome://extensions"),
            create_test_tab(3, "https://example.org"),
        ]);

        let result = block_on(shelver.save_all_open_tabs()).unwrap();

        assert_eq!(result.saved, 1);
        assert!(shelver.tabs().opened.borrow().is_empty());
        assert_eq!(
            shelver.tabs().urls(),
            vec!["https://mail.google.com".to_string(), "chrome://extensions".to_string()]
        );
        let stored = shelver.store().snapshot();
        assert_eq!(stored.total_tab_count(), 1);
        assert_eq!(stored.groups[0].tabs[0].url, "https://example.org");
    }

    #[test]
    fn test_nothing_saveable_is_a_no_op() {
        let shelver = shelver_with(vec![
            pinned(1, "https://github.com"),
            create_test_tab(2, "about:blank"),
        ]);

        let result = block_on(shelver.save_all_open_tabs()).unwrap();

        assert_eq!(result, SaveResult::default());
        assert!(shelver.store().snapshot().sessions.is_empty());
        assert_eq!(shelver.tabs().window.borrow().len(), 2);
        assert_eq!(shelver.badge().updates.get(), 0);
    }

    #[test]
    fn test_session_records_all_current_groups() {
        let shelver = shelver_with(vec![create_test_tab(1, "https://github.com/a")]);
        block_on(shelver.save_all_open_tabs()).unwrap();

        shelver
            .tabs()
            .window
            .borrow_mut()
            .insert(0, create_test_tab(5, "https://example.org"));
        block_on(shelver.save_current_tab()).unwrap();

        let stored = shelver.store().snapshot();
        assert_eq!(stored.sessions.len(), 2);
        assert_eq!(stored.sessions[0].tab_count, 1);
        let all_ids: Vec<String> = stored.groups.iter().map(|g| g.id.clone()).collect();
        assert_eq!(stored.sessions[0].group_ids, all_ids);
        assert_eq!(all_ids.len(), 2);
    }

    #[test]
    fn test_duplicates_close_but_record_no_session() {
        let shelver = shelver_with(vec![
            create_test_tab(1, "https://github.com/a"),
            create_test_tab(2, "https://example.org"),
        ]);
        block_on(shelver.save_link("https://github.com/a", None)).unwrap();

        let result = block_on(shelver.save_and_close(vec![create_test_tab(1, "https://github.com/a")])).unwrap();

        assert_eq!(result, SaveResult { saved: 0, duplicates: 1 });
        assert!(shelver.store().snapshot().sessions.is_empty());
        assert_eq!(shelver.tabs().urls(), vec!["https://example.org".to_string()]);
    }

    #[test]
    fn test_save_current_tab_without_active_tab() {
        let shelver = shelver_with(Vec::new());

        let result = block_on(shelver.save_current_tab()).unwrap();

        assert_eq!(result, SaveResult::default());
    }

    #[test]
    fn test_save_link_closes_nothing() {
        let shelver = shelver_with(vec![create_test_tab(1, "https://example.org")]);

        let result = block_on(shelver.save_link("https://rust-lang.org/learn", Some("Learn Rust"))).unwrap();

        assert_eq!(result.saved, 1);
        assert_eq!(shelver.tabs().window.borrow().len(), 1);
        let stored = shelver.store().snapshot();
        assert_eq!(stored.groups[0].name, "Rust Lang");
        assert_eq!(stored.groups[0].tabs[0].title, "Learn Rust");
        assert!(stored.sessions.is_empty());
        assert_eq!(shelver.badge().text.borrow().as_deref(), Some("1"));
    }

    #[test]
    fn test_stats() {
        let shelver = shelver_with(vec![
            create_test_tab(1, "https://github.com/a"),
            create_test_tab(2, "https://github.com/b"),
        ]);

        let empty = block_on(shelver.stats()).unwrap();
        assert_eq!(empty, ShelfStats::default());

        block_on(shelver.save_all_open_tabs()).unwrap();
        let stats = block_on(shelver.stats()).unwrap();
        assert_eq!(stats.total_tabs, 2);
        assert_eq!(stats.last_session.map(|s| s.tab_count), Some(2));
    }

    #[test]
    fn test_restore_group_in_save_order_and_delete() {
        let shelver = shelver_with(vec![
            create_test_tab(1, "https://github.com/a"),
            create_test_tab(2, "https://github.com/b"),
            create_test_tab(3, "https://github.com/c"),
        ]);
        block_on(shelver.save_all_open_tabs()).unwrap();
        let group_id = shelver.store().snapshot().groups[0].id.clone();
        shelver.tabs().opened.borrow_mut().clear();

        block_on(shelver.restore_group(&group_id, true)).unwrap();

        assert_eq!(
            *shelver.tabs().opened.borrow(),
            vec![
                "https://github.com/a".to_string(),
                "https://github.com/b".to_string(),
                "https://github.com/c".to_string(),
            ]
        );
        assert!(shelver.store().snapshot().groups.is_empty());
        assert_eq!(shelver.badge().text.borrow().as_deref(), Some(""));
    }

    #[test]
    fn test_restore_missing_group_is_a_no_op() {
        let shelver = shelver_with(Vec::new());

        block_on(shelver.restore_group("no-such-group", true)).unwrap();

        assert!(shelver.tabs().opened.borrow().is_empty());
    }

    #[test]
    fn test_restore_tab_removes_record_when_asked() {
        let shelver = shelver_with(vec![create_test_tab(9, "https://example.org")]);
        block_on(shelver.save_link("https://github.com/a", None)).unwrap();
        let stored = shelver.store().snapshot();
        let group_id = stored.groups[0].id.clone();
        let tab_id = stored.groups[0].tabs[0].id.clone();

        block_on(shelver.restore_tab(Some("https://github.com/a"), Some(&group_id), None, true)).unwrap();
        assert_eq!(shelver.store().snapshot().total_tab_count(), 1);

        block_on(shelver.restore_tab(Some("https://github.com/a"), Some(&group_id), Some(&tab_id), true)).unwrap();
        assert_eq!(shelver.store().snapshot().total_tab_count(), 0);
        assert_eq!(shelver.store().snapshot().groups.len(), 1);
        assert_eq!(shelver.tabs().opened.borrow().len(), 2);
    }

    #[test]
    fn test_tab_failures_propagate() {
        let shelver = shelver_with(vec![create_test_tab(1, "https://github.com/a")]);
        shelver.tabs().fail.set(true);

        let result = block_on(shelver.save_all_open_tabs());

        assert!(matches!(result, Err(ShelfError::Tabs(_))));
    }

    #[test]
    fn test_badge_follows_changes_from_other_surfaces() {
        let store = MemoryStore::new(50);
        let mut changes = store.subscribe();
        let shelver = Shelver::new(
            store,
            MockTabs::with_tabs(vec![create_test_tab(1, "https://github.com/a")]),
            MockBadge::default(),
            ShelfConfig::default(),
        );
        block_on(shelver.save_link("https://example.org", None)).unwrap();
        assert_eq!(shelver.badge().text.borrow().as_deref(), Some("1"));

        // Another surface deletes the group straight through the store
        let group_id = shelver.store().snapshot().groups[0].id.clone();
        block_on(shelver.store().delete_group(&group_id)).unwrap();
        while let Ok(change) = changes.try_recv() {
            block_on(shelver.on_storage_changed(&change)).unwrap();
        }

        assert_eq!(shelver.badge().text.borrow().as_deref(), Some(""));
    }

    #[test]
    fn test_non_group_changes_leave_badge_alone() {
        let shelver = shelver_with(Vec::new());

        block_on(shelver.on_storage_changed(&StorageChange::new(&[StorageKey::Settings]))).unwrap();

        assert_eq!(shelver.badge().updates.get(), 0);
    }
}
