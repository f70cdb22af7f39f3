/// Store contract consumed by the orchestrator, plus an in-memory store

use std::cell::RefCell;

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::Result;
use crate::grouping::GroupResolver;
use crate::storage::{search_tabs, ImportMode, StorageData};
use crate::tab_data::{Group, NewEntry, SaveResult, SearchHit, Session, Settings};

/// Top-level persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Groups,
    Sessions,
    Settings,
}

impl StorageKey {
    pub fn name(self) -> &'static str {
        match self {
            StorageKey::Groups => "groups",
            StorageKey::Sessions => "sessions",
            StorageKey::Settings => "settings",
        }
    }

    pub fn from_name(name: &str) -> Option<StorageKey> {
        match name {
            "groups" => Some(StorageKey::Groups),
            "sessions" => Some(StorageKey::Sessions),
            "settings" => Some(StorageKey::Settings),
            _ => None,
        }
    }
}

/// Notification that one or more persisted collections changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub keys: Vec<StorageKey>,
}

impl StorageChange {
    pub fn new(keys: &[StorageKey]) -> StorageChange {
        StorageChange { keys: keys.to_vec() }
    }

    /// Build from raw key names as reported by the browser; unknown names
    /// are ignored.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> StorageChange {
        StorageChange {
            keys: names.into_iter().filter_map(StorageKey::from_name).collect(),
        }
    }

    pub fn touches(&self, key: StorageKey) -> bool {
        self.keys.contains(&key)
    }
}

/// Persisted shelf. Duplicate detection, session capping and durability
/// are the implementation's business; callers trust the counts it returns.
#[async_trait(?Send)]
pub trait ShelfStore {
    async fn save_tabs(&self, entries: Vec<NewEntry>, resolver: &dyn GroupResolver) -> Result<SaveResult>;

    async fn groups(&self) -> Result<Vec<Group>>;

    async fn group_by_id(&self, group_id: &str) -> Result<Option<Group>>;

    /// Most recent first
    async fn sessions(&self) -> Result<Vec<Session>>;

    async fn create_session(&self, tab_count: usize, group_ids: Vec<String>) -> Result<()>;

    async fn remove_tab(&self, group_id: &str, tab_id: &str) -> Result<()>;

    async fn delete_group(&self, group_id: &str) -> Result<()>;

    async fn total_tab_count(&self) -> Result<usize>;

    async fn search_tabs(&self, query: &str) -> Result<Vec<SearchHit>> {
        let groups = self.groups().await?;
        Ok(search_tabs(&groups, query))
    }

    async fn export_data(&self) -> Result<String>;

    /// All-or-nothing: a rejected payload leaves the store unchanged
    async fn import_data(&self, text: &str, mode: ImportMode) -> Result<()>;

    async fn settings(&self) -> Result<Settings>;

    async fn set_settings(&self, settings: Settings) -> Result<()>;

    async fn clear_all(&self) -> Result<()>;
}

/// Single-threaded in-memory store that publishes a [`StorageChange`] to
/// every subscriber after each effective mutation.
pub struct MemoryStore {
    data: RefCell<StorageData>,
    max_sessions: usize,
    subscribers: RefCell<Vec<UnboundedSender<StorageChange>>>,
}

impl MemoryStore {
    pub fn new(max_sessions: usize) -> MemoryStore {
        MemoryStore {
            data: RefCell::new(StorageData::new()),
            max_sessions,
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn snapshot(&self) -> StorageData {
        self.data.borrow().clone()
    }

    fn notify_if(&self, changed: bool, keys: &[StorageKey]) {
        if !changed {
            return;
        }
        let change = StorageChange::new(keys);
        // Dropped receivers are pruned
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(change.clone()).is_ok());
    }
}

#[async_trait(?Send)]
impl ShelfStore for MemoryStore {
    async fn save_tabs(&self, entries: Vec<NewEntry>, resolver: &dyn GroupResolver) -> Result<SaveResult> {
        let result = self.data.borrow_mut().save_tabs(entries, resolver);
        self.notify_if(result.saved > 0, &[StorageKey::Groups]);
        Ok(result)
    }

    async fn groups(&self) -> Result<Vec<Group>> {
        Ok(self.data.borrow().groups.clone())
    }

    async fn group_by_id(&self, group_id: &str) -> Result<Option<Group>> {
        Ok(self.data.borrow().group_by_id(group_id).cloned())
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.data.borrow().sessions.clone())
    }

    async fn create_session(&self, tab_count: usize, group_ids: Vec<String>) -> Result<()> {
        self.data
            .borrow_mut()
            .create_session(tab_count, group_ids, self.max_sessions);
        self.notify_if(true, &[StorageKey::Sessions]);
        Ok(())
    }

    async fn remove_tab(&self, group_id: &str, tab_id: &str) -> Result<()> {
        let removed = self.data.borrow_mut().remove_tab(group_id, tab_id);
        self.notify_if(removed, &[StorageKey::Groups]);
        Ok(())
    }

    async fn delete_group(&self, group_id: &str) -> Result<()> {
        let deleted = self.data.borrow_mut().delete_group(group_id);
        self.notify_if(deleted, &[StorageKey::Groups]);
        Ok(())
    }

    async fn total_tab_count(&self) -> Result<usize> {
        Ok(self.data.borrow().total_tab_count())
    }

    async fn export_data(&self) -> Result<String> {
        self.data.borrow().export()
    }

    async fn import_data(&self, text: &str, mode: ImportMode) -> Result<()> {
        self.data.borrow_mut().import(text, mode, self.max_sessions)?;
        self.notify_if(
            true,
            &[StorageKey::Groups, StorageKey::Sessions, StorageKey::Settings],
        );
        Ok(())
    }

    async fn settings(&self) -> Result<Settings> {
        Ok(self.data.borrow().settings.clone())
    }

    async fn set_settings(&self, settings: Settings) -> Result<()> {
        self.data.borrow_mut().settings = settings;
        self.notify_if(true, &[StorageKey::Settings]);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.data.borrow_mut().clear();
        self.notify_if(true, &[StorageKey::Groups, StorageKey::Sessions]);
        Ok(())
    }
}
