/// Context-menu and keyboard-shortcut entry points
use log::debug;
use serde::Serialize;

use crate::browser::{Badge, TabControl};
use crate::error::Result;
use crate::orchestrator::Shelver;
use crate::store::ShelfStore;
use crate::tab_data::{OpenTab, SaveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SaveTab,
    SaveAll,
    SaveLink,
}

/// A context-menu entry as handed to `chrome.contextMenus.create`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuItem {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: Vec<&'static str>,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] = [MenuAction::SaveTab, MenuAction::SaveAll, MenuAction::SaveLink];

    pub fn id(self) -> &'static str {
        match self {
            MenuAction::SaveTab => "shelve-save-tab",
            MenuAction::SaveAll => "shelve-save-all",
            MenuAction::SaveLink => "shelve-save-link",
        }
    }

    pub fn from_id(id: &str) -> Option<MenuAction> {
        MenuAction::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn item(self) -> MenuItem {
        let (title, context) = match self {
            MenuAction::SaveTab => ("Shelve this tab", "page"),
            MenuAction::SaveAll => ("Shelve all tabs in this window", "page"),
            MenuAction::SaveLink => ("Shelve this link", "link"),
        };
        MenuItem {
            id: self.id(),
            title,
            contexts: vec![context],
        }
    }
}

pub fn menu_items() -> Vec<MenuItem> {
    MenuAction::ALL.into_iter().map(MenuAction::item).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    SaveAllTabs,
    SaveCurrentTab,
}

impl Shortcut {
    pub fn from_name(name: &str) -> Option<Shortcut> {
        match name {
            "save-all-tabs" => Some(Shortcut::SaveAllTabs),
            "save-current-tab" => Some(Shortcut::SaveCurrentTab),
            _ => None,
        }
    }
}

/// Handle a context-menu click. `tab` is the page the menu was opened on;
/// `link_url` is set for link contexts.
pub async fn handle_menu_click<S, T, B>(
    shelver: &Shelver<S, T, B>,
    item_id: &str,
    tab: Option<OpenTab>,
    link_url: Option<&str>,
) -> Result<SaveResult>
where
    S: ShelfStore,
    T: TabControl,
    B: Badge,
{
    match MenuAction::from_id(item_id) {
        Some(MenuAction::SaveTab) => match tab {
            Some(tab) => shelver.save_and_close(vec![tab]).await,
            None => Ok(SaveResult::default()),
        },
        Some(MenuAction::SaveAll) => shelver.save_all_open_tabs().await,
        Some(MenuAction::SaveLink) => match link_url.filter(|u| !u.is_empty()) {
            Some(url) => shelver.save_link(url, Some(url)).await,
            None => Ok(SaveResult::default()),
        },
        None => {
            debug!("Ignoring menu item {}", item_id);
            Ok(SaveResult::default())
        }
    }
}

pub async fn handle_shortcut<S, T, B>(shelver: &Shelver<S, T, B>, name: &str) -> Result<SaveResult>
where
    S: ShelfStore,
    T: TabControl,
    B: Badge,
{
    match Shortcut::from_name(name) {
        Some(Shortcut::SaveAllTabs) => shelver.save_all_open_tabs().await,
        Some(Shortcut::SaveCurrentTab) => shelver.save_current_tab().await,
        None => {
            debug!("Ignoring command {}", name);
            Ok(SaveResult::default())
        }
    }
}
