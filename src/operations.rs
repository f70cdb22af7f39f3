/// Tab operations: filtering, normalizing and closure planning

use log::debug;

use crate::config::ShelfConfig;
use crate::tab_data::{NewEntry, OpenTab};

/// Keep only tabs that can be shelved (order preserved).
///
/// Dropped: pinned tabs, tabs without a URL, and browser-internal pages
/// matching one of the configured blocked prefixes.
pub fn filter_saveable(tabs: &[OpenTab], config: &ShelfConfig) -> Vec<OpenTab> {
    tabs.iter()
        .filter(|tab| {
            if tab.pinned {
                debug!("Skipping pinned tab {:?}", tab.id);
                return false;
            }
            match tab.url.as_deref() {
                None | Some("") => false,
                Some(url) if config.is_blocked(url) => {
                    debug!("Skipping blocked URL {}", url);
                    false
                }
                Some(_) => true,
            }
        })
        .cloned()
        .collect()
}

/// Normalize saveable tabs into entries for the store
pub fn to_entries(tabs: &[OpenTab]) -> Vec<NewEntry> {
    tabs.iter()
        .filter_map(|tab| {
            let url = tab.url.as_deref()?;
            Some(NewEntry::normalized(
                url,
                tab.title.as_deref(),
                tab.fav_icon_url.as_deref(),
            ))
        })
        .collect()
}

/// Handles of the tabs to close; tabs without a handle are skipped
pub fn closable_handles(tabs: &[OpenTab]) -> Vec<i32> {
    tabs.iter().filter_map(|tab| tab.id).collect()
}

/// Whether closing `closing` tabs out of `window_total` would empty the window
pub fn needs_placeholder(window_total: usize, closing: usize) -> bool {
    window_total <= closing
}
