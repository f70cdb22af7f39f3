/// Extension API bindings: store, tabs and badge backed by `chrome.*`

use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::browser::{Badge, TabControl, TabQuery};
use crate::error::{Result, ShelfError};
use crate::grouping::GroupResolver;
use crate::protocol::{Command, Response};
use crate::storage::{ImportMode, StorageData};
use crate::store::{ShelfStore, StorageChange, StorageKey};
use crate::tab_data::{Group, NewEntry, OpenTab, SaveResult, Session, Settings};

// Import JS bridge functions
#[wasm_bindgen(module = "/js/chrome_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = queryTabs)]
    async fn query_tabs_js(query: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = createTab)]
    async fn create_tab_js(url: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = removeTabs)]
    async fn remove_tabs_js(tab_ids: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setBadgeText)]
    async fn set_badge_text_js(text: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setBadgeBackgroundColor)]
    async fn set_badge_color_js(color: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = getStorage)]
    async fn get_storage_js(keys: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setStorage)]
    async fn set_storage_js(items: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = sendMessage)]
    async fn send_message_js(message: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = onStorageChanged)]
    fn on_storage_changed_js(callback: &js_sys::Function);

    #[wasm_bindgen(catch, js_name = openDashboard)]
    async fn open_dashboard_js() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = closePopup)]
    pub fn close_popup();

    #[wasm_bindgen(js_name = confirmAction)]
    pub fn confirm_action(message: &str) -> bool;

    #[wasm_bindgen(js_name = downloadText)]
    pub fn download_text(data: &str, filename: &str);

    #[wasm_bindgen(catch, js_name = pickTextFile)]
    async fn pick_text_file_js() -> std::result::Result<JsValue, JsValue>;
}

const ALL_KEYS: [StorageKey; 3] = [StorageKey::Groups, StorageKey::Sessions, StorageKey::Settings];

/// Serialize into plain JS objects (not `Map`s) so the extension APIs accept them
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ShelfError::store(format!("Failed to serialize: {:?}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ShelfError::store(format!("Failed to parse: {:?}", e)))
}

fn js_error(context: &str, e: JsValue) -> String {
    format!("{}: {:?}", context, e)
}

/// Store over `chrome.storage.local`: every operation loads the layout,
/// applies the change, and writes back only the keys it touched.
pub struct ChromeStore {
    max_sessions: usize,
}

impl ChromeStore {
    pub fn new(max_sessions: usize) -> ChromeStore {
        ChromeStore { max_sessions }
    }

    pub async fn load(&self) -> Result<StorageData> {
        let keys = to_js(&ALL_KEYS.map(StorageKey::name))?;
        let data_js = get_storage_js(keys)
            .await
            .map_err(|e| ShelfError::store(js_error("Failed to get storage", e)))?;

        if data_js.is_null() || data_js.is_undefined() {
            return Ok(StorageData::new());
        }
        from_js(data_js)
    }

    async fn persist(&self, data: &StorageData, keys: &[StorageKey]) -> Result<()> {
        let mut items = serde_json::Map::new();
        for key in keys {
            let value = match key {
                StorageKey::Groups => serde_json::to_value(&data.groups)?,
                StorageKey::Sessions => serde_json::to_value(&data.sessions)?,
                StorageKey::Settings => serde_json::to_value(&data.settings)?,
            };
            items.insert(key.name().to_string(), value);
        }

        set_storage_js(to_js(&items)?)
            .await
            .map_err(|e| ShelfError::store(js_error("Failed to save storage", e)))?;
        Ok(())
    }

    /// Write the empty layout on first install
    pub async fn ensure_layout(&self) -> Result<()> {
        let keys = to_js(&[StorageKey::Groups.name()])?;
        let existing = get_storage_js(keys)
            .await
            .map_err(|e| ShelfError::store(js_error("Failed to get storage", e)))?;
        let has_groups = !existing.is_undefined()
            && js_sys::Reflect::get(&existing, &JsValue::from_str(StorageKey::Groups.name()))
                .map(|v| !v.is_undefined())
                .unwrap_or(false);

        if !has_groups {
            info!("Initializing empty shelf");
            self.persist(&StorageData::new(), &ALL_KEYS).await?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl ShelfStore for ChromeStore {
    async fn save_tabs(&self, entries: Vec<NewEntry>, resolver: &dyn GroupResolver) -> Result<SaveResult> {
        let mut data = self.load().await?;
        let result = data.save_tabs(entries, resolver);
        if result.saved > 0 {
            self.persist(&data, &[StorageKey::Groups]).await?;
        }
        Ok(result)
    }

    async fn groups(&self) -> Result<Vec<Group>> {
        Ok(self.load().await?.groups)
    }

    async fn group_by_id(&self, group_id: &str) -> Result<Option<Group>> {
        Ok(self.load().await?.group_by_id(group_id).cloned())
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.load().await?.sessions)
    }

    async fn create_session(&self, tab_count: usize, group_ids: Vec<String>) -> Result<()> {
        let mut data = self.load().await?;
        data.create_session(tab_count, group_ids, self.max_sessions);
        self.persist(&data, &[StorageKey::Sessions]).await
    }

    async fn remove_tab(&self, group_id: &str, tab_id: &str) -> Result<()> {
        let mut data = self.load().await?;
        if data.remove_tab(group_id, tab_id) {
            self.persist(&data, &[StorageKey::Groups]).await?;
        }
        Ok(())
    }

    async fn delete_group(&self, group_id: &str) -> Result<()> {
        let mut data = self.load().await?;
        if data.delete_group(group_id) {
            self.persist(&data, &[StorageKey::Groups]).await?;
        }
        Ok(())
    }

    async fn total_tab_count(&self) -> Result<usize> {
        Ok(self.load().await?.total_tab_count())
    }

    async fn export_data(&self) -> Result<String> {
        self.load().await?.export()
    }

    async fn import_data(&self, text: &str, mode: ImportMode) -> Result<()> {
        let mut data = self.load().await?;
        data.import(text, mode, self.max_sessions)?;
        self.persist(&data, &ALL_KEYS).await
    }

    async fn settings(&self) -> Result<Settings> {
        Ok(self.load().await?.settings)
    }

    async fn set_settings(&self, settings: Settings) -> Result<()> {
        let data = StorageData {
            settings,
            ..StorageData::new()
        };
        self.persist(&data, &[StorageKey::Settings]).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.persist(&StorageData::new(), &[StorageKey::Groups, StorageKey::Sessions])
            .await
    }
}

pub struct ChromeTabs;

#[async_trait(?Send)]
impl TabControl for ChromeTabs {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<OpenTab>> {
        let tabs_js = query_tabs_js(to_js(&query)?)
            .await
            .map_err(|e| ShelfError::tabs(js_error("Failed to get tabs", e)))?;
        from_js(tabs_js)
    }

    async fn create_tab(&self, url: &str) -> Result<()> {
        debug!("Opening {}", url);
        create_tab_js(url)
            .await
            .map_err(|e| ShelfError::tabs(js_error("Failed to open tab", e)))?;
        Ok(())
    }

    async fn remove_tabs(&self, handles: &[i32]) -> Result<()> {
        remove_tabs_js(to_js(handles)?)
            .await
            .map_err(|e| ShelfError::tabs(js_error("Failed to close tabs", e)))?;
        Ok(())
    }
}

pub struct ChromeBadge;

#[async_trait(?Send)]
impl Badge for ChromeBadge {
    async fn set_text(&self, text: &str) -> Result<()> {
        set_badge_text_js(text)
            .await
            .map_err(|e| ShelfError::badge(js_error("Failed to set badge text", e)))?;
        Ok(())
    }

    async fn set_background_color(&self, color: &str) -> Result<()> {
        set_badge_color_js(color)
            .await
            .map_err(|e| ShelfError::badge(js_error("Failed to set badge color", e)))?;
        Ok(())
    }
}

/// Send a command to the background worker and decode its reply
pub async fn send_command(command: &Command) -> Result<Response> {
    let reply = send_message_js(to_js(command)?)
        .await
        .map_err(|e| ShelfError::store(js_error("Message failed", e)))?;
    from_js(reply)
}

/// Register for storage notifications. The listener lives as long as the
/// page does.
pub fn subscribe_storage(callback: impl Fn(StorageChange) + 'static) {
    let closure = Closure::wrap(Box::new(move |keys: JsValue| {
        let names: Vec<String> = serde_wasm_bindgen::from_value(keys).unwrap_or_default();
        callback(StorageChange::from_names(names.iter().map(String::as_str)));
    }) as Box<dyn Fn(JsValue)>);

    on_storage_changed_js(closure.as_ref().unchecked_ref());
    closure.forget();
}

pub async fn open_dashboard() -> Result<()> {
    open_dashboard_js()
        .await
        .map_err(|e| ShelfError::tabs(js_error("Failed to open dashboard", e)))?;
    Ok(())
}

/// Text of a file chosen by the user, `None` when the picker was dismissed
pub async fn pick_text_file() -> Result<Option<String>> {
    let text = pick_text_file_js()
        .await
        .map_err(|e| ShelfError::store(js_error("Failed to read file", e)))?;
    Ok(text.as_string())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_tab_query_crosses_the_boundary_as_plain_object() {
        let js = to_js(&TabQuery::active_in_current_window()).unwrap();
        assert!(js.is_object());
        let active = js_sys::Reflect::get(&js, &JsValue::from_str("active")).unwrap();
        assert_eq!(active.as_bool(), Some(true));

        let back: TabQuery = from_js(js).unwrap();
        assert_eq!(back, TabQuery::active_in_current_window());
    }

    #[wasm_bindgen_test]
    fn test_open_tab_from_chrome_shape() {
        let raw = serde_json::json!({"id": 4, "url": "https://example.org", "favIconUrl": null, "index": 0});
        let tab: OpenTab = from_js(to_js(&raw).unwrap()).unwrap();
        assert_eq!(tab.id, Some(4));
        assert_eq!(tab.url.as_deref(), Some("https://example.org"));
        assert_eq!(tab.fav_icon_url, None);
    }
}
