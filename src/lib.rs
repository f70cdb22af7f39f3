/// Tab Shelf - Chrome extension that shelves open tabs into domain groups
/// Built with Rust + WASM + Yew

pub mod browser;
pub mod chrome;
pub mod clock;
pub mod config;
pub mod error;
pub mod grouping;
pub mod operations;
pub mod orchestrator;
pub mod protocol;
pub mod storage;
pub mod store;
pub mod tab_data;
pub mod triggers;
pub mod ui;

use std::cell::RefCell;

use log::{error, info};
use wasm_bindgen::prelude::*;

use crate::chrome::{ChromeBadge, ChromeStore, ChromeTabs, from_js, to_js};
use crate::config::ShelfConfig;
use crate::error::ShelfError;
use crate::orchestrator::Shelver;
use crate::protocol::Response;
use crate::store::StorageChange;
use crate::tab_data::OpenTab;

pub use crate::error::{ImportError, Result};
pub use crate::grouping::GroupResolver;
pub use crate::storage::StorageData;
pub use crate::store::{MemoryStore, ShelfStore};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

thread_local! {
    static CONFIG: RefCell<ShelfConfig> = RefCell::new(ShelfConfig::default());
}

/// Configuration in effect for this JS context (defaults until `configure`)
pub fn current_config() -> ShelfConfig {
    CONFIG.with(|config| config.borrow().clone())
}

/// Parse, validate and install a JSON config. A rejected config leaves the
/// previous one in place.
pub fn install_config(json: &str) -> Result<()> {
    let config = ShelfConfig::from_json(json)?;
    info!(
        "Config installed: {} curated domains, {} max sessions",
        config.grouping.domain_map.len(),
        config.max_sessions
    );
    CONFIG.with(|current| *current.borrow_mut() = config);
    Ok(())
}

/// Called by every extension page with the packaged `shelf.config.json`
#[wasm_bindgen]
pub fn configure(json: &str) -> std::result::Result<(), JsValue> {
    install_config(json).map_err(to_js_error)
}

type BackgroundShelver = Shelver<ChromeStore, ChromeTabs, ChromeBadge>;

// Service workers may be torn down at any time; state lives in storage, so
// each event builds a fresh orchestrator.
fn background() -> BackgroundShelver {
    let config = current_config();
    Shelver::new(ChromeStore::new(config.max_sessions), ChromeTabs, ChromeBadge, config)
}

fn to_js_error(e: ShelfError) -> JsValue {
    error!("{}", e);
    JsValue::from_str(&e.to_string())
}

/// Entry point for `chrome.runtime.onMessage`
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> std::result::Result<JsValue, JsValue> {
    let response = match serde_wasm_bindgen::from_value::<serde_json::Value>(message) {
        Ok(value) => protocol::handle_message(&background(), value)
            .await
            .map_err(to_js_error)?,
        Err(_) => Response::unknown(),
    };
    to_js(&response).map_err(to_js_error)
}

/// Entry point for `chrome.storage.onChanged`; `keys` are the changed names
#[wasm_bindgen]
pub async fn storage_changed(keys: JsValue) -> std::result::Result<(), JsValue> {
    let names: Vec<String> = from_js(keys).map_err(to_js_error)?;
    let change = StorageChange::from_names(names.iter().map(String::as_str));
    background().on_storage_changed(&change).await.map_err(to_js_error)
}

#[wasm_bindgen]
pub async fn handle_context_menu(
    item_id: String,
    tab: JsValue,
    link_url: Option<String>,
) -> std::result::Result<(), JsValue> {
    let tab: Option<OpenTab> = if tab.is_null() || tab.is_undefined() {
        None
    } else {
        Some(from_js(tab).map_err(to_js_error)?)
    };

    let result = triggers::handle_menu_click(&background(), &item_id, tab, link_url.as_deref())
        .await
        .map_err(to_js_error)?;
    info!("Menu {}: {} shelved, {} duplicates", item_id, result.saved, result.duplicates);
    Ok(())
}

#[wasm_bindgen]
pub async fn handle_shortcut(name: String) -> std::result::Result<(), JsValue> {
    let result = triggers::handle_shortcut(&background(), &name)
        .await
        .map_err(to_js_error)?;
    info!("Shortcut {}: {} shelved, {} duplicates", name, result.saved, result.duplicates);
    Ok(())
}

/// Context-menu entries to register on install
#[wasm_bindgen]
pub fn menu_items() -> std::result::Result<JsValue, JsValue> {
    to_js(&triggers::menu_items()).map_err(to_js_error)
}

#[wasm_bindgen]
pub async fn on_installed() -> std::result::Result<(), JsValue> {
    let shelver = background();
    shelver.store().ensure_layout().await.map_err(to_js_error)?;
    shelver.initialize().await.map_err(to_js_error)
}

#[wasm_bindgen]
pub async fn refresh_badge() -> std::result::Result<(), JsValue> {
    background().refresh_badge().await.map_err(to_js_error)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the full-page shelf
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::dashboard::Dashboard>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_config_feeds_later_orchestrators() {
        install_config(r#"{"max_sessions": 7, "new_tab_url": "about:blank"}"#).unwrap();

        let config = current_config();
        assert_eq!(config.max_sessions, 7);
        assert_eq!(config.new_tab_url, "about:blank");
        assert!(config.grouping.domain_map.contains_key("github.com"));
    }

    #[test]
    fn test_rejected_config_keeps_previous() {
        install_config(r#"{"max_sessions": 12}"#).unwrap();

        assert!(matches!(
            install_config(r#"{"max_sessions": 0}"#),
            Err(ShelfError::Config(_))
        ));
        assert_eq!(current_config().max_sessions, 12);
    }
}
