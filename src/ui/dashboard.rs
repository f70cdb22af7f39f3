/// Full-page shelf viewer

use log::warn;
use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement, KeyboardEvent};
use yew::prelude::*;

use crate::chrome::{confirm_action, download_text, pick_text_file, send_command, subscribe_storage, ChromeStore};
use crate::clock::now_millis;
use crate::current_config;
use crate::protocol::Command;
use crate::storage::{search_tabs, ImportMode, StorageData};
use crate::store::ShelfStore;
use crate::tab_data::{Group, Settings, Theme};
use crate::ui::components::{use_toast, GroupCard, TabRow, TabTarget, Toast, DASHBOARD_TOAST_DURATION};
use crate::ui::format::{format_date, format_date_time, plural, save_all_message, sort_groups_by_activity};

#[derive(Clone, Copy, PartialEq)]
enum View {
    Tabs,
    Sessions,
    Settings,
}

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Error(String),
}

/// What a keypress does to the search box
#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchKey {
    Focus,
    Clear,
}

/// `/` jumps into the search box from anywhere else; Escape inside it
/// leaves and clears the query.
fn search_key_action(key: &str, search_focused: bool) -> Option<SearchKey> {
    match key {
        "/" if !search_focused => Some(SearchKey::Focus),
        "Escape" if search_focused => Some(SearchKey::Clear),
        _ => None,
    }
}

fn store() -> ChromeStore {
    ChromeStore::new(current_config().max_sessions)
}

/// Reload everything from storage into `data`
fn reload(data: UseStateHandle<StorageData>, state: UseStateHandle<ViewState>) {
    spawn_local(async move {
        match store().load().await {
            Ok(loaded) => {
                data.set(loaded);
                state.set(ViewState::Idle);
            }
            Err(e) => state.set(ViewState::Error(format!("Failed to load: {}", e))),
        }
    });
}

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let state = use_state(|| ViewState::Loading);
    let data = use_state(StorageData::new);
    let view = use_state(|| View::Tabs);
    let search_query = use_state(String::new);
    let toast = use_toast(DASHBOARD_TOAST_DURATION);

    // Load on mount, then follow every storage change from any surface
    {
        let data = data.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            reload(data.clone(), state.clone());
            subscribe_storage(move |_change| reload(data.clone(), state.clone()));
            || ()
        });
    }

    let search_ref = use_node_ref();

    {
        let search_ref = search_ref.clone();
        let search_query = search_query.clone();
        use_effect_with((), move |_| {
            let listener = Closure::<dyn Fn(KeyboardEvent)>::new(move |e: KeyboardEvent| {
                let Some(input) = search_ref.cast::<HtmlInputElement>() else {
                    return;
                };
                let focused = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.active_element())
                    .is_some_and(|active| input.is_same_node(Some(active.as_ref())));

                match search_key_action(&e.key(), focused) {
                    Some(SearchKey::Focus) => {
                        e.prevent_default();
                        if let Err(err) = input.focus() {
                            warn!("Failed to focus search: {:?}", err);
                        }
                    }
                    Some(SearchKey::Clear) => {
                        if let Err(err) = input.blur() {
                            warn!("Failed to blur search: {:?}", err);
                        }
                        search_query.set(String::new());
                    }
                    None => {}
                }
            });

            let document = web_sys::window().and_then(|w| w.document());
            if let Some(document) = &document {
                if let Err(err) =
                    document.add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())
                {
                    warn!("Failed to register search shortcuts: {:?}", err);
                }
            }

            move || {
                if let Some(document) = document {
                    let _ = document
                        .remove_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref());
                }
            }
        });
    }

    let on_search_input = {
        let search_query = search_query.clone();
        let view = view.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                let query = input.value().trim().to_string();
                if !query.is_empty() && *view != View::Tabs {
                    view.set(View::Tabs);
                }
                search_query.set(query);
            }
        })
    };

    let on_clear_search = {
        let search_query = search_query.clone();
        Callback::from(move |_: MouseEvent| search_query.set(String::new()))
    };

    let on_nav = {
        let view = view.clone();
        move |target: View| {
            let view = view.clone();
            Callback::from(move |_: MouseEvent| view.set(target))
        }
    };

    // Storage changes re-render through the subscription; handlers only act
    let on_restore_tab = {
        let toast = toast.clone();
        Callback::from(move |target: TabTarget| {
            let toast = toast.clone();
            spawn_local(async move {
                let command = Command::RestoreTab {
                    url: Some(target.tab.url.clone()),
                    group_id: Some(target.group_id.clone()),
                    tab_id: Some(target.tab.id.clone()),
                    remove_after_restore: true,
                };
                match send_command(&command).await {
                    Ok(_) => toast.show("Tab restored"),
                    Err(e) => toast.show(format!("Restore failed: {}", e)),
                }
            });
        })
    };

    let on_delete_tab = {
        let toast = toast.clone();
        Callback::from(move |target: TabTarget| {
            let toast = toast.clone();
            spawn_local(async move {
                match store().remove_tab(&target.group_id, &target.tab.id).await {
                    Ok(_) => toast.show("Tab deleted"),
                    Err(e) => toast.show(format!("Delete failed: {}", e)),
                }
            });
        })
    };

    let on_restore_group = {
        let toast = toast.clone();
        Callback::from(move |group_id: String| {
            let toast = toast.clone();
            spawn_local(async move {
                let command = Command::RestoreGroup {
                    group_id,
                    remove_after_restore: true,
                };
                match send_command(&command).await {
                    Ok(_) => toast.show("Group restored"),
                    Err(e) => toast.show(format!("Restore failed: {}", e)),
                }
            });
        })
    };

    let on_delete_group = {
        let toast = toast.clone();
        Callback::from(move |group: Group| {
            let prompt = format!("Delete \"{}\" and its {}?", group.name, plural(group.tabs.len(), "tab"));
            if !confirm_action(&prompt) {
                return;
            }
            let toast = toast.clone();
            spawn_local(async move {
                match store().delete_group(&group.id).await {
                    Ok(_) => toast.show("Group deleted"),
                    Err(e) => toast.show(format!("Delete failed: {}", e)),
                }
            });
        })
    };

    let on_shelve_all = {
        let toast = toast.clone();
        Callback::from(move |_: MouseEvent| {
            let toast = toast.clone();
            spawn_local(async move {
                match send_command(&Command::SaveAllTabs).await {
                    Ok(crate::protocol::Response::Counts(result)) => {
                        toast.show(save_all_message(&result));
                    }
                    Ok(other) => warn!("Unexpected reply: {:?}", other),
                    Err(e) => toast.show(format!("Shelving failed: {}", e)),
                }
            });
        })
    };

    let on_export = {
        let toast = toast.clone();
        Callback::from(move |_: MouseEvent| {
            let toast = toast.clone();
            spawn_local(async move {
                match store().export_data().await {
                    Ok(json) => {
                        let filename = format!("shelf-export-{}.json", format_date(now_millis()));
                        download_text(&json, &filename);
                        toast.show("Data exported");
                    }
                    Err(e) => toast.show(format!("Export failed: {}", e)),
                }
            });
        })
    };

    let on_import = {
        let toast = toast.clone();
        Callback::from(move |_: MouseEvent| {
            let toast = toast.clone();
            spawn_local(async move {
                let text = match pick_text_file().await {
                    Ok(Some(text)) => text,
                    Ok(None) => return,
                    Err(e) => {
                        toast.show(format!("Import failed: {}", e));
                        return;
                    }
                };
                match store().import_data(&text, ImportMode::Merge).await {
                    Ok(_) => toast.show("Data imported successfully"),
                    Err(e) => {
                        warn!("{}", e);
                        toast.show(e.to_string());
                    }
                }
            });
        })
    };

    let on_theme_change = {
        Callback::from(move |e: Event| {
            let Some(select) = e.target_dyn_into::<HtmlSelectElement>() else {
                return;
            };
            let theme = match select.value().as_str() {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                _ => Theme::System,
            };
            spawn_local(async move {
                if let Err(e) = store().set_settings(Settings { theme }).await {
                    warn!("Failed to save theme: {}", e);
                }
            });
        })
    };

    let on_clear_all = {
        let toast = toast.clone();
        Callback::from(move |_: MouseEvent| {
            if !confirm_action("Are you sure you want to delete ALL shelved tabs? This cannot be undone.") {
                return;
            }
            let toast = toast.clone();
            spawn_local(async move {
                match store().clear_all().await {
                    Ok(_) => toast.show("All data deleted"),
                    Err(e) => toast.show(format!("Delete failed: {}", e)),
                }
            });
        })
    };

    let total_tabs = data.total_tab_count();
    let nav_class = |target: View| if *view == target { "nav-item active" } else { "nav-item" };

    let content = match *view {
        View::Tabs if !search_query.is_empty() => {
            let hits = search_tabs(&data.groups, &search_query);
            html! {
                <div class="search-results">
                    <h2 class="stats-title">
                        {format!("{} for \"{}\"", plural(hits.len(), "result"), *search_query)}
                    </h2>
                    <button class="text-button" onclick={on_clear_search}>{"Clear"}</button>
                    {for hits.iter().map(|hit| {
                        let color = data
                            .group_by_id(&hit.group_id)
                            .map(|g| g.color.clone())
                            .unwrap_or_default();
                        html! {
                            <TabRow
                                key={hit.tab.id.clone()}
                                group_id={hit.group_id.clone()}
                                tab={hit.tab.clone()}
                                color={color}
                                group_name={Some(hit.group_name.clone())}
                                on_restore={on_restore_tab.clone()}
                                on_delete={on_delete_tab.clone()}
                            />
                        }
                    })}
                </div>
            }
        }
        View::Tabs if total_tabs == 0 => html! {
            <div class="empty-state">
                <h2>{"Your shelf is empty"}</h2>
                <p>{"Shelve some tabs from the toolbar popup to see them here."}</p>
            </div>
        },
        View::Tabs => html! {
            <div class="groups-container">
                {for sort_groups_by_activity(&data.groups).into_iter().map(|group| {
                    let key = group.id.clone();
                    html! {
                        <GroupCard
                            key={key}
                            group={group}
                            on_restore_group={on_restore_group.clone()}
                            on_delete_group={on_delete_group.clone()}
                            on_restore_tab={on_restore_tab.clone()}
                            on_delete_tab={on_delete_tab.clone()}
                        />
                    }
                })}
            </div>
        },
        View::Sessions if data.sessions.is_empty() => html! {
            <div class="empty-state">
                <h2>{"No sessions yet"}</h2>
                <p>{"Sessions are recorded each time you shelve tabs."}</p>
            </div>
        },
        View::Sessions => html! {
            <div class="sessions-list">
                {for data.sessions.iter().map(|session| html! {
                    <div class="session-card" key={session.id.clone()}>
                        <span class="session-dot"></span>
                        <div class="session-info">
                            <div class="session-date">{format_date_time(session.saved_at)}</div>
                            <div class="session-count">{format!("{} shelved", plural(session.tab_count, "tab"))}</div>
                        </div>
                    </div>
                })}
            </div>
        },
        View::Settings => {
            let theme = match data.settings.theme {
                Theme::System => "system",
                Theme::Light => "light",
                Theme::Dark => "dark",
            };
            html! {
                <div class="settings flex-column-gap">
                    <label>
                        {"Theme "}
                        <select onchange={on_theme_change}>
                            <option value="system" selected={theme == "system"}>{"System"}</option>
                            <option value="light" selected={theme == "light"}>{"Light"}</option>
                            <option value="dark" selected={theme == "dark"}>{"Dark"}</option>
                        </select>
                    </label>
                    <Button onclick={on_export} variant={ButtonVariant::Secondary}>{"Export"}</Button>
                    <Button onclick={on_import} variant={ButtonVariant::Secondary}>{"Import"}</Button>
                    <Button onclick={on_clear_all} variant={ButtonVariant::Danger}>{"Delete all data"}</Button>
                </div>
            }
        }
    };

    html! {
        <div class="dashboard" data-theme={match data.settings.theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "",
        }}>
            <nav class="sidebar">
                <h1 class="popup-title">{"Tab Shelf"}</h1>
                <button class={nav_class(View::Tabs)} onclick={on_nav(View::Tabs)}>
                    {"Tabs "}<span class="sidebar-count">{total_tabs}</span>
                </button>
                <button class={nav_class(View::Sessions)} onclick={on_nav(View::Sessions)}>{"Sessions"}</button>
                <button class={nav_class(View::Settings)} onclick={on_nav(View::Settings)}>{"Settings"}</button>
            </nav>

            <main class="content">
                <div class="topbar">
                    <input
                        ref={search_ref}
                        class="search-input"
                        type="search"
                        placeholder="Search shelved tabs  ( / )"
                        value={(*search_query).clone()}
                        oninput={on_search_input}
                    />
                    <Button onclick={on_shelve_all} variant={ButtonVariant::Primary}>{"Shelve all tabs"}</Button>
                </div>

                {match &*state {
                    ViewState::Loading => html! { <Spinner /> },
                    ViewState::Error(err) => html! {
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    },
                    ViewState::Idle => content,
                }}
            </main>

            <Toast message={toast.message()} />
        </div>
    }
}
