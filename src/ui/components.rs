/// Reusable UI components

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen_futures::spawn_local;
use yew::platform::time::sleep;
use yew::prelude::*;

use crate::tab_data::{Group, TabEntry};
use crate::ui::format::{plural, truncate_url};

pub const POPUP_TOAST_DURATION: Duration = Duration::from_millis(2000);
pub const DASHBOARD_TOAST_DURATION: Duration = Duration::from_millis(2500);

/// Toast text plus the token of the message currently shown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToastState {
    pub message: Option<String>,
    token: u64,
}

pub enum ToastAction {
    Show { message: String, token: u64 },
    /// Hide the toast, unless a newer message replaced it meanwhile
    Expire(u64),
}

impl Reducible for ToastState {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: ToastAction) -> Rc<Self> {
        match action {
            ToastAction::Show { message, token } => Rc::new(ToastState {
                message: Some(message),
                token,
            }),
            ToastAction::Expire(token) if token == self.token && self.message.is_some() => {
                Rc::new(ToastState { message: None, token })
            }
            ToastAction::Expire(_) => self,
        }
    }
}

#[derive(Clone)]
pub struct ToastHandle {
    state: UseReducerHandle<ToastState>,
    next_token: Rc<Cell<u64>>,
    duration: Duration,
}

impl ToastHandle {
    /// Show `message`, hiding it again once `duration` has passed
    pub fn show(&self, message: impl Into<String>) {
        let token = self.next_token.get() + 1;
        self.next_token.set(token);
        self.state.dispatch(ToastAction::Show {
            message: message.into(),
            token,
        });

        let state = self.state.clone();
        let duration = self.duration;
        spawn_local(async move {
            sleep(duration).await;
            state.dispatch(ToastAction::Expire(token));
        });
    }

    pub fn message(&self) -> Option<String> {
        self.state.message.clone()
    }
}

#[hook]
pub fn use_toast(duration: Duration) -> ToastHandle {
    let state = use_reducer(ToastState::default);
    let next_token = use_memo((), |_| Cell::new(0u64));
    ToastHandle {
        state,
        next_token,
        duration,
    }
}

#[derive(Properties, PartialEq)]
pub struct ToastProps {
    pub message: Option<String>,
}

#[function_component(Toast)]
pub fn toast(props: &ToastProps) -> Html {
    match &props.message {
        Some(message) => html! {
            <div class="toast show" role="status">{message}</div>
        },
        None => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub struct FaviconProps {
    pub url: String,
    pub color: String,
}

/// Favicon, or a colored dot when the page had none
#[function_component(Favicon)]
pub fn favicon(props: &FaviconProps) -> Html {
    if props.url.is_empty() {
        html! {
            <span class="tab-favicon" style={format!("background-color: {}; border-radius: 50%; width: 16px; height: 16px; display: inline-block;", props.color)}></span>
        }
    } else {
        html! {
            <img class="tab-favicon" src={props.url.clone()} width="16" height="16" alt="" />
        }
    }
}

/// Identifies one shelved tab for restore/delete callbacks
#[derive(Clone, PartialEq)]
pub struct TabTarget {
    pub group_id: String,
    pub tab: TabEntry,
}

#[derive(Properties, PartialEq)]
pub struct TabRowProps {
    pub group_id: String,
    pub tab: TabEntry,
    pub color: String,
    #[prop_or_default]
    pub group_name: Option<String>,
    pub on_restore: Callback<TabTarget>,
    pub on_delete: Callback<TabTarget>,
}

#[function_component(TabRow)]
pub fn tab_row(props: &TabRowProps) -> Html {
    let target = TabTarget {
        group_id: props.group_id.clone(),
        tab: props.tab.clone(),
    };

    let on_restore = {
        let target = target.clone();
        let on_restore = props.on_restore.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_restore.emit(target.clone());
        })
    };

    let on_delete = {
        let on_delete = props.on_delete.clone();
        Callback::from(move |_: MouseEvent| on_delete.emit(target.clone()))
    };

    html! {
        <div class="tab-row">
            <Favicon url={props.tab.fav_icon_url.clone()} color={props.color.clone()} />
            <a class="tab-title" href={props.tab.url.clone()} onclick={on_restore} title={props.tab.url.clone()}>
                {&props.tab.title}
            </a>
            <span class="tab-url">{truncate_url(&props.tab.url, 60)}</span>
            if let Some(name) = &props.group_name {
                <span class="tab-group-label">{name}</span>
            }
            <button class="icon-button" onclick={on_delete} title="Delete">{"✕"}</button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct GroupCardProps {
    pub group: Group,
    pub on_restore_group: Callback<String>,
    pub on_delete_group: Callback<Group>,
    pub on_restore_tab: Callback<TabTarget>,
    pub on_delete_tab: Callback<TabTarget>,
}

#[function_component(GroupCard)]
pub fn group_card(props: &GroupCardProps) -> Html {
    let collapsed = use_state(|| false);
    let group = &props.group;

    let on_toggle = {
        let collapsed = collapsed.clone();
        Callback::from(move |_: MouseEvent| collapsed.set(!*collapsed))
    };

    let on_restore_group = {
        let group_id = group.id.clone();
        let on_restore_group = props.on_restore_group.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            on_restore_group.emit(group_id.clone());
        })
    };

    let on_delete_group = {
        let group = group.clone();
        let on_delete_group = props.on_delete_group.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            on_delete_group.emit(group.clone());
        })
    };

    let card_class = if *collapsed { "group-card collapsed" } else { "group-card" };

    html! {
        <div class={card_class}>
            <div class="group-header" onclick={on_toggle}>
                <span class="group-dot" style={format!("background-color: {};", group.color)}></span>
                <span class="group-name">{&group.name}</span>
                <span class="group-count">{plural(group.tabs.len(), "tab")}</span>
                <button class="text-button" onclick={on_restore_group}>{"Restore all"}</button>
                <button class="icon-button" onclick={on_delete_group} title="Delete group">{"✕"}</button>
            </div>
            if !*collapsed {
                <div class="group-tabs">
                    {for group.tabs.iter().map(|tab| html! {
                        <TabRow
                            key={tab.id.clone()}
                            group_id={group.id.clone()}
                            tab={tab.clone()}
                            color={group.color.clone()}
                            on_restore={props.on_restore_tab.clone()}
                            on_delete={props.on_delete_tab.clone()}
                        />
                    })}
                </div>
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(state: Rc<ToastState>, message: &str, token: u64) -> Rc<ToastState> {
        state.reduce(ToastAction::Show {
            message: message.to_string(),
            token,
        })
    }

    #[test]
    fn test_toast_expires() {
        let state = show(Rc::new(ToastState::default()), "3 tabs shelved", 1);
        assert_eq!(state.message.as_deref(), Some("3 tabs shelved"));

        let state = state.reduce(ToastAction::Expire(1));
        assert_eq!(state.message, None);
    }

    #[test]
    fn test_stale_timer_keeps_newer_toast() {
        let state = show(Rc::new(ToastState::default()), "Tab restored", 1);
        let state = show(state, "Tab deleted", 2);

        let state = state.reduce(ToastAction::Expire(1));
        assert_eq!(state.message.as_deref(), Some("Tab deleted"));

        let state = state.reduce(ToastAction::Expire(2));
        assert_eq!(state.message, None);
    }
}
