/// Popup UI for Tab Shelf

use log::warn;
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::chrome::{close_popup, open_dashboard, send_command};
use crate::clock::now_millis;
use crate::orchestrator::ShelfStats;
use crate::protocol::{Command, Response};
use crate::ui::components::{use_toast, Toast, POPUP_TOAST_DURATION};
use crate::ui::format::{last_session_text, save_all_message, save_current_message};

#[derive(Clone, PartialEq)]
enum PopupState {
    Idle,
    Busy(String),
    Error(String),
}

async fn load_stats() -> Result<ShelfStats, String> {
    match send_command(&Command::GetStats).await {
        Ok(Response::Stats(stats)) => Ok(stats),
        Ok(other) => Err(format!("Unexpected reply: {:?}", other)),
        Err(e) => Err(e.to_string()),
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| PopupState::Idle);
    let stats = use_state(ShelfStats::default);
    let toast = use_toast(POPUP_TOAST_DURATION);

    // Load stats on mount
    {
        let stats = stats.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_stats().await {
                    Ok(loaded) => stats.set(loaded),
                    Err(e) => state.set(PopupState::Error(e)),
                }
            });
            || ()
        });
    }

    let run_save = {
        let state = state.clone();
        let stats = stats.clone();
        let toast = toast.clone();

        move |command: Command, label: &'static str| {
            let state = state.clone();
            let stats = stats.clone();
            let toast = toast.clone();

            Callback::from(move |_: MouseEvent| {
                let state = state.clone();
                let stats = stats.clone();
                let toast = toast.clone();
                let command = command.clone();

                state.set(PopupState::Busy(label.to_string()));

                spawn_local(async move {
                    match send_command(&command).await {
                        Ok(Response::Counts(result)) => {
                            let message = match command {
                                Command::SaveCurrentTab => save_current_message(&result).to_string(),
                                _ => save_all_message(&result),
                            };
                            toast.show(message);
                            if let Ok(loaded) = load_stats().await {
                                stats.set(loaded);
                            }
                            state.set(PopupState::Idle);
                        }
                        Ok(other) => {
                            warn!("Unexpected reply to {:?}: {:?}", command, other);
                            state.set(PopupState::Error("Unexpected reply".to_string()));
                        }
                        Err(e) => state.set(PopupState::Error(format!("Shelving failed: {}", e))),
                    }
                });
            })
        }
    };

    let on_shelve_all = run_save(Command::SaveAllTabs, "Shelving tabs...");
    let on_shelve_current = run_save(Command::SaveCurrentTab, "Shelving tab...");

    let on_open_dashboard = Callback::from(move |_: MouseEvent| {
        spawn_local(async move {
            if let Err(e) = open_dashboard().await {
                warn!("{}", e);
            }
            close_popup();
        });
    });

    let is_busy = matches!(*state, PopupState::Busy(_));

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Shelf"}</h1>

            <div class="stat-item">
                <span class="stat-count">{stats.total_tabs}</span>
                <span class="stat-label">{" tabs on the shelf"}</span>
            </div>

            if let Some(session) = &stats.last_session {
                <p class="recent-text">{last_session_text(session, now_millis())}</p>
            }

            {match &*state {
                PopupState::Busy(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                PopupState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                PopupState::Idle => html! {},
            }}

            <div class="flex-column-gap">
                <Button onclick={on_shelve_all} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                    {"Shelve all tabs"}
                </Button>
                <Button onclick={on_shelve_current} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Shelve this tab"}
                </Button>
                <Button onclick={on_open_dashboard} variant={ButtonVariant::Link} block={true}>
                    {"Open shelf"}
                </Button>
            </div>

            <Toast message={toast.message()} />
        </div>
    }
}
