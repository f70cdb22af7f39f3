/// Message protocol between UI surfaces and the background worker

use log::warn;
use serde::{Deserialize, Serialize};

use crate::browser::{Badge, TabControl};
use crate::error::Result;
use crate::orchestrator::{ShelfStats, Shelver};
use crate::store::ShelfStore;
use crate::tab_data::SaveResult;

pub const UNKNOWN_MESSAGE: &str = "Unknown message type";

/// Requests a popup or dashboard can send, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    SaveAllTabs,
    SaveCurrentTab,
    GetStats,
    #[serde(rename_all = "camelCase")]
    RestoreTab {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        group_id: Option<String>,
        #[serde(default)]
        tab_id: Option<String>,
        #[serde(default)]
        remove_after_restore: bool,
    },
    #[serde(rename_all = "camelCase")]
    RestoreGroup {
        group_id: String,
        #[serde(default)]
        remove_after_restore: bool,
    },
}

impl Command {
    pub fn parse(message: serde_json::Value) -> std::result::Result<Command, serde_json::Error> {
        serde_json::from_value(message)
    }
}

/// Reply to a [`Command`]; exactly one is sent per request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Counts(SaveResult),
    Stats(ShelfStats),
    Ack { ok: bool },
    Error { error: String },
}

impl Response {
    pub fn ack() -> Response {
        Response::Ack { ok: true }
    }

    pub fn unknown() -> Response {
        Response::Error {
            error: UNKNOWN_MESSAGE.to_string(),
        }
    }
}

/// Run one command against the orchestrator
pub async fn dispatch<S, T, B>(shelver: &Shelver<S, T, B>, command: Command) -> Result<Response>
where
    S: ShelfStore,
    T: TabControl,
    B: Badge,
{
    let response = match command {
        Command::SaveAllTabs => Response::Counts(shelver.save_all_open_tabs().await?),
        Command::SaveCurrentTab => Response::Counts(shelver.save_current_tab().await?),
        Command::GetStats => Response::Stats(shelver.stats().await?),
        Command::RestoreTab {
            url,
            group_id,
            tab_id,
            remove_after_restore,
        } => {
            shelver
                .restore_tab(
                    url.as_deref(),
                    group_id.as_deref(),
                    tab_id.as_deref(),
                    remove_after_restore,
                )
                .await?;
            Response::ack()
        }
        Command::RestoreGroup {
            group_id,
            remove_after_restore,
        } => {
            shelver.restore_group(&group_id, remove_after_restore).await?;
            Response::ack()
        }
    };
    Ok(response)
}

/// Decode a raw message and dispatch it. Messages that do not decode into
/// a known command get an error reply instead of failing the channel.
pub async fn handle_message<S, T, B>(shelver: &Shelver<S, T, B>, message: serde_json::Value) -> Result<Response>
where
    S: ShelfStore,
    T: TabControl,
    B: Badge,
{
    match Command::parse(message) {
        Ok(command) => dispatch(shelver, command).await,
        Err(e) => {
            warn!("Rejected message: {}", e);
            Ok(Response::unknown())
        }
    }
}
