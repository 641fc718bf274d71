//! Per-link actions
//!
//! Copy and open hand the link URL to the host; toggle calls the API and
//! reports the result through the host's message capability. None of them
//! touch the cache: a toggled link shows its new state after the next
//! refresh.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::LinksClient;
use crate::credential::CredentialStore;
use crate::models::LinkRecord;

pub const TOGGLE_SUCCESS_MESSAGE: &str = "Successfully toggled availability";
pub const TOGGLE_FAILURE_MESSAGE: &str = "Failed to toggle availability";

/// Capabilities supplied by the embedding application
pub trait Host: Send + Sync {
    fn copy_to_clipboard(&self, text: &str);
    fn open_url(&self, url: &str);
    fn show_message(&self, message: &str);
}

/// Actions offered for a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    CopyLink,
    OpenLink,
    ToggleAvailability,
}

impl LinkAction {
    /// Context menu order
    pub const ALL: [LinkAction; 3] = [
        LinkAction::CopyLink,
        LinkAction::OpenLink,
        LinkAction::ToggleAvailability,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            LinkAction::CopyLink => "Copy link",
            LinkAction::OpenLink => "Open link in browser",
            LinkAction::ToggleAvailability => "Toggle availability",
        }
    }
}

/// One entry of a link's context menu
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionItem {
    pub title: String,
    pub subtitle: String,
    pub action: LinkAction,
    pub record: LinkRecord,
}

/// Context menu for a link
pub fn context_menu(record: &LinkRecord) -> Vec<ActionItem> {
    let subtitle = record.display_label();
    LinkAction::ALL
        .iter()
        .map(|action| ActionItem {
            title: action.title().to_string(),
            subtitle: subtitle.clone(),
            action: *action,
            record: record.clone(),
        })
        .collect()
}

/// Executes link actions
#[derive(Clone)]
pub struct ActionDispatcher {
    client: LinksClient,
    credentials: Arc<CredentialStore>,
    host: Arc<dyn Host>,
}

impl ActionDispatcher {
    pub fn new(client: LinksClient, credentials: Arc<CredentialStore>, host: Arc<dyn Host>) -> Self {
        Self {
            client,
            credentials,
            host,
        }
    }

    /// Run an action, returning whether it succeeded
    pub async fn dispatch(&self, action: LinkAction, record: &LinkRecord) -> bool {
        match action {
            LinkAction::CopyLink => {
                self.host.copy_to_clipboard(&record.link);
                true
            }
            LinkAction::OpenLink => {
                self.host.open_url(&record.link);
                true
            }
            LinkAction::ToggleAvailability => self.toggle_availability(record).await,
        }
    }

    /// Toggle a link and tell the user how it went
    pub async fn toggle_availability(&self, record: &LinkRecord) -> bool {
        let credential = self.credentials.get();
        let ok = match self.client.toggle_availability(&credential, &record.id).await {
            Ok(()) => {
                info!("Toggled availability of link {}", record.id);
                true
            }
            Err(e) => {
                warn!(kind = e.kind(), "Toggle of link {} failed: {}", record.id, e);
                false
            }
        };

        self.host.show_message(if ok {
            TOGGLE_SUCCESS_MESSAGE
        } else {
            TOGGLE_FAILURE_MESSAGE
        });
        ok
    }
}
