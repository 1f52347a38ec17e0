//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and
//! the API server for the interactive admin screens.

use serde::{Deserialize, Serialize};
use storecast_core::domain::{Message, Store};
use storecast_core::selection::SelectionMode;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================
// The connection needs no handshake beyond the authenticated upgrade; the
// client simply opens whichever screen it wants first.
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // --- Message list ---
    /// Opens the list screen on the given 1-indexed page.
    OpenList { page: u32 },
    /// Jumps to an arbitrary page of the list.
    GoToPage { page: u32 },
    NextPage,
    PreviousPage,
    /// Deletes a message (the client has already asked for confirmation).
    DeleteMessage { message_id: Uuid },
    /// Opens the detail screen for a message already shown in the list.
    ViewMessage { message_id: Uuid },
    /// Leaves the detail screen and reloads the list.
    BackToList,

    // --- Composer: form fields ---
    /// Opens the composer screen, fetching the store directory.
    OpenComposer,
    /// Re-fetches the store directory after a failed load.
    RefreshStores,
    SetTitle { value: String },
    SetBody { value: String },

    // --- Composer: store targeting ---
    ChooseManual,
    /// Applies a comma-separated list of store codes.
    ManualInput { input: String },
    OpenPicker,
    ChooseAll,
    PickerQuery { query: String },
    PickerToggle { store_id: Uuid },
    PickerSelectAll,
    PickerDeselectAll,
    PickerSubmit,
    PickerCancel,
    /// Dismisses one chip from the committed selection.
    RemoveStore { store_id: Uuid },

    /// Validates and persists the drafted message.
    Submit,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One clamped page of the actor's messages, newest first.
    ListLoaded {
        page: u32,
        total_pages: u32,
        total: u64,
        has_previous: bool,
        has_next: bool,
        messages: Vec<Message>,
    },

    /// Confirms a deletion; a fresh `ListLoaded` follows.
    MessageDeleted { message_id: Uuid },

    /// The detail screen content, handed over from the loaded list.
    DetailLoaded { message: Message },

    /// The requested message was not in the loaded list; the client should
    /// render its not-found placeholder.
    DetailUnavailable,

    /// The composer is open and the store directory has loaded.
    ComposerOpened { stores: Vec<Store> },

    /// A manual directory refresh completed.
    StoresRefreshed { stores: Vec<Store> },

    /// The committed selection after any targeting action.
    SelectionChanged {
        mode: SelectionMode,
        selected: Vec<Store>,
    },

    /// The picker modal's query, visible rows, and ticked ids.
    PickerState {
        query: String,
        filtered: Vec<Store>,
        provisional: Vec<Uuid>,
    },

    /// A rejected submission, with a message per failing field.
    ValidationFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stores: Option<String>,
    },

    /// The drafted message was persisted; a fresh `ListLoaded` follows.
    MessageCreated { message_id: Uuid },

    /// Reports a failed operation; the current screen state is preserved
    /// so the client can retry.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize_from_tagged_json() {
        let open: ClientMessage = serde_json::from_str(r#"{"type":"open_list","page":2}"#).unwrap();
        assert_eq!(open, ClientMessage::OpenList { page: 2 });

        let manual: ClientMessage =
            serde_json::from_str(r#"{"type":"manual_input","input":"STR001, STR002"}"#).unwrap();
        assert_eq!(
            manual,
            ClientMessage::ManualInput {
                input: "STR001, STR002".to_owned()
            }
        );

        let submit: ClientMessage = serde_json::from_str(r#"{"type":"submit"}"#).unwrap();
        assert_eq!(submit, ClientMessage::Submit);
    }

    #[test]
    fn unknown_message_types_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"launch_missiles"}"#).is_err());
    }

    #[test]
    fn validation_failed_omits_clean_fields() {
        let reply = ServerMessage::ValidationFailed {
            title: Some("Subject is required".to_owned()),
            body: None,
            stores: None,
        };
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["type"], "validation_failed");
        assert_eq!(json["title"], "Subject is required");
        assert!(json.get("body").is_none());
        assert!(json.get("stores").is_none());
    }

    #[test]
    fn selection_changed_serializes_the_mode_in_snake_case() {
        let reply = ServerMessage::SelectionChanged {
            mode: SelectionMode::Manual,
            selected: Vec::new(),
        };
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["type"], "selection_changed");
        assert_eq!(json["mode"], "manual");
    }
}
