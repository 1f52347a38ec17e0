//! services/api/src/web/session.rs
//!
//! Applies client messages to a screen session. This is the state machine
//! behind the WebSocket connection: list navigation, the composer form,
//! store targeting, and the detail handover all live here, independent of
//! the socket itself so the logic can be driven directly in tests.

use crate::web::fetch::{start_directory_fetch, start_list_fetch};
use crate::web::protocol::{ClientMessage, ServerMessage};
use crate::web::state::{AppState, ComposerScreen, DetailScreen, ListScreen, Screen, ScreenSession};
use std::sync::Arc;
use storecast_core::compose::{validate, ValidationErrors};
use storecast_core::domain::NewMessage;
use storecast_core::selection::PickerSession;
use tokio::sync::Mutex;
use tracing::{error, warn};
use uuid::Uuid;

/// The outbound half of a connection. Fetch tasks and the dispatcher both
/// reply through this; the connection loop forwards it onto the socket.
pub type Outbox = tokio::sync::mpsc::UnboundedSender<ServerMessage>;

/// Queues a reply for the client. A failed send only means the client is
/// gone; the connection loop winds the session down on its own.
pub(crate) fn send(outbox: &Outbox, message: ServerMessage) {
    let _ = outbox.send(message);
}

//=========================================================================================
// Dispatch
//=========================================================================================

/// Applies one client message to the session, replying through `outbox`.
///
/// Pure state changes happen inline under the session lock. Anything that
/// reads the database spawns a fenced fetch task (see `fetch`), except
/// deletes and inserts, which are awaited here so their confirmation is
/// ordered before the follow-up list reload.
pub async fn handle_client_message(
    app_state: &Arc<AppState>,
    session_lock: &Arc<Mutex<ScreenSession>>,
    outbox: &Outbox,
    client_msg: ClientMessage,
) {
    match client_msg {
        // --- Message list ---
        ClientMessage::OpenList { page } | ClientMessage::GoToPage { page } => {
            start_list_fetch(app_state.clone(), session_lock.clone(), outbox.clone(), page).await;
        }
        ClientMessage::NextPage => {
            let requested = session_lock
                .lock()
                .await
                .current_list_page()
                .saturating_add(1);
            start_list_fetch(
                app_state.clone(),
                session_lock.clone(),
                outbox.clone(),
                requested,
            )
            .await;
        }
        ClientMessage::PreviousPage => {
            let requested = session_lock
                .lock()
                .await
                .current_list_page()
                .saturating_sub(1)
                .max(1);
            start_list_fetch(
                app_state.clone(),
                session_lock.clone(),
                outbox.clone(),
                requested,
            )
            .await;
        }
        ClientMessage::DeleteMessage { message_id } => {
            let (user_id, current_page) = {
                let session = session_lock.lock().await;
                (session.user_id, session.current_list_page())
            };
            match app_state.db.delete_message(message_id, user_id).await {
                Ok(()) => {
                    send(outbox, ServerMessage::MessageDeleted { message_id });
                    // Recount and reload: if this delete emptied the current
                    // page, the clamp lands the reload on the new last page.
                    start_list_fetch(
                        app_state.clone(),
                        session_lock.clone(),
                        outbox.clone(),
                        current_page,
                    )
                    .await;
                }
                Err(e) => {
                    error!("Failed to delete message {}: {:?}", message_id, e);
                    send(
                        outbox,
                        ServerMessage::Error {
                            message: "Failed to delete message".to_string(),
                        },
                    );
                }
            }
        }
        ClientMessage::ViewMessage { message_id } => {
            let mut session = session_lock.lock().await;
            let handover = match &session.screen {
                Screen::List(list) => list.messages.iter().find(|m| m.id == message_id).cloned(),
                _ => None,
            };
            // Leaving the list invalidates any fetch still in flight for it.
            session.begin_fetch();
            match handover {
                Some(message) => {
                    session.screen = Screen::Detail(DetailScreen {
                        message: Some(message.clone()),
                    });
                    send(outbox, ServerMessage::DetailLoaded { message });
                }
                None => {
                    // Soft fallback: the detail screen renders a not-found
                    // placeholder rather than failing the session.
                    session.screen = Screen::Detail(DetailScreen { message: None });
                    send(outbox, ServerMessage::DetailUnavailable);
                }
            }
        }
        ClientMessage::BackToList => {
            let requested = session_lock.lock().await.last_list_page;
            start_list_fetch(
                app_state.clone(),
                session_lock.clone(),
                outbox.clone(),
                requested,
            )
            .await;
        }

        // --- Composer ---
        ClientMessage::OpenComposer => {
            session_lock.lock().await.screen = Screen::Composer(ComposerScreen::default());
            start_directory_fetch(app_state.clone(), session_lock.clone(), outbox.clone(), false)
                .await;
        }
        ClientMessage::RefreshStores => {
            let on_composer = matches!(session_lock.lock().await.screen, Screen::Composer(_));
            if on_composer {
                start_directory_fetch(app_state.clone(), session_lock.clone(), outbox.clone(), true)
                    .await;
            } else {
                warn!("RefreshStores received outside the composer; ignoring.");
            }
        }
        msg @ (ClientMessage::SetTitle { .. }
        | ClientMessage::SetBody { .. }
        | ClientMessage::ChooseManual
        | ClientMessage::ManualInput { .. }
        | ClientMessage::OpenPicker
        | ClientMessage::ChooseAll
        | ClientMessage::PickerQuery { .. }
        | ClientMessage::PickerToggle { .. }
        | ClientMessage::PickerSelectAll
        | ClientMessage::PickerDeselectAll
        | ClientMessage::PickerSubmit
        | ClientMessage::PickerCancel
        | ClientMessage::RemoveStore { .. }
        | ClientMessage::Submit) => {
            handle_composer_message(app_state, session_lock, outbox, msg).await;
        }
    }
}

/// Handles the messages that only make sense while the composer screen is
/// active. Messages arriving on another screen are logged and dropped.
async fn handle_composer_message(
    app_state: &Arc<AppState>,
    session_lock: &Arc<Mutex<ScreenSession>>,
    outbox: &Outbox,
    client_msg: ClientMessage,
) {
    let mut session = session_lock.lock().await;
    let user_id = session.user_id;
    let Screen::Composer(composer) = &mut session.screen else {
        warn!("Composer message received while another screen is active; ignoring.");
        return;
    };

    match client_msg {
        ClientMessage::SetTitle { value } => {
            composer.draft.title = value;
            // Editing a field clears its own failure; the others stand
            // until the next submit.
            composer.errors.title = None;
        }
        ClientMessage::SetBody { value } => {
            composer.draft.body = value;
            composer.errors.body = None;
        }
        ClientMessage::ChooseManual => {
            composer.selection.choose_manual();
            composer.picker = None;
            send(outbox, selection_reply(composer));
        }
        ClientMessage::ManualInput { input } => {
            let ComposerScreen {
                directory,
                selection,
                ..
            } = composer;
            selection.apply_manual_input(&input, directory);
            send(outbox, selection_reply(composer));
        }
        ClientMessage::OpenPicker => {
            composer.selection.choose_picker();
            composer.picker = Some(PickerSession::seeded_from(&composer.selection));
            send(outbox, selection_reply(composer));
            if let Some(reply) = picker_reply(composer) {
                send(outbox, reply);
            }
        }
        ClientMessage::ChooseAll => {
            let ComposerScreen {
                directory,
                selection,
                picker,
                ..
            } = composer;
            selection.choose_all(directory);
            *picker = None;
            send(outbox, selection_reply(composer));
        }
        ClientMessage::PickerQuery { query } => {
            if let Some(picker) = &mut composer.picker {
                picker.set_query(query);
            }
            if let Some(reply) = picker_reply(composer) {
                send(outbox, reply);
            }
        }
        ClientMessage::PickerToggle { store_id } => {
            if let Some(picker) = &mut composer.picker {
                picker.toggle(store_id);
            }
            if let Some(reply) = picker_reply(composer) {
                send(outbox, reply);
            }
        }
        ClientMessage::PickerSelectAll => {
            let ComposerScreen {
                directory, picker, ..
            } = composer;
            if let Some(picker) = picker {
                picker.select_all_filtered(directory);
            }
            if let Some(reply) = picker_reply(composer) {
                send(outbox, reply);
            }
        }
        ClientMessage::PickerDeselectAll => {
            let ComposerScreen {
                directory, picker, ..
            } = composer;
            if let Some(picker) = picker {
                picker.deselect_all_filtered(directory);
            }
            if let Some(reply) = picker_reply(composer) {
                send(outbox, reply);
            }
        }
        ClientMessage::PickerSubmit => {
            let ComposerScreen {
                directory,
                selection,
                picker,
                ..
            } = composer;
            if let Some(submitted) = picker.take() {
                submitted.submit(selection, directory);
            }
            send(outbox, selection_reply(composer));
        }
        ClientMessage::PickerCancel => {
            // Provisional picks die with the modal; the committed
            // selection is re-sent unchanged as confirmation.
            composer.picker = None;
            send(outbox, selection_reply(composer));
        }
        ClientMessage::RemoveStore { store_id } => {
            composer.selection.remove(store_id);
            send(outbox, selection_reply(composer));
        }
        ClientMessage::Submit => {
            match validate(&composer.draft, composer.selection.selected()) {
                Err(errors) => {
                    composer.errors = errors;
                    send(outbox, validation_reply(&errors));
                }
                Ok(new_message) => {
                    composer.errors = ValidationErrors::default();
                    // Release the session lock before touching the database.
                    drop(session);
                    submit_message(app_state, session_lock, outbox, new_message, user_id).await;
                }
            }
        }
        other => {
            warn!("Unexpected message routed to the composer: {:?}", other);
        }
    }
}

/// Persists a validated submission, then sends the session back to page
/// one of the list. On failure the composer keeps the draft and selection
/// so the user can retry.
async fn submit_message(
    app_state: &Arc<AppState>,
    session_lock: &Arc<Mutex<ScreenSession>>,
    outbox: &Outbox,
    new_message: NewMessage,
    user_id: Uuid,
) {
    match app_state.db.insert_message(new_message, user_id).await {
        Ok(message) => {
            send(
                outbox,
                ServerMessage::MessageCreated {
                    message_id: message.id,
                },
            );
            {
                let mut session = session_lock.lock().await;
                session.last_list_page = 1;
                let page_size = session.page_size;
                session.screen = Screen::List(ListScreen::empty(page_size));
            }
            start_list_fetch(app_state.clone(), session_lock.clone(), outbox.clone(), 1).await;
        }
        Err(e) => {
            error!("Failed to create message: {:?}", e);
            send(
                outbox,
                ServerMessage::Error {
                    message: "Failed to create message. Please try again.".to_string(),
                },
            );
        }
    }
}

//=========================================================================================
// Reply builders
//=========================================================================================

fn selection_reply(composer: &ComposerScreen) -> ServerMessage {
    ServerMessage::SelectionChanged {
        mode: composer.selection.mode(),
        selected: composer.selection.selected().to_vec(),
    }
}

fn picker_reply(composer: &ComposerScreen) -> Option<ServerMessage> {
    composer.picker.as_ref().map(|picker| ServerMessage::PickerState {
        query: picker.query().to_owned(),
        filtered: picker
            .filtered(&composer.directory)
            .into_iter()
            .cloned()
            .collect(),
        provisional: picker.provisional().to_vec(),
    })
}

fn validation_reply(errors: &ValidationErrors) -> ServerMessage {
    ServerMessage::ValidationFailed {
        title: errors.title.map(|_| "Subject is required".to_string()),
        body: errors.body.map(|_| "Message is required".to_string()),
        stores: errors
            .stores
            .map(|_| "Please select at least one store".to_string()),
    }
}

//=========================================================================================
// Tests
//=========================================================================================
