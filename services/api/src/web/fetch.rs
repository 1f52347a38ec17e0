//! services/api/src/web/fetch.rs
//!
//! This module contains the asynchronous "worker" tasks that load data for
//! a screen session. Every task carries the generation number and
//! `CancellationToken` handed out by `ScreenSession::begin_fetch`; a task
//! whose generation has been superseded by the time its data arrives
//! discards the result instead of applying it, so a slow response can
//! never overwrite the state of a newer navigation.

use crate::web::protocol::ServerMessage;
use crate::web::session::{send, Outbox};
use crate::web::state::{AppState, ListScreen, Screen, ScreenSession};
use std::sync::Arc;
use storecast_core::domain::Message;
use storecast_core::pagination::Page;
use storecast_core::ports::{DatabaseService, PortResult};
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

/// Counts the actor's messages, clamps `requested_page` against the fresh
/// total, and loads the resulting window, newest first. Shared with the
/// REST list endpoint so both surfaces page identically.
pub async fn load_message_page(
    db: &dyn DatabaseService,
    user_id: Uuid,
    page_size: u32,
    requested_page: u32,
) -> PortResult<(Page, Vec<Message>)> {
    let total = db.count_messages(user_id).await?;
    let page = Page::clamp(requested_page, page_size, total);
    let messages = db
        .messages_page(user_id, page.limit(), page.offset())
        .await?;
    Ok((page, messages))
}

/// Starts the fetch that (re)loads the message list on `requested_page`.
pub async fn start_list_fetch(
    app_state: Arc<AppState>,
    session_lock: Arc<Mutex<ScreenSession>>,
    outbox: Outbox,
    requested_page: u32,
) {
    let (user_id, page_size, generation, token) = {
        let mut session = session_lock.lock().await;
        let (generation, token) = session.begin_fetch();
        (session.user_id, session.page_size, generation, token)
    };

    tokio::spawn(async move {
        let result =
            load_message_page(app_state.db.as_ref(), user_id, page_size, requested_page).await;

        if token.is_cancelled() {
            debug!("List fetch for page {} cancelled.", requested_page);
            return;
        }

        let mut session = session_lock.lock().await;
        if session.fetch_generation != generation {
            debug!("Discarding stale list fetch (generation {}).", generation);
            return;
        }

        match result {
            Ok((page, messages)) => {
                session.last_list_page = page.number();
                session.screen = Screen::List(ListScreen {
                    page,
                    messages: messages.clone(),
                });
                send(
                    &outbox,
                    ServerMessage::ListLoaded {
                        page: page.number(),
                        total_pages: page.total_pages(),
                        total: page.total(),
                        has_previous: page.has_previous(),
                        has_next: page.has_next(),
                        messages,
                    },
                );
            }
            Err(e) => {
                // The previous screen state is kept; the client can retry.
                error!("Failed to load the message list: {:?}", e);
                send(
                    &outbox,
                    ServerMessage::Error {
                        message: "Failed to load messages".to_string(),
                    },
                );
            }
        }
    });
}

/// Starts the fetch that loads the active store directory for the
/// composer. `refresh` selects the reply variant so the client can tell a
/// manual re-fetch from the initial load.
pub async fn start_directory_fetch(
    app_state: Arc<AppState>,
    session_lock: Arc<Mutex<ScreenSession>>,
    outbox: Outbox,
    refresh: bool,
) {
    let (generation, token) = session_lock.lock().await.begin_fetch();

    tokio::spawn(async move {
        let result = app_state.db.active_stores().await;

        if token.is_cancelled() {
            debug!("Store directory fetch cancelled.");
            return;
        }

        let mut session = session_lock.lock().await;
        if session.fetch_generation != generation {
            debug!(
                "Discarding stale store directory fetch (generation {}).",
                generation
            );
            return;
        }

        match result {
            Ok(stores) => {
                if let Screen::Composer(composer) = &mut session.screen {
                    composer.directory = stores.clone();
                    let reply = if refresh {
                        ServerMessage::StoresRefreshed { stores }
                    } else {
                        ServerMessage::ComposerOpened { stores }
                    };
                    send(&outbox, reply);
                }
            }
            Err(e) => {
                error!("Failed to load the store directory: {:?}", e);
                send(
                    &outbox,
                    ServerMessage::Error {
                        message: "Failed to load stores".to_string(),
                    },
                );
            }
        }
    });
}
