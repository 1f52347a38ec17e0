//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-connection screen
//! session state.

use crate::config::Config;
use std::sync::Arc;
use storecast_core::compose::{MessageDraft, ValidationErrors};
use storecast_core::domain::{Message, Store};
use storecast_core::pagination::Page;
use storecast_core::ports::DatabaseService;
use storecast_core::selection::{PickerSession, StoreSelection};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
}

//=========================================================================================
// ScreenSession (Specific to One WebSocket Connection)
//=========================================================================================

/// The message-list screen: one clamped page of the actor's messages.
#[derive(Debug, Clone)]
pub struct ListScreen {
    pub page: Page,
    pub messages: Vec<Message>,
}

impl ListScreen {
    /// An empty list awaiting its first fetch.
    pub fn empty(page_size: u32) -> Self {
        Self {
            page: Page::clamp(1, page_size, 0),
            messages: Vec::new(),
        }
    }
}

/// The composer screen: the store directory plus all form state.
#[derive(Debug, Clone, Default)]
pub struct ComposerScreen {
    pub directory: Vec<Store>,
    pub draft: MessageDraft,
    pub selection: StoreSelection,
    /// Present while the picker modal is open.
    pub picker: Option<PickerSession>,
    pub errors: ValidationErrors,
}

/// The detail screen. `None` renders the not-found placeholder when the
/// handed-over message could not be resolved.
#[derive(Debug, Clone)]
pub struct DetailScreen {
    pub message: Option<Message>,
}

/// Which screen this connection is currently driving. Each variant owns
/// the full state of its screen, so switching screens drops the old state
/// wholesale.
#[derive(Debug, Clone)]
pub enum Screen {
    List(ListScreen),
    Composer(ComposerScreen),
    Detail(DetailScreen),
}

/// The state for a single, active WebSocket connection.
pub struct ScreenSession {
    pub user_id: Uuid,
    pub page_size: u32,
    pub screen: Screen,
    /// The list page to return to from other screens.
    pub last_list_page: u32,
    /// Monotonic counter fencing in-flight fetches. A fetch result is only
    /// applied while its generation is still the current one.
    pub fetch_generation: u64,
    /// Cancels the fetch task of the current generation.
    pub fetch_token: CancellationToken,
}

impl ScreenSession {
    /// Creates the session for a freshly connected client, parked on an
    /// empty list screen until the first fetch lands.
    pub fn new(user_id: Uuid, page_size: u32) -> Self {
        Self {
            user_id,
            page_size,
            screen: Screen::List(ListScreen::empty(page_size)),
            last_list_page: 1,
            fetch_generation: 0,
            fetch_token: CancellationToken::new(),
        }
    }

    /// Starts a new fetch generation, cancelling whatever fetch was still
    /// in flight. Returns the generation and token the new fetch task must
    /// carry.
    pub fn begin_fetch(&mut self) -> (u64, CancellationToken) {
        self.fetch_token.cancel();
        self.fetch_token = CancellationToken::new();
        self.fetch_generation += 1;
        (self.fetch_generation, self.fetch_token.clone())
    }

    /// The page number currently shown if the list screen is active.
    pub fn current_list_page(&self) -> u32 {
        match &self.screen {
            Screen::List(list) => list.page.number(),
            _ => self.last_list_page,
        }
    }
}
