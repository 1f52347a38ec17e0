//! services/api/src/web/test_support.rs
//!
//! An in-memory `DatabaseService` used by the web-layer tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use storecast_core::domain::{Message, NewMessage, Store, StoreStatus, User, UserCredentials};
use storecast_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Builds an active store for tests.
pub fn store(code: &str, name: &str, area: Option<&str>) -> Store {
    Store {
        id: Uuid::new_v4(),
        code: code.to_owned(),
        name: name.to_owned(),
        area: area.map(str::to_owned),
        status: StoreStatus::Active,
        postcode: Some("LS1 4AP".to_owned()),
        created_at: Utc::now(),
    }
}

/// In-memory stand-in for the Postgres adapter. State lives behind std
/// mutexes; the locks are never held across an await point.
pub struct MockDb {
    stores: Mutex<Vec<Store>>,
    messages: Mutex<Vec<Message>>,
    users: Mutex<Vec<UserCredentials>>,
    auth_sessions: Mutex<Vec<(String, Uuid)>>,
    pub fail_inserts: AtomicBool,
    pub insert_calls: AtomicUsize,
    pub page_fetches: AtomicUsize,
    gate_enabled: AtomicBool,
    gate: Semaphore,
}

impl MockDb {
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            auth_sessions: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
            insert_calls: AtomicUsize::new(0),
            page_fetches: AtomicUsize::new(0),
            gate_enabled: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn with_stores(stores: Vec<Store>) -> Self {
        let db = Self::new();
        *db.stores.lock().unwrap() = stores;
        db
    }

    pub fn set_stores(&self, stores: Vec<Store>) {
        *self.stores.lock().unwrap() = stores;
    }

    /// Seeds `count` messages for `user_id`, oldest first, so the newest
    /// is titled `Message {count}`.
    pub fn seed_messages(&self, user_id: Uuid, count: usize) {
        let base = Utc::now() - Duration::hours(1);
        let mut messages = self.messages.lock().unwrap();
        for i in 1..=count {
            messages.push(Message {
                id: Uuid::new_v4(),
                date_created: base + Duration::seconds(i as i64),
                title: format!("Message {}", i),
                body: format!("Body {}", i),
                list_of_stores: Vec::new(),
                user_id,
            });
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn stored_messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Parks every subsequent count query until `release_counts` hands out
    /// permits, letting tests order overlapping fetches deterministically.
    pub fn hold_counts(&self) {
        self.gate_enabled.store(true, Ordering::SeqCst);
    }

    pub fn release_counts(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl DatabaseService for MockDb {
    async fn active_stores(&self) -> PortResult<Vec<Store>> {
        let mut stores: Vec<Store> = self
            .stores
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == StoreStatus::Active)
            .cloned()
            .collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    async fn insert_message(&self, new_message: NewMessage, user_id: Uuid) -> PortResult<Message> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("insert refused".to_string()));
        }
        let message = Message {
            id: Uuid::new_v4(),
            date_created: Utc::now(),
            title: new_message.title,
            body: new_message.body,
            list_of_stores: new_message.list_of_stores,
            user_id,
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn count_messages(&self, user_id: Uuid) -> PortResult<u64> {
        if self.gate_enabled.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| PortError::Unexpected("count gate closed".to_string()))?;
            permit.forget();
        }
        let count = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .count();
        Ok(count as u64)
    }

    async fn messages_page(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> PortResult<Vec<Message>> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        let mut mine: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(mine
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<Message> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == message_id && m.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Message {} not found", message_id)))
    }

    async fn delete_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<()> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| !(m.id == message_id && m.user_id == user_id));
        if messages.len() == before {
            return Err(PortError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        Ok(())
    }

    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        Ok(User {
            user_id,
            email: None,
        })
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email: email.to_owned(),
            hashed_password: hashed_password.to_owned(),
        };
        self.users.lock().unwrap().push(credentials.clone());
        Ok(User {
            user_id: credentials.user_id,
            email: Some(credentials.email),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No user with email {}", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.auth_sessions
            .lock()
            .unwrap()
            .push((session_id.to_owned(), user_id));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.auth_sessions
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, user_id)| *user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.auth_sessions
            .lock()
            .unwrap()
            .retain(|(id, _)| id != session_id);
        Ok(())
    }
}
