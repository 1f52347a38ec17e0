//! crates/storecast_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format; the
//! snapshot types derive serde because they are frozen into messages as
//! structured data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a store. Only `Active` stores appear in the
/// directory and are eligible as message targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    /// Parses the status column value. Anything other than the literal
    /// `Active` is treated as inactive.
    pub fn parse(value: &str) -> Self {
        if value == "Active" {
            StoreStatus::Active
        } else {
            StoreStatus::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "Active",
            StoreStatus::Inactive => "Inactive",
        }
    }
}

/// A retail location eligible to receive broadcast messages.
///
/// Stores are read-only reference data from this application's point of
/// view. Identity is `id`; `code` is the short human-entered key used for
/// manual targeting and is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub area: Option<String>,
    pub status: StoreStatus,
    pub postcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// The minimal projection of this store frozen into a message when it
    /// is created.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }
}

/// The `{id, code, name}` projection of a store captured at message
/// creation time. Snapshots are frozen: later edits to the store never
/// rewrite the target list of an already-sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// A composed broadcast with its frozen target-store snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub date_created: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub list_of_stores: Vec<StoreSnapshot>,
    pub user_id: Uuid,
}

/// A validated, not-yet-persisted message produced by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub title: String,
    pub body: String,
    pub list_of_stores: Vec<StoreSnapshot>,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>, // Optional because the demo actor has none
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
