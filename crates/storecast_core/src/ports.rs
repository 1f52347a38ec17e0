//! crates/storecast_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Message, NewMessage, Store, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Store Directory ---

    /// Every store currently eligible to receive messages, ordered by name.
    async fn active_stores(&self) -> PortResult<Vec<Store>>;

    // --- Message Management ---

    /// Persists a validated message on behalf of `user_id` and returns the
    /// stored row, including its generated id and creation timestamp.
    async fn insert_message(&self, new_message: NewMessage, user_id: Uuid) -> PortResult<Message>;

    /// Total number of messages created by `user_id`.
    async fn count_messages(&self, user_id: Uuid) -> PortResult<u64>;

    /// One page of `user_id`'s messages, newest first.
    async fn messages_page(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> PortResult<Vec<Message>>;

    /// A single message, scoped to its creator.
    async fn get_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<Message>;

    /// Permanently removes a message. Fails with `NotFound` when the row
    /// does not exist or belongs to another user.
    async fn delete_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<()>;

    // --- User Management ---

    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User>;

    // --- Auth Methods ---

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
