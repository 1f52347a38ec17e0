//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use storecast_core::domain::{
    Message, NewMessage, Store, StoreSnapshot, StoreStatus, User, UserCredentials,
};
use storecast_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StoreRecord {
    id: Uuid,
    code: String,
    name: String,
    area: Option<String>,
    status: String,
    postcode: Option<String>,
    created_at: DateTime<Utc>,
}
impl StoreRecord {
    fn to_domain(self) -> Store {
        Store {
            id: self.id,
            code: self.code,
            name: self.name,
            area: self.area,
            status: StoreStatus::parse(&self.status),
            postcode: self.postcode,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    date_created: DateTime<Utc>,
    title: String,
    body: String,
    // Stored as a JSONB array of frozen {id, code, name} snapshots.
    list_of_stores: Json<Vec<StoreSnapshot>>,
    user_id: Uuid,
}
impl MessageRecord {
    fn to_domain(self) -> Message {
        Message {
            id: self.id,
            date_created: self.date_created,
            title: self.title,
            body: self.body,
            list_of_stores: self.list_of_stores.0,
            user_id: self.user_id,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

const MESSAGE_COLUMNS: &str = "id, date_created, title, body, list_of_stores, user_id";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn active_stores(&self) -> PortResult<Vec<Store>> {
        let records = sqlx::query_as::<_, StoreRecord>(
            "SELECT id, code, name, area, status, postcode, created_at \
             FROM stores WHERE status = 'Active' ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert_message(&self, new_message: NewMessage, user_id: Uuid) -> PortResult<Message> {
        let sql = format!(
            "INSERT INTO messages (id, title, body, list_of_stores, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            MESSAGE_COLUMNS
        );
        let record = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_message.title)
            .bind(&new_message.body)
            .bind(Json(&new_message.list_of_stores))
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn count_messages(&self, user_id: Uuid) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(count.max(0) as u64)
    }

    async fn messages_page(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> PortResult<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE user_id = $1 \
             ORDER BY date_created DESC LIMIT $2 OFFSET $3",
            MESSAGE_COLUMNS
        );
        let records = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(user_id)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<Message> {
        let sql = format!(
            "SELECT {} FROM messages WHERE id = $1 AND user_id = $2",
            MESSAGE_COLUMNS
        );
        let record = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(message_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Message {} not found", message_id))
                }
                _ => unexpected(e),
            })?;

        Ok(record.to_domain())
    }

    async fn delete_message(&self, message_id: Uuid, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(message_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        Ok(())
    }

    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users \
             WHERE email = $1 AND hashed_password IS NOT NULL",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No user with email {}", email))
            }
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        // Deleting an already-gone session is fine; logout stays idempotent.
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
