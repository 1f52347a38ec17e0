//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::fetch;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storecast_core::compose::{self, MessageDraft, ValidationErrors};
use storecast_core::domain::{Message, Store, StoreSnapshot};
use storecast_core::ports::PortError;
use storecast_core::selection;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_stores_handler,
        list_messages_handler,
        get_message_handler,
        create_message_handler,
        delete_message_handler,
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
    ),
    components(
        schemas(
            StoreResponse,
            SnapshotResponse,
            MessageResponse,
            MessagePageResponse,
            CreateMessageRequest,
            ValidationErrorResponse,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
        )
    ),
    tags(
        (name = "stores", description = "The retail store directory."),
        (name = "messages", description = "Broadcast messages composed for stores."),
        (name = "auth", description = "Account signup, login, and logout.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A store as listed in the directory.
#[derive(Serialize, ToSchema)]
pub struct StoreResponse {
    id: Uuid,
    code: String,
    name: String,
    area: Option<String>,
    postcode: Option<String>,
}

impl From<Store> for StoreResponse {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            code: store.code,
            name: store.name,
            area: store.area,
            postcode: store.postcode,
        }
    }
}

/// The frozen identity of a store a message was sent to.
#[derive(Serialize, ToSchema)]
pub struct SnapshotResponse {
    id: Uuid,
    code: String,
    name: String,
}

impl From<StoreSnapshot> for SnapshotResponse {
    fn from(snapshot: StoreSnapshot) -> Self {
        Self {
            id: snapshot.id,
            code: snapshot.code,
            name: snapshot.name,
        }
    }
}

/// A broadcast message and the stores it targeted.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    id: Uuid,
    date_created: DateTime<Utc>,
    title: String,
    body: String,
    list_of_stores: Vec<SnapshotResponse>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            date_created: message.date_created,
            title: message.title,
            body: message.body,
            list_of_stores: message
                .list_of_stores
                .into_iter()
                .map(SnapshotResponse::from)
                .collect(),
        }
    }
}

/// One page of the caller's messages, newest first.
#[derive(Serialize, ToSchema)]
pub struct MessagePageResponse {
    messages: Vec<MessageResponse>,
    page: u32,
    page_size: u32,
    total: u64,
    total_pages: u32,
    has_previous: bool,
    has_next: bool,
}

impl MessagePageResponse {
    fn new(page: storecast_core::pagination::Page, messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into_iter().map(MessageResponse::from).collect(),
            page: page.number(),
            page_size: page.page_size(),
            total: page.total(),
            total_pages: page.total_pages(),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
        }
    }
}

/// The payload for composing a new message.
#[derive(Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    title: String,
    body: String,
    store_ids: Vec<Uuid>,
}

/// Per-field messages returned when a submission fails validation.
#[derive(Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stores: Option<String>,
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            title: errors.title.map(|_| "Subject is required".to_string()),
            body: errors.body.map(|_| "Message is required".to_string()),
            stores: errors
                .stores
                .map(|_| "Please select at least one store".to_string()),
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct StoreSearchParams {
    /// Case-insensitive substring matched against name, code, and area.
    search: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListMessagesParams {
    /// 1-based page number. Out-of-range values are clamped.
    page: Option<u32>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the active stores, optionally filtered by a search term.
#[utoipa::path(
    get,
    path = "/stores",
    params(StoreSearchParams),
    responses(
        (status = 200, description = "The matching stores, sorted by name", body = [StoreResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "stores"
)]
pub async fn list_stores_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<StoreSearchParams>,
) -> Result<Json<Vec<StoreResponse>>, (StatusCode, String)> {
    let directory = app_state.db.active_stores().await.map_err(|e| {
        error!("Failed to load stores: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load stores".to_string(),
        )
    })?;

    let query = params.search.unwrap_or_default();
    let stores = selection::filter_stores(&directory, &query)
        .into_iter()
        .map(|store| StoreResponse::from(store.clone()))
        .collect();

    Ok(Json(stores))
}

/// List one page of the caller's messages, newest first.
#[utoipa::path(
    get,
    path = "/messages",
    params(ListMessagesParams),
    responses(
        (status = 200, description = "A page of messages", body = MessagePageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "messages"
)]
pub async fn list_messages_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Json<MessagePageResponse>, (StatusCode, String)> {
    let requested = params.page.unwrap_or(1);
    let (page, messages) = fetch::load_message_page(
        app_state.db.as_ref(),
        user_id,
        app_state.config.page_size,
        requested,
    )
    .await
    .map_err(|e| {
        error!("Failed to load messages: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load messages".to_string(),
        )
    })?;

    Ok(Json(MessagePageResponse::new(page, messages)))
}

/// Fetch a single message the caller owns.
#[utoipa::path(
    get,
    path = "/messages/{message_id}",
    params(
        ("message_id" = Uuid, Path, description = "The message to fetch")
    ),
    responses(
        (status = 200, description = "The message", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such message"),
        (status = 500, description = "Internal server error")
    ),
    tag = "messages"
)]
pub async fn get_message_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    match app_state.db.get_message(message_id, user_id).await {
        Ok(message) => Ok(Json(MessageResponse::from(message))),
        Err(PortError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Message not found".to_string()))
        }
        Err(e) => {
            error!("Failed to load message {}: {:?}", message_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load messages".to_string(),
            ))
        }
    }
}

/// Compose a new message for a set of stores.
///
/// The store ids are resolved against the active directory; title and body
/// are trimmed before validation. A submission that fails validation comes
/// back as 422 with per-field messages.
#[utoipa::path(
    post,
    path = "/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Validation failed", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "messages"
)]
pub async fn create_message_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<Response, (StatusCode, String)> {
    let directory = app_state.db.active_stores().await.map_err(|e| {
        error!("Failed to load stores: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load stores".to_string(),
        )
    })?;

    let selected = selection::resolve_ids(&directory, &req.store_ids);
    let draft = MessageDraft {
        title: req.title,
        body: req.body,
    };

    let new_message = match compose::validate(&draft, &selected) {
        Ok(new_message) => new_message,
        Err(errors) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse::from(errors)),
            )
                .into_response());
        }
    };

    match app_state.db.insert_message(new_message, user_id).await {
        Ok(message) => {
            Ok((StatusCode::CREATED, Json(MessageResponse::from(message))).into_response())
        }
        Err(e) => {
            error!("Failed to create message: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create message. Please try again.".to_string(),
            ))
        }
    }
}

/// Delete one of the caller's messages.
#[utoipa::path(
    delete,
    path = "/messages/{message_id}",
    params(
        ("message_id" = Uuid, Path, description = "The message to delete")
    ),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such message"),
        (status = 500, description = "Internal server error")
    ),
    tag = "messages"
)]
pub async fn delete_message_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    match app_state.db.delete_message(message_id, user_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(PortError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Message not found".to_string()))
        }
        Err(e) => {
            error!("Failed to delete message {}: {:?}", message_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete message".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================
