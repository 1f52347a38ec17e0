//! services/api/src/web/middleware.rs
//!
//! Actor-resolution middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::config::AuthMode;
use crate::web::state::AppState;

/// Middleware that resolves the acting user for every protected request.
///
/// In `Required` mode the auth session cookie is validated against the
/// database; missing or invalid sessions get 401 Unauthorized. In `Demo`
/// mode every request acts as the configured placeholder user. Either way
/// the resolved user_id lands in the request extensions for handlers to use.
pub async fn resolve_actor(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = match state.config.auth_mode {
        AuthMode::Demo => state.config.demo_user_id,
        AuthMode::Required => {
            // 1. Extract cookie header
            let cookie_header = req
                .headers()
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .ok_or(StatusCode::UNAUTHORIZED)?;

            // 2. Parse session ID from cookie
            let auth_session_id = cookie_header
                .split(';')
                .find_map(|c| {
                    let c = c.trim();
                    c.strip_prefix("session=")
                })
                .ok_or(StatusCode::UNAUTHORIZED)?;

            // 3. Validate auth session in database, get user_id
            state
                .db
                .validate_auth_session(auth_session_id)
                .await
                .map_err(|e| {
                    error!("Failed to validate auth session: {:?}", e);
                    StatusCode::UNAUTHORIZED
                })?
        }
    };

    // 4. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::web::test_support::MockDb;
    use axum::http::Request;
    use axum::{body::Body, middleware as axum_middleware, routing::get, Extension, Router};
    use chrono::{Duration, Utc};
    use storecast_core::ports::DatabaseService;
    use tower::ServiceExt;
    use tracing::Level;
    use uuid::Uuid;

    async fn whoami(Extension(user_id): Extension<Uuid>) -> String {
        user_id.to_string()
    }

    /// A one-route app with the actor middleware in front, so requests can
    /// be driven through the real extraction path.
    fn app(auth_mode: AuthMode, demo_user_id: Uuid, db: Arc<MockDb>) -> Router {
        let db: Arc<dyn DatabaseService> = db;
        let state = Arc::new(AppState {
            db,
            config: Arc::new(Config {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                database_url: "postgres://unused".to_owned(),
                log_level: Level::INFO,
                auth_mode,
                demo_user_id,
                page_size: 10,
                cors_origin: "http://localhost:3000".to_owned(),
            }),
        });
        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum_middleware::from_fn_with_state(state, resolve_actor))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn demo_mode_attributes_every_request_to_the_placeholder_actor() {
        let demo_user_id = Uuid::new_v4();
        let app = app(AuthMode::Demo, demo_user_id, Arc::new(MockDb::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, demo_user_id.to_string());
    }

    #[tokio::test]
    async fn required_mode_rejects_a_request_without_a_cookie() {
        let app = app(AuthMode::Required, Uuid::nil(), Arc::new(MockDb::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn required_mode_rejects_an_unknown_session_cookie() {
        let app = app(AuthMode::Required, Uuid::nil(), Arc::new(MockDb::new()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, "session=not-a-real-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn required_mode_resolves_the_cookie_to_its_user() {
        let db = Arc::new(MockDb::new());
        let user_id = Uuid::new_v4();
        db.create_auth_session("sess-1", user_id, Utc::now() + Duration::days(1))
            .await
            .expect("session should be stored");
        let app = app(AuthMode::Required, Uuid::nil(), db);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, "theme=dark; session=sess-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, user_id.to_string());
    }
}
