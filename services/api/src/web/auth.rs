//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use storecast_core::ports::DatabaseService;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

/// Lifetime of an auth session, and of its cookie.
const SESSION_TTL_DAYS: i64 = 30;

/// Symbols that satisfy the password special-character rule.
const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

//=========================================================================================
// Validation Rules
//=========================================================================================

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Accepts any `local@domain.tld` shape without whitespace. This matches
/// the admin front-end's check; real deliverability is not our problem.
fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// At least 8 bytes with an uppercase letter, a digit, and a symbol.
fn validate_password(password: &str) -> bool {
    let long_enough = password.len() >= 8;
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_number = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    long_enough && has_uppercase && has_number && has_symbol
}

//=========================================================================================
// Session Issuance
//=========================================================================================

/// Creates a fresh auth session for `user_id` and returns the cookie that
/// carries it.
async fn issue_session(
    db: &dyn DatabaseService,
    user_id: Uuid,
) -> Result<String, (StatusCode, String)> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    db.create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create session".to_string(),
            )
        })?;

    Ok(format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        Duration::days(SESSION_TTL_DAYS).num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !validate_email(&req.email) {
        return Err((
            StatusCode::BAD_REQUEST,
            "A valid email address is required".to_string(),
        ));
    }
    if !validate_password(&req.password) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters and include an uppercase letter, a number, and a symbol"
                .to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    let user = state
        .db
        .create_user_with_email(&req.email, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create user".to_string(),
            )
        })?;

    let cookie = issue_session(state.db.as_ref(), user.user_id).await?;

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email.unwrap_or_default(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_creds = state.db.get_user_by_email(&req.email).await.map_err(|e| {
        error!("Failed to get user: {:?}", e);
        (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        )
    })?;

    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ));
    }

    let cookie = issue_session(state.db.as_ref(), user_creds.user_id).await?;

    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    let auth_session_id = cookie_header
        .split(';')
        .find_map(|c| {
            let c = c.trim();
            c.strip_prefix("session=")
        })
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to logout".to_string(),
            )
        })?;

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthMode, Config};
    use crate::web::test_support::MockDb;
    use rstest::rstest;
    use tracing::Level;

    fn test_state() -> Arc<AppState> {
        let db: Arc<dyn DatabaseService> = Arc::new(MockDb::new());
        Arc::new(AppState {
            db,
            config: Arc::new(Config {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                database_url: "postgres://unused".to_owned(),
                log_level: Level::INFO,
                auth_mode: AuthMode::Required,
                demo_user_id: Uuid::nil(),
                page_size: 10,
                cors_origin: "http://localhost:3000".to_owned(),
            }),
        })
    }

    #[rstest]
    #[case("admin@example.com", true)]
    #[case("first.last@sub.domain.co.uk", true)]
    #[case("no-at-sign.example.com", false)]
    #[case("spaces in@example.com", false)]
    #[case("missing-tld@example", false)]
    #[case("", false)]
    fn email_validation(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(validate_email(email), expected);
    }

    #[rstest]
    #[case("Passw0rd!", true)]
    #[case("Sh0rt!", false)] // under 8 characters
    #[case("passw0rd!", false)] // no uppercase
    #[case("Password!", false)] // no digit
    #[case("Passw0rd", false)] // no symbol
    fn password_validation(#[case] password: &str, #[case] expected: bool) {
        assert_eq!(validate_password(password), expected);
    }

    #[tokio::test]
    async fn signup_rejects_an_implausible_email() {
        let state = test_state();
        let result = signup_handler(
            State(state),
            Json(SignupRequest {
                email: "not-an-email".to_owned(),
                password: "Passw0rd!".to_owned(),
            }),
        )
        .await;

        let (status, _) = result.err().expect("signup should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_sets_a_session_cookie() {
        let state = test_state();
        let result = signup_handler(
            State(state),
            Json(SignupRequest {
                email: "admin@example.com".to_owned(),
                password: "Passw0rd!".to_owned(),
            }),
        )
        .await;

        let response = result.ok().expect("signup should succeed").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("a session cookie");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn logout_deletes_the_session_and_expires_the_cookie() {
        let state = test_state();
        let user = state
            .db
            .create_user_with_email("admin@example.com", "not-a-real-hash")
            .await
            .ok()
            .expect("user should be created");
        let cookie = issue_session(state.db.as_ref(), user.user_id)
            .await
            .ok()
            .expect("session should be issued");
        let session_id = cookie
            .strip_prefix("session=")
            .and_then(|rest| rest.split(';').next())
            .expect("cookie carries the session id")
            .to_owned();

        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; session={}", session_id).parse().unwrap(),
        );
        let result = logout_handler(State(state.clone()), headers).await;

        let response = result.ok().expect("logout should succeed").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("a clearing cookie");
        assert!(cleared.contains("Max-Age=0"));
        assert!(state.db.validate_auth_session(&session_id).await.is_err());
    }

    #[tokio::test]
    async fn logout_without_a_cookie_is_unauthorized() {
        let state = test_state();
        let result = logout_handler(State(state), axum::http::HeaderMap::new()).await;

        let (status, _) = result.err().expect("logout should fail");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_verifies_the_password() {
        let state = test_state();
        signup_handler(
            State(state.clone()),
            Json(SignupRequest {
                email: "admin@example.com".to_owned(),
                password: "Passw0rd!".to_owned(),
            }),
        )
        .await
        .ok()
        .expect("signup should succeed");

        let wrong = login_handler(
            State(state.clone()),
            Json(LoginRequest {
                email: "admin@example.com".to_owned(),
                password: "WrongPass1!".to_owned(),
            }),
        )
        .await;
        let (status, _) = wrong.err().expect("login should fail");
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let right = login_handler(
            State(state),
            Json(LoginRequest {
                email: "admin@example.com".to_owned(),
                password: "Passw0rd!".to_owned(),
            }),
        )
        .await;
        let response = right.ok().expect("login should succeed").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
