use std::sync::OnceLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use portal_db::Connection;
use portal_db::models::UserRow;
use portal_db::queries;
use portal_types::LoginForm;

use crate::{AppError, AppState, blocking, middleware, session, views};

/// Shown for both unknown usernames and wrong passwords.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Constant-time comparison of `password` against a stored PHC hash string.
/// An unparseable hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Look the user up and check the password. `None` covers both "no such user"
/// and "wrong password"; an unknown user still costs one hash verification so
/// response timing does not reveal which usernames exist.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, AppError> {
    match queries::find_user_by_username(conn, username)? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
        Some(_) => Ok(None),
        None => {
            if let Some(dummy) = dummy_hash() {
                verify_password(password, dummy);
            }
            Ok(None)
        }
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("portal-timing-equalizer").ok())
        .as_deref()
}

// -- Handlers --

pub async fn home(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    if middleware::current_session(&state, &jar).is_some() {
        Redirect::to("/chat")
    } else {
        Redirect::to("/login")
    }
}

pub async fn show_login(State(state): State<AppState>) -> Html<String> {
    views::login_page(&state.config, None)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();
    let password = form.password;

    let st = state.clone();
    let lookup_name = username.clone();
    let user = blocking(move || {
        st.db
            .with_conn(|conn| authenticate(conn, &lookup_name, &password))
    })
    .await?;

    let Some(user) = user else {
        warn!(username = %username, "Failed login attempt");
        return Ok(views::login_page(&state.config, Some(INVALID_CREDENTIALS)).into_response());
    };

    let token = session::issue_token(&state.config, &user)?;
    info!(user_id = user.id, username = %user.username, role = %user.role, "User logged in");

    Ok((jar.add(session::session_cookie(token)), Redirect::to("/chat")).into_response())
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (session::clear(jar), Redirect::to("/login"))
}
