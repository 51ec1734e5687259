use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use portal_db::{DbError, queries};
use portal_types::{NewUserForm, Role, SessionClaims};

use crate::middleware::require_admin;
use crate::{AppError, AppState, auth, blocking, views};

pub const INVALID_USER_FORM: &str = "All fields are required and role must be admin/user.";
pub const USERNAME_TAKEN: &str = "Username already exists. Try another.";

#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Trimmed username and password must be non-empty; a missing or empty role
/// means `user`.
pub fn validate(form: NewUserForm) -> Option<NewUser> {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.is_empty() {
        return None;
    }

    let role = match form.role.as_deref().map(str::trim) {
        None | Some("") => Role::User,
        Some(raw) => raw.parse().ok()?,
    };

    Some(NewUser {
        username,
        password: form.password,
        role,
    })
}

pub async fn show_users(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, AppError> {
    let session = require_admin(&state, &jar)?;
    render_users(state, session, None).await
}

pub async fn create_user(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Form<NewUserForm>, FormRejection>,
) -> Result<Response, AppError> {
    let session = require_admin(&state, &jar)?;

    // An unreadable body fails validation like an empty form.
    let form = body.map(|Form(form)| form).unwrap_or_default();

    let Some(new_user) = validate(form) else {
        return Ok(render_users(state, session, Some(INVALID_USER_FORM))
            .await?
            .into_response());
    };

    let st = state.clone();
    let username = new_user.username.clone();
    let role = new_user.role;
    let created = blocking(move || {
        let hash = auth::hash_password(&new_user.password)?;
        st.db
            .with_conn(|conn| queries::insert_user(conn, &new_user.username, &hash, new_user.role))
            .map_err(AppError::from)
    })
    .await;

    match created {
        Ok(user_id) => {
            info!(user_id, username = %username, role = %role, admin = %session.username, "User created");
            Ok(Redirect::to("/admin/users").into_response())
        }
        Err(AppError::Store(DbError::UsernameTaken(_))) => {
            warn!(username = %username, "User creation refused: username taken");
            Ok(render_users(state, session, Some(USERNAME_TAKEN))
                .await?
                .into_response())
        }
        Err(e) => Err(e),
    }
}

async fn render_users(
    state: AppState,
    session: SessionClaims,
    error: Option<&'static str>,
) -> Result<Html<String>, AppError> {
    let st = state.clone();
    let users = blocking(move || st.db.with_conn(queries::list_users)).await?;
    Ok(views::admin_page(&state.config, &session, &users, error))
}
