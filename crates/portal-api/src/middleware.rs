use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use portal_db::{migrations, queries};
use portal_types::SessionClaims;

use crate::{AppError, AppState, AppStateInner, auth, blocking, session};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Runs before every route: create the schema if missing and seed the
/// default admin if no admin exists.
pub async fn prepare_store(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let st = state.clone();
    blocking(move || prepare(&st)).await?;
    Ok(next.run(req).await)
}

pub fn prepare(state: &AppStateInner) -> Result<(), AppError> {
    state.db.with_conn(|conn| {
        migrations::ensure_schema(conn)?;
        if queries::has_admin(conn)? {
            return Ok(());
        }

        let hash = auth::hash_password(&state.config.admin_password)?;
        if queries::seed_default_admin(conn, DEFAULT_ADMIN_USERNAME, &hash)? {
            info!("Seeded default admin account '{}'", DEFAULT_ADMIN_USERNAME);
        } else if !queries::has_admin(conn)? {
            // The name is held by a non-admin account, so nothing was inserted.
            warn!(
                "No admin account exists and '{}' is taken by a non-admin user; create an admin manually",
                DEFAULT_ADMIN_USERNAME
            );
        }
        Ok(())
    })
}

// -- Guards --
//
// Called first thing in a protected handler:
//     let session = require_session(&state, &jar)?;

pub fn current_session(state: &AppStateInner, jar: &CookieJar) -> Option<SessionClaims> {
    session::from_jar(&state.config, jar)
}

/// Any logged-in user. Anonymous requests are redirected to the login page.
pub fn require_session(state: &AppStateInner, jar: &CookieJar) -> Result<SessionClaims, AppError> {
    current_session(state, jar).ok_or(AppError::Unauthenticated)
}

/// Admins only. Anonymous requests are redirected like [`require_session`];
/// a logged-in non-admin gets a hard 403.
pub fn require_admin(state: &AppStateInner, jar: &CookieJar) -> Result<SessionClaims, AppError> {
    let session = require_session(state, jar)?;
    if !session.is_admin() {
        info!(user_id = session.user_id, username = %session.username, "Admin page refused");
        return Err(AppError::Forbidden);
    }
    Ok(session)
}
