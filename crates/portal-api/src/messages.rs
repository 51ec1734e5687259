use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use portal_db::models::MessageId;
use portal_db::{DbError, queries};
use portal_types::{PostForm, SessionClaims};

use crate::middleware::{require_admin, require_session};
use crate::{AppError, AppState, blocking, views};

/// How many messages the board shows.
pub const FEED_LIMIT: u32 = 30;

pub const EMPTY_POST: &str = "Post cannot be empty.";

pub async fn show_chat(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, AppError> {
    let session = require_session(&state, &jar)?;
    render_feed(state, session, None).await
}

pub async fn post_message(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, AppError> {
    let session = require_session(&state, &jar)?;

    // An unreadable body is treated as an empty post.
    let form = body.map(|Form(form)| form).unwrap_or_default();
    let content = form.content.trim().to_string();
    if content.is_empty() {
        return Ok(render_feed(state, session, Some(EMPTY_POST)).await?.into_response());
    }

    let st = state.clone();
    let user_id = session.user_id;
    let id = blocking(move || {
        st.db
            .with_conn(|conn| queries::insert_message(conn, user_id, &content))
    })
    .await?;

    debug!(message_id = id, user_id, "Message posted");

    // Redirect so a refresh does not re-submit the form.
    Ok(Redirect::to("/chat").into_response())
}

/// Always lands back on the board, whether or not the id existed.
pub async fn delete_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<MessageId>,
) -> Result<Redirect, AppError> {
    let session = require_admin(&state, &jar)?;

    let st = state.clone();
    let removed = blocking(move || st.db.with_conn(|conn| queries::delete_message(conn, id))).await?;

    if removed {
        info!(message_id = id, admin = %session.username, "Message deleted");
    } else {
        debug!(message_id = id, "Delete requested for missing message");
    }

    Ok(Redirect::to("/chat"))
}

async fn render_feed(
    state: AppState,
    session: SessionClaims,
    error: Option<&'static str>,
) -> Result<Html<String>, AppError> {
    let st = state.clone();
    let (messages, total) = blocking(move || {
        st.db.with_conn(|conn| {
            let messages = queries::list_recent_messages(conn, FEED_LIMIT)?;
            let total = queries::count_messages(conn)?;
            Ok::<_, DbError>((messages, total))
        })
    })
    .await?;

    Ok(views::chat_page(&state.config, &session, &messages, total, error))
}
