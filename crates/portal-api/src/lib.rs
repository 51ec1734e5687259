pub mod auth;
pub mod chaos;
pub mod config;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod session;
pub mod users;
pub mod views;

use std::sync::Arc;

use axum::{Router, routing::get};

use portal_db::Database;

pub use config::Config;
pub use error::AppError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
}

impl AppStateInner {
    pub fn new(config: Config) -> AppState {
        Arc::new(Self {
            db: Database::new(&config.db_path),
            config,
        })
    }
}

/// All routes, with the store-preparation layer applied to every one of them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/login", get(auth::show_login).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/chat", get(messages::show_chat).post(messages::post_message))
        .route("/admin/users", get(users::show_users).post(users::create_user))
        .route("/admin/messages/delete/{id}", get(messages::delete_message))
        .route("/healthz", get(chaos::healthz))
        .route("/whoami", get(chaos::whoami))
        .route("/crash", get(chaos::crash))
        .route("/burn", get(chaos::burn))
        .route("/oom", get(chaos::oom))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::prepare_store,
        ))
        .with_state(state)
}

/// Run blocking store or hashing work off the async runtime.
pub(crate) async fn blocking<F, T, E>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}
