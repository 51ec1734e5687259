pub mod api;
pub mod models;

pub use api::{LoginForm, NewUserForm, PostForm, SessionClaims};
pub use models::{Role, UnknownRole};
