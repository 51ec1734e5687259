use serde::{Deserialize, Serialize};

use crate::models::Role;

// -- Session --

/// Claims carried by the signed session cookie. Shared by the login handler
/// (which issues them) and the route guards (which verify them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

impl SessionClaims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

// -- Forms --
//
// Every field defaults to empty so a missing field is a validation error
// rendered inline rather than an extractor rejection.

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Absent means `user`.
    pub role: Option<String>,
}
