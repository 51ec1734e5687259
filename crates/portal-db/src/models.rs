//! Database row types. These map directly to SQLite rows.

use portal_types::Role;

pub type UserId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
}

/// A message joined with its author's username.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: MessageId,
    pub user_id: UserId,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
}
