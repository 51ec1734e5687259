use portal_types::Role;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{MessageId, MessageRow, UserId, UserRow};
use crate::{DbError, Result};

// -- Users --

pub fn has_admin(conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE role = 'admin' LIMIT 1", [], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Insert the default administrator unless some admin already exists.
/// A single conditional statement, so two requests racing on an empty store
/// still end with one admin. Returns whether a row was inserted.
pub fn seed_default_admin(conn: &Connection, username: &str, password_hash: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (username, password_hash, role)
         SELECT ?1, ?2, 'admin'
         WHERE NOT EXISTS (SELECT 1 FROM users WHERE role = 'admin')",
        (username, password_hash),
    )?;
    Ok(inserted > 0)
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> Result<UserId> {
    match conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        (username, password_hash, role.as_str()),
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(DbError::UsernameTaken(username.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// All users, newest first.
pub fn list_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, role, created_at FROM users ORDER BY id DESC",
    )?;

    let rows = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Messages --

pub fn insert_message(conn: &Connection, user_id: UserId, content: &str) -> Result<MessageId> {
    conn.execute(
        "INSERT INTO messages (user_id, content) VALUES (?1, ?2)",
        (user_id, content),
    )?;
    Ok(conn.last_insert_rowid())
}

/// The `limit` most recent messages with their author, newest first.
pub fn list_recent_messages(conn: &Connection, limit: u32) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch the author in the same query
    let mut stmt = conn.prepare(
        "SELECT m.id, m.user_id, u.username, m.content, m.created_at
         FROM messages m
         JOIN users u ON u.id = m.user_id
         ORDER BY m.id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author_username: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Delete a message by id. Deleting a missing id is not an error.
/// Returns whether a row was removed.
pub fn delete_message(conn: &Connection, id: MessageId) -> Result<bool> {
    let removed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
    Ok(removed > 0)
}

pub fn count_messages(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    Ok(count)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    let raw_role: String = row.get(3)?;
    let role = raw_role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role,
        created_at: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
