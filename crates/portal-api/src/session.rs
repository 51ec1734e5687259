//! Signed session cookie.
//!
//! The session lives entirely client-side as an HS256 token in an HttpOnly
//! cookie. Nothing is stored server-side, so logging out only drops the
//! cookie, and an expired or tampered token reads as "no session".

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use portal_db::models::UserRow;
use portal_types::SessionClaims;

use crate::config::Config;

pub const SESSION_COOKIE: &str = "portal_session";

pub fn issue_token(config: &Config, user: &UserRow) -> Result<String, jsonwebtoken::errors::Error> {
    let expires = chrono::Utc::now() + chrono::Duration::hours(i64::from(config.session_ttl_hours));
    let claims = SessionClaims {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

pub fn decode_token(secret: &str, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// The session carried by this request's cookie, if it verifies.
pub fn from_jar(config: &Config, jar: &CookieJar) -> Option<SessionClaims> {
    let cookie = jar.get(SESSION_COOKIE)?;
    decode_token(&config.session_secret, cookie.value())
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_types::Role;

    fn config(secret: &str) -> Config {
        let secret = secret.to_string();
        Config::from_lookup(move |key| (key == "PORTAL_SECRET").then(|| secret.clone())).unwrap()
    }

    fn user() -> UserRow {
        UserRow {
            id: 42,
            username: "gita".into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: String::new(),
        }
    }

    #[test]
    fn token_carries_identity_and_role() {
        let config = config("one");
        let token = issue_token(&config, &user()).unwrap();

        let claims = decode_token("one", &token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "gita");
        assert!(claims.is_admin());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token(&config("one"), &user()).unwrap();
        assert!(decode_token("two", &token).is_none());
        assert!(decode_token("one", "not-a-token").is_none());
    }

    #[test]
    fn longest_allowed_ttl_still_issues_tokens() {
        let mut config = config("one");
        config.session_ttl_hours = crate::config::MAX_SESSION_TTL_HOURS;

        let token = issue_token(&config, &user()).unwrap();
        let claims = decode_token("one", &token).unwrap();
        assert!(claims.exp > chrono::Utc::now().timestamp() as usize);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = SessionClaims {
            user_id: 1,
            username: "old".into(),
            role: Role::User,
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"one"),
        )
        .unwrap();
        assert!(decode_token("one", &token).is_none());
    }
}
