#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use tempfile::TempDir;
use tower::ServiceExt;

use portal_api::{AppState, AppStateInner, Config};
use portal_db::models::UserRow;
use portal_db::queries;

pub const ADMIN_LOGIN: &str = "username=admin&password=Admin%40123";

pub struct TestApp {
    // Held so the database file outlives the test.
    _dir: TempDir,
    pub state: AppState,
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<&str, String> = HashMap::from([
            ("PORTAL_SECRET", "test-secret".to_string()),
            (
                "PORTAL_DB_PATH",
                dir.path().join("portal.db").display().to_string(),
            ),
            ("PORTAL_RUN_MODE", "Test Rig".to_string()),
            ("PORTAL_HOSTNAME", "test-host".to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let state = AppStateInner::new(config);
        let app = portal_api::router(state.clone());
        Self {
            _dir: dir,
            state,
            app,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(req.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// POST an arbitrary body, optionally without any content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut req = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            req = req.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(req.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// Log in and return the `name=value` cookie pair to send back.
    pub async fn login(&self, form: &str) -> String {
        let resp = self.post_form("/login", form, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login failed for {form}");
        assert_eq!(location(&resp), "/chat");
        session_cookie(&resp).expect("login response sets the session cookie")
    }

    pub async fn admin_cookie(&self) -> String {
        self.login(ADMIN_LOGIN).await
    }

    /// Create a plain user through the admin endpoint and log in as them.
    pub async fn user_cookie(&self, username: &str, password: &str) -> String {
        let admin = self.admin_cookie().await;
        let resp = self
            .post_form(
                "/admin/users",
                &format!("username={username}&password={password}&role=user"),
                Some(&admin),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        self.login(&format!("username={username}&password={password}"))
            .await
    }

    pub fn users(&self) -> Vec<UserRow> {
        self.state.db.with_conn(queries::list_users).unwrap()
    }

    pub fn message_count(&self) -> i64 {
        self.state.db.with_conn(queries::count_messages).unwrap()
    }
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// The `portal_session=...` pair from a response's Set-Cookie header.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("portal_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
