mod common;

use axum::http::StatusCode;
use common::{TestApp, body_text};

#[tokio::test]
async fn healthz_is_plain_ok() {
    let t = TestApp::new();

    let resp = t.get("/healthz", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "ok\n");
}

#[tokio::test]
async fn whoami_reports_mode_and_host() {
    let t = TestApp::new();

    let resp = t.get("/whoami", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "mode=Test Rig host=test-host\n");
}

#[tokio::test]
async fn demo_endpoints_need_no_session() {
    let t = TestApp::new();
    let cookie = t.admin_cookie().await;

    for cookie in [None, Some(cookie.as_str())] {
        let resp = t.get("/healthz", cookie).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn non_numeric_delete_id_is_rejected() {
    let t = TestApp::new();
    let admin = t.admin_cookie().await;

    let resp = t.get("/admin/messages/delete/abc", Some(&admin)).await;
    assert!(resp.status().is_client_error());
    assert_eq!(t.message_count(), 0);
}
