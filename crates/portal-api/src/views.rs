//! Server-rendered pages. Plain strings, every interpolated value escaped.

use std::fmt::Write;

use axum::response::Html;

use portal_db::models::{MessageRow, UserRow};
use portal_types::SessionClaims;

use crate::config::Config;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
header{display:flex;justify-content:space-between;align-items:baseline}\
.banner{background:#eef;padding:.4rem .8rem;border-radius:4px;font-size:.9rem}\
.error{color:#b00020}\
ul.feed{list-style:none;padding:0}ul.feed li{border-bottom:1px solid #ddd;padding:.6rem 0}\
table{border-collapse:collapse;width:100%}td,th{border-bottom:1px solid #ddd;padding:.3rem;text-align:left}";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(
    title: &str,
    config: &Config,
    session: Option<&SessionClaims>,
    error: Option<&str>,
    body: &str,
) -> Html<String> {
    let nav = match session {
        Some(s) => {
            let admin_link = if s.is_admin() {
                r#" <a href="/admin/users">Users</a>"#
            } else {
                ""
            };
            format!(
                r#"<nav>Signed in as <strong>{}</strong> ({}) <a href="/chat">Posts</a>{} <a href="/logout">Log out</a></nav>"#,
                escape(&s.username),
                s.role,
                admin_link
            )
        }
        None => String::new(),
    };
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title><style>{STYLE}</style></head>
<body>
<header><h1>University Portal</h1>{nav}</header>
<p class="banner">Mode: <strong>{mode}</strong> &middot; Host: <code>{host}</code></p>
{error}
{body}
</body>
</html>
"#,
        title = escape(title),
        mode = escape(&config.run_mode),
        host = escape(&config.hostname),
    ))
}

pub fn login_page(config: &Config, error: Option<&str>) -> Html<String> {
    let body = r#"<form method="post" action="/login">
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input name="password" type="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>"#;
    layout("Login • University Portal", config, None, error, body)
}

pub fn chat_page(
    config: &Config,
    session: &SessionClaims,
    messages: &[MessageRow],
    total: i64,
    error: Option<&str>,
) -> Html<String> {
    let mut body = String::from(
        r#"<form method="post" action="/chat">
<textarea name="content" rows="3" cols="60" placeholder="Share something with the campus"></textarea>
<button type="submit">Post</button>
</form>
"#,
    );

    let _ = write!(body, "<h2>Latest posts ({} total)</h2>", total);
    if messages.is_empty() {
        body.push_str("<p>No posts yet.</p>");
    } else {
        body.push_str(r#"<ul class="feed">"#);
        for m in messages {
            let delete = if session.is_admin() {
                format!(r#" <a href="/admin/messages/delete/{}">Delete</a>"#, m.id)
            } else {
                String::new()
            };
            let _ = write!(
                body,
                "<li><strong>{}</strong> <time>{}</time>{}<p>{}</p></li>",
                escape(&m.author_username),
                escape(&m.created_at),
                delete,
                escape(&m.content)
            );
        }
        body.push_str("</ul>");
    }

    layout("Portal • University Posts", config, Some(session), error, &body)
}

pub fn admin_page(
    config: &Config,
    session: &SessionClaims,
    users: &[UserRow],
    error: Option<&str>,
) -> Html<String> {
    let mut body = String::from(
        r#"<h2>Create user</h2>
<form method="post" action="/admin/users">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Role <select name="role"><option value="user">user</option><option value="admin">admin</option></select></label>
<button type="submit">Create</button>
</form>
<h2>Users</h2>
<table><tr><th>ID</th><th>Username</th><th>Role</th><th>Created</th></tr>
"#,
    );

    for u in users {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            u.id,
            escape(&u.username),
            u.role,
            escape(&u.created_at)
        );
    }
    body.push_str("</table>");

    layout("Admin • University Portal", config, Some(session), error, &body)
}

pub fn forbidden_page() -> Html<String> {
    Html(
        "<!doctype html><title>403 Forbidden</title><h1>Forbidden</h1>\
<p>This page is for administrators only. <a href=\"/chat\">Back to posts</a></p>"
            .to_string(),
    )
}

pub fn server_error_page() -> Html<String> {
    Html(
        "<!doctype html><title>500 Internal Server Error</title><h1>Internal Server Error</h1>\
<p>Something went wrong on our side.</p>"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
        assert_eq!(escape("plain"), "plain");
    }
}
