//! Shared helpers for handler tests: drive the real router with
//! `tower::ServiceExt::oneshot` against the in-memory state.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use tower::ServiceExt;

use crate::app::build_app;
use crate::state::AppState;

pub const BOUNDARY: &str = "x-test-boundary";

pub fn test_app() -> (Router, AppState) {
    let state = AppState::fake();
    (build_app(state.clone()), state)
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("router never errors")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().expect("valid cookie"));
    req
}

fn multipart_signup_body(
    username: &str,
    password: &str,
    birthdate: &str,
    image: Option<(&str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [
        ("username", username),
        ("password", password),
        ("birthdate", birthdate),
    ] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profileImage\"; filename=\"avatar\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn signup_request(
    username: &str,
    password: &str,
    birthdate: &str,
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/signup")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_signup_body(
            username, password, birthdate, image,
        )))
        .unwrap()
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn session_cookie(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// POST /login with an already url-encoded password and return the response
/// plus the session cookie it set.
pub async fn login(app: &Router, username: &str, password: &str) -> (Response<Body>, String) {
    let resp = send(
        app,
        form_request("/login", &format!("username={username}&password={password}")),
    )
    .await;
    let cookie = session_cookie(&resp);
    (resp, cookie)
}
