//! Integration tests: full HTTP flows (register, login, profile, logout,
//! password reset) over an in-memory SQLite store.

use authd::db::{run_migrations, UserStore};
use authd::{create_app, AppState, Auth};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt;

// Single pooled connection so every statement sees the same in-memory database.
async fn test_app() -> axum::Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    let auth = Auth::new(UserStore::new(pool));
    create_app(AppState { auth })
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// The `name=value` pair from the login response's Set-Cookie header.
fn session_cookie(res: &Response) -> String {
    res.headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn json_body(res: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn index_says_bienvenue() {
    let app = test_app().await;
    let res = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json.get("message").and_then(|v| v.as_str()), Some("Bienvenue"));
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app().await;
    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn register_then_duplicate() {
    let app = test_app().await;

    let res = app
        .clone()
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json.get("email").and_then(|v| v.as_str()), Some("a@x.com"));
    assert_eq!(
        json.get("message").and_then(|v| v.as_str()),
        Some("user created")
    );

    let res = app
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw2"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let app = test_app().await;
    let res = app
        .oneshot(form_request("POST", "/users", "email=not-an-email&password=pw1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_cookie_and_profile_resolves_it() {
    let app = test_app().await;
    app.clone()
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw1"))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(form_request("POST", "/sessions", "email=a@x.com&password=pw1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);
    assert!(cookie.starts_with("session_id="));
    let json = json_body(res).await;
    assert_eq!(json.get("message").and_then(|v| v.as_str()), Some("logged in"));

    let res = app
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json.get("email").and_then(|v| v.as_str()), Some("a@x.com"));
}

#[tokio::test]
async fn login_with_bad_credentials_is_401() {
    let app = test_app().await;
    app.clone()
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw1"))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(form_request("POST", "/sessions", "email=a@x.com&password=wrong"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(form_request(
            "POST",
            "/sessions",
            "email=ghost@x.com&password=pw1",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_without_valid_session_is_403() {
    let app = test_app().await;

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, "session_id=bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_redirects_and_invalidates_session() {
    let app = test_app().await;
    app.clone()
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw1"))
        .await
        .unwrap();
    let res = app
        .clone()
        .oneshot(form_request("POST", "/sessions", "email=a@x.com&password=pw1"))
        .await
        .unwrap();
    let cookie = session_cookie(&res);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/sessions")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(res.status().is_redirection());
    assert_eq!(
        res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/")
    );

    // The old token no longer resolves anywhere.
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/sessions")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_without_cookie_is_403() {
    let app = test_app().await;
    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reset_password_flow() {
    let app = test_app().await;
    app.clone()
        .oneshot(form_request("POST", "/users", "email=a@x.com&password=pw1"))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(form_request("POST", "/reset_password", "email=a@x.com"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    let token = json
        .get("reset_token")
        .and_then(|v| v.as_str())
        .expect("reset_token in response")
        .to_string();

    let body = format!("email=a@x.com&reset_token={}&new_password=pw2", token);
    let res = app
        .clone()
        .oneshot(form_request("PUT", "/reset_password", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(
        json.get("message").and_then(|v| v.as_str()),
        Some("Password updated")
    );

    // New password logs in, the old one no longer does.
    let res = app
        .clone()
        .oneshot(form_request("POST", "/sessions", "email=a@x.com&password=pw2"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(form_request("POST", "/sessions", "email=a@x.com&password=pw1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The token was single-use.
    let res = app
        .oneshot(form_request("PUT", "/reset_password", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reset_password_for_unknown_email_is_403() {
    let app = test_app().await;
    let res = app
        .oneshot(form_request("POST", "/reset_password", "email=ghost@x.com"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
