//! End-to-end HTTP tests against the in-memory store

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use taskkeep::core::auth::{Argon2idHasher, JwtConfig, JwtService};
use taskkeep::core::router::{Repositories, RouterOptions, Services, app_router};

const NAME: &str = "alice1234";
const PASSWORD: &str = "Abcdef1!";
const LAPTOP: [u8; 4] = [192, 168, 1, 10];
const PHONE: [u8; 4] = [10, 0, 0, 7];

fn app() -> Router {
    let services = Services::new(
        Repositories::in_memory(),
        Arc::new(Argon2idHasher::with_cost("pepper", 64, 1, 1)),
        JwtService::new(JwtConfig::new("integration_signing_key")),
    );
    app_router(services, RouterOptions::default())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    device: [u8; 4],
    access: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = access {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((device, 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn signup(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/signup",
        LAPTOP,
        None,
        Some(json!({ "name": name, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    body
}

async fn signin(app: &Router, name: &str, device: [u8; 4]) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/signin",
        device,
        None,
        Some(json!({ "name": name, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signin failed: {body}");
    body
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body[key].as_str().unwrap()
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_signup_and_profile() {
    let app = app();
    let account = signup(&app, NAME).await;
    assert_eq!(account["name"], NAME);
    assert!(account.get("passwordHash").is_none());

    let session = signin(&app, NAME, LAPTOP).await;
    let (status, profile) = send(
        &app,
        "GET",
        "/api/v1/profile",
        LAPTOP,
        Some(field(&session, "accessToken")),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], account["id"]);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_name() {
    let app = app();
    signup(&app, NAME).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/signup",
        LAPTOP,
        None,
        Some(json!({ "name": NAME, "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "user with specified name already exists");
}

#[tokio::test]
async fn test_signup_rejects_weak_password() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/signup",
        LAPTOP,
        None,
        Some(json!({ "name": NAME, "password": "abcdefgh" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password must contain latin uppercase letters");
}

#[tokio::test]
async fn test_profile_update_and_delete() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;
    let access = field(&session, "accessToken").to_string();

    let (status, updated) = send(
        &app,
        "POST",
        "/api/v1/profile",
        LAPTOP,
        Some(access.as_str()),
        Some(json!({ "name": "alice5678", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "alice5678");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/delete",
        LAPTOP,
        Some(access.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The access token is still cryptographically valid, the account is gone
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/profile",
        LAPTOP,
        Some(access.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ACCOUNT_NOT_FOUND");

    // Sessions went with the account
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": field(&session, "refreshToken") })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_signin_wrong_password_is_generic() {
    let app = app();
    signup(&app, NAME).await;

    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/v1/signin",
        LAPTOP,
        None,
        Some(json!({ "name": NAME, "password": "Wrongpw1!" })),
    )
    .await;
    let (missing_status, missing_body) = send(
        &app,
        "POST",
        "/api/v1/signin",
        LAPTOP,
        None,
        Some(json!({ "name": "nobody123", "password": PASSWORD })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, missing_body);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;
    let first = field(&session, "refreshToken").to_string();

    let (status, rotated) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(field(&rotated, "refreshToken"), first);

    // A used refresh token cannot be replayed
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": first })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_refresh_from_other_device_burns_session() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;
    let token = field(&session, "refreshToken").to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        PHONE,
        None,
        Some(json!({ "refreshToken": token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "DEVICE_MISMATCH");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_from_cookie() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;

    let mut request = Request::builder()
        .method("POST")
        .uri("/api/v1/refresh")
        .header(
            header::COOKIE,
            format!("session={}", field(&session, "refreshToken")),
        )
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((LAPTOP, 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_session_cap_revokes_all_sessions() {
    let app = app();
    signup(&app, NAME).await;

    let mut sessions = Vec::new();
    for _ in 0..11 {
        sessions.push(signin(&app, NAME, LAPTOP).await);
    }

    // The eleventh login wiped the first ten
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": field(&sessions[0], "refreshToken") })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": field(&sessions[10], "refreshToken") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;
    let refresh = json!({ "refreshToken": field(&session, "refreshToken") });

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/logout",
        LAPTOP,
        Some(field(&session, "accessToken")),
        Some(refresh.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = send(&app, "POST", "/api/v1/refresh", LAPTOP, None, Some(refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_cannot_revoke_another_accounts_session() {
    let app = app();
    signup(&app, NAME).await;
    signup(&app, "bobby5678").await;
    let alice = signin(&app, NAME, LAPTOP).await;
    let bob = signin(&app, "bobby5678", PHONE).await;
    let alice_refresh = json!({ "refreshToken": field(&alice, "refreshToken") });

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/logout",
        PHONE,
        Some(field(&bob, "accessToken")),
        Some(alice_refresh.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Alice's session is untouched
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(alice_refresh),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_refresh_body_is_rejected() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;

    for (uri, access) in [
        ("/api/v1/refresh", None),
        ("/api/v1/logout", Some(field(&session, "accessToken"))),
    ] {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = access {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let mut request = builder.body(Body::from("{\"refreshToken\":")).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((LAPTOP, 40000))));

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    // Nothing was revoked
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/refresh",
        LAPTOP,
        None,
        Some(json!({ "refreshToken": field(&session, "refreshToken") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();

    for (method, uri) in [
        ("GET", "/api/v1/profile"),
        ("POST", "/api/v1/logout"),
        ("GET", "/api/v1/tasks"),
    ] {
        let (status, _) = send(&app, method, uri, LAPTOP, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/tasks",
        LAPTOP,
        Some("not.a.jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn test_task_lifecycle() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;
    let access = field(&session, "accessToken").to_string();

    let (status, task) = send(
        &app,
        "POST",
        "/api/v1/tasks",
        LAPTOP,
        Some(access.as_str()),
        Some(json!({ "name": "  buy milk  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["name"], "buy milk");
    assert_eq!(task["completed"], false);

    let uri = format!("/api/v1/tasks/{}", field(&task, "id"));

    let (status, updated) = send(
        &app,
        "PUT",
        &uri,
        LAPTOP,
        Some(access.as_str()),
        Some(json!({ "name": "buy oat milk", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);

    let (status, list) = send(
        &app,
        "GET",
        "/api/v1/tasks",
        LAPTOP,
        Some(access.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", &uri, LAPTOP, Some(access.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &uri, LAPTOP, Some(access.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_task_rejects_blank_name() {
    let app = app();
    signup(&app, NAME).await;
    let session = signin(&app, NAME, LAPTOP).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tasks",
        LAPTOP,
        Some(field(&session, "accessToken")),
        Some(json!({ "name": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty name specified");
}

#[tokio::test]
async fn test_tasks_are_isolated_between_accounts() {
    let app = app();
    signup(&app, NAME).await;
    signup(&app, "bobby5678").await;
    let alice = signin(&app, NAME, LAPTOP).await;
    let bob = signin(&app, "bobby5678", PHONE).await;

    let (_, task) = send(
        &app,
        "POST",
        "/api/v1/tasks",
        LAPTOP,
        Some(field(&alice, "accessToken")),
        Some(json!({ "name": "buy milk" })),
    )
    .await;
    let uri = format!("/api/v1/tasks/{}", field(&task, "id"));
    let bob_access = field(&bob, "accessToken");

    for method in ["GET", "DELETE"] {
        let (status, body) = send(&app, method, &uri, PHONE, Some(bob_access), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method}");
        assert_eq!(body["code"], "FORBIDDEN");
    }

    let (status, list) = send(&app, "GET", "/api/v1/tasks", PHONE, Some(bob_access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_without_database() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", LAPTOP, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
