//! Authentication flow integration tests.
//!
//! Tests verify:
//! - Login redirect carries the PKCE challenge and sets the session cookie
//! - The full callback flow against a stub provider server
//! - State mismatch and provider-denied handling
//! - Session inspection and logout

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::test_utils::{extract_cookie, TestApp, TEST_FRONTEND_URL};

// =============================================================================
// Stub Provider
// =============================================================================

/// Spawn a stub OAuth provider on an ephemeral port.
///
/// Implements the token and user endpoints with canned responses; the
/// authorize endpoint is browser-facing and never called by the service.
async fn spawn_stub_provider() -> String {
    let app = Router::new()
        .route(
            "/2/oauth2/token",
            post(|| async {
                Json(serde_json::json!({
                    "token_type": "bearer",
                    "access_token": "stub-access-token",
                    "refresh_token": "stub-refresh-token",
                    "expires_in": 7200,
                }))
            }),
        )
        .route(
            "/2/users/me",
            get(|| async {
                Json(serde_json::json!({
                    "data": {
                        "id": "42",
                        "name": "Stub User",
                        "username": "stubuser",
                    }
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Pull a query parameter out of a URL.
fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_redirects_with_pkce_challenge() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/login")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("code_challenge_method=S256"));
    assert!(query_param(location, "code_challenge").is_some());
    assert!(query_param(location, "state").is_some());

    // A session cookie was issued and verifies against the signer
    let cookie = extract_cookie(&response).expect("login should set a session cookie");
    let value = cookie.strip_prefix("gridx_sid=").unwrap();
    assert!(app.cookie.verify(value).is_some());
}

#[tokio::test]
async fn test_login_sets_httponly_cookie() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/login")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
}

// =============================================================================
// Callback Flow
// =============================================================================

#[tokio::test]
async fn test_full_callback_flow_against_stub_provider() {
    let provider = spawn_stub_provider().await;
    let app = TestApp::with_oauth_provider(&provider);

    // Step 1: login issues the cookie and the authorize redirect
    let request = Request::builder()
        .uri("/auth/login")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = extract_cookie(&response).unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    let state = query_param(location, "state").unwrap();

    // Step 2: provider redirects back with a code; the service exchanges
    // it at the stub and stores the token + profile
    let request = Request::builder()
        .uri(format!("/auth/callback?code=stub-code&state={}", state))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        TEST_FRONTEND_URL
    );

    // Step 3: the session is now authenticated
    let request = Request::builder()
        .uri("/auth/user")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["user"]["username"], "stubuser");
    assert_eq!(json["user"]["id"], "42");
}

#[tokio::test]
async fn test_callback_with_provider_error_redirects_to_frontend() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/callback?error=access_denied")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with(TEST_FRONTEND_URL));
    assert_eq!(query_param(location, "error").as_deref(), Some("access_denied"));
}

#[tokio::test]
async fn test_callback_without_session_redirects_with_error() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/callback?code=abc&state=xyz")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        query_param(location, "error").as_deref(),
        Some("no_pending_authorization")
    );
}

#[tokio::test]
async fn test_callback_state_mismatch_rejected() {
    let provider = spawn_stub_provider().await;
    let app = TestApp::with_oauth_provider(&provider);

    let request = Request::builder()
        .uri("/auth/login")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let cookie = extract_cookie(&response).unwrap();

    // Wrong state value
    let request = Request::builder()
        .uri("/auth/callback?code=stub-code&state=wrong-state")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(
        query_param(location, "error").as_deref(),
        Some("state_mismatch")
    );

    // The session did not gain a token
    let request = Request::builder()
        .uri("/auth/user")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Session Inspection and Logout
// =============================================================================

#[tokio::test]
async fn test_user_without_session_unauthorized() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/user")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_user_with_forged_cookie_unauthorized() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/auth/user")
        .header(header::COOKIE, "gridx_sid=forged.deadbeef")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_destroys_session_and_expires_cookie() {
    use gridx::auth::{SessionData, UserProfile};

    let app = TestApp::new();
    let cookie = app
        .seed_session(SessionData {
            access_token: Some("token".to_string()),
            user: Some(UserProfile {
                id: "42".to_string(),
                name: "Stub User".to_string(),
                username: "stubuser".to_string(),
            }),
            ..Default::default()
        })
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    // The store no longer has the session
    assert!(app.sessions.is_empty().await);

    // Subsequent user lookups with the old cookie fail
    let request = Request::builder()
        .uri("/auth/user")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
