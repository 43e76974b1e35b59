mod common;

use axum::http::StatusCode;
use common::{session_cookie, TestApp};
use serde_json::json;

#[tokio::test]
async fn signup_sets_cookie_and_creates_empty_profile() {
    let app = TestApp::new();
    let cookie = app.signup("ada@example.com").await;

    let me = app.get("/me", &cookie).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "ada@example.com");
    assert!(me.body["profile"].is_object());
    assert!(me.body["profile"]["weight_kg"].is_null());

    let targets = app.get("/me/targets", &cookie).await;
    assert_eq!(targets.status, StatusCode::OK);
    assert!(targets.body.is_null());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new();
    app.signup("ada@example.com").await;

    let again = app
        .request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "another password" })),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert!(again.body["error"].is_string());
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "email": "bob@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_password() {
    let app = TestApp::new();
    app.signup("ada@example.com").await;

    let wrong = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong horse" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    let cookie = session_cookie(&ok);
    assert_eq!(app.get("/me", &cookie).await.status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_need_a_live_session() {
    let app = TestApp::new();

    let anonymous = app.request("GET", "/stats/day", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"], "Unauthorized");

    let forged = app.get("/me", "session=not-a-session").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let cookie = app.signup("ada@example.com").await;
    let logout = app.request("POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.set_cookie.unwrap_or_default().contains("Max-Age=0"));

    assert_eq!(app.get("/me", &cookie).await.status, StatusCode::UNAUTHORIZED);
}
