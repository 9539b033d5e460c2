use serde_json::json;
use sqlx::PgPool;

use crate::api::models::profiles::Role;
use crate::test_utils::{create_test_app, logged_in_server, seed_profile};

#[sqlx::test]
#[test_log::test]
async fn test_register_login_me(pool: PgPool) {
    let server = create_test_app(pool.clone());

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "New.Patient@Example.com",
            "password": "a sturdy password",
            "full_name": "New Patient"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    // Session cookie from registration is live immediately
    let me = server.get("/api/v1/profiles/me").await;
    assert_eq!(me.status_code(), 200);
    let profile: serde_json::Value = me.json();
    // Email was normalized on the way in
    assert_eq!(profile["email"], "new.patient@example.com");
    assert_eq!(profile["role"], "user");

    // Same email again is rejected
    let dup = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "new.patient@example.com", "password": "another password" }))
        .await;
    assert_eq!(dup.status_code(), 400);
}

#[sqlx::test]
#[test_log::test]
async fn test_register_rejects_short_password(pool: PgPool) {
    let server = create_test_app(pool);

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "short@example.com", "password": "tiny" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[sqlx::test]
#[test_log::test]
async fn test_login_wrong_password_is_uniform(pool: PgPool) {
    seed_profile(&pool, "known@example.com", Role::User, "right password").await;
    let server = create_test_app(pool);

    let wrong_password = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "known@example.com", "password": "wrong password" }))
        .await;
    assert_eq!(wrong_password.status_code(), 401);

    let unknown_account = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "unknown@example.com", "password": "whatever" }))
        .await;
    assert_eq!(unknown_account.status_code(), 401);

    // Same message either way: no account enumeration
    assert_eq!(wrong_password.text(), unknown_account.text());
}

#[sqlx::test]
#[test_log::test]
async fn test_protected_routes_require_session(pool: PgPool) {
    let server = create_test_app(pool);

    for path in ["/api/v1/profiles/me", "/api/v1/notifications", "/api/v1/overview", "/api/v1/sponsorships"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 401, "expected 401 for {path}");
    }
}

#[sqlx::test]
#[test_log::test]
async fn test_signout_clears_session_and_redirects(pool: PgPool) {
    let server = logged_in_server(&pool, "patient@example.com", Role::User).await;

    let response = server
        .post("/api/v1/auth/signout")
        .form(&[("redirect_to", "/login")])
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "/login");

    // Cookie was cleared; the session is gone
    let me = server.get("/api/v1/profiles/me").await;
    assert_eq!(me.status_code(), 401);
}

#[sqlx::test]
#[test_log::test]
async fn test_signout_ignores_absolute_redirects(pool: PgPool) {
    let server = logged_in_server(&pool, "patient@example.com", Role::User).await;

    let response = server
        .post("/api/v1/auth/signout")
        .form(&[("redirect_to", "https://evil.example.com/")])
        .await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "/");
}

#[sqlx::test]
#[test_log::test]
async fn test_password_reset_roundtrip(pool: PgPool) {
    use crate::db::handlers::{PasswordResetTokens, Profiles};

    seed_profile(&pool, "reset@example.com", Role::User, "old password").await;
    let server = create_test_app(pool.clone());

    // The request endpoint always claims success
    let response = server
        .post("/api/v1/auth/password-resets")
        .json(&json!({ "email": "reset@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let response = server
        .post("/api/v1/auth/password-resets")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // The raw token only exists inside the email, so mint one directly for
    // the confirm leg
    let mut conn = pool.acquire().await.unwrap();
    let user = Profiles::new(&mut conn).get_by_email("reset@example.com").await.unwrap().unwrap();
    let (raw_token, token) = PasswordResetTokens::new(&mut conn)
        .create_for_user(user.id, std::time::Duration::from_secs(30 * 60))
        .await
        .unwrap();
    drop(conn);

    let confirm = server
        .post(&format!("/api/v1/auth/password-resets/{}/confirm", token.id))
        .json(&json!({ "token": raw_token, "new_password": "brand new password" }))
        .await;
    assert_eq!(confirm.status_code(), 200);

    // Old password dead, new one works
    let old = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reset@example.com", "password": "old password" }))
        .await;
    assert_eq!(old.status_code(), 401);

    let new = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reset@example.com", "password": "brand new password" }))
        .await;
    assert_eq!(new.status_code(), 200);

    // The token was single-use
    let replay = server
        .post(&format!("/api/v1/auth/password-resets/{}/confirm", token.id))
        .json(&json!({ "token": raw_token, "new_password": "yet another password" }))
        .await;
    assert_eq!(replay.status_code(), 400);
}
