//! Test utilities for integration testing

use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

use crate::api::models::profiles::Role;
use crate::auth::password;
use crate::config::{Config, EmailTransportConfig, UploadsConfig};
use crate::db::handlers::{Profiles, Repository};
use crate::db::models::profiles::ProfileCreateDBRequest;
use crate::types::ProfileId;
use crate::AppState;

/// Test config: file email transport and uploads under a per-process temp dir.
pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!("echoes-test-{}", std::process::id()));

    let mut config = Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        uploads: UploadsConfig {
            dir: temp_dir.join("uploads"),
            max_file_size: 5 * 1024 * 1024,
        },
        ..Default::default()
    };
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.join("emails").to_string_lossy().into_owned(),
    };
    // Cookies over plain HTTP in tests
    config.auth.native.session.cookie_secure = false;
    config
}

/// A TestServer over the full router, with a cookie jar so each server acts
/// as one signed-in browser session.
pub fn create_test_app(pool: PgPool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    let router = crate::create_router(state).expect("Failed to build router");

    let mut server = TestServer::new(router).expect("Failed to create test server");
    server.save_cookies();
    server
}

/// Insert a profile directly (bypassing registration) with a hashed password.
pub async fn seed_profile(pool: &PgPool, email: &str, role: Role, plain_password: &str) -> ProfileId {
    let password_hash = password::hash_string(plain_password).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut profiles = Profiles::new(&mut conn);
    profiles
        .create(&ProfileCreateDBRequest {
            email: email.to_string(),
            password_hash: Some(password_hash),
            role,
            full_name: Some(format!("Test {}", email.split('@').next().unwrap_or("user"))),
            avatar_url: None,
            date_of_birth: None,
        })
        .await
        .expect("Failed to seed profile")
        .id
}

/// Sign the server's session in as the given account.
pub async fn login(server: &TestServer, email: &str, password: &str) {
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code(), 200, "login failed for {email}: {}", response.text());
}

/// Seed an account and return a server already signed in as it.
pub async fn logged_in_server(pool: &PgPool, email: &str, role: Role) -> TestServer {
    seed_profile(pool, email, role, "correct horse battery").await;
    let server = create_test_app(pool.clone());
    login(&server, email, "correct horse battery").await;
    server
}
