use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde_json::{json, Value};
use session_auth::auth::{
    AuthEventKind, AuthService, InMemoryRefreshTokenStore, RecordingAuditSink, TokenIssuer,
};
use session_auth::configuration::JwtSettings;
use session_auth::middleware::REQUEST_ID_HEADER;
use session_auth::startup::run;
use session_auth::users::{InMemoryUserStore, User};

const EMAIL: &str = "a@x.com";
const PASSWORD: &str = "secret";

pub struct TestApp {
    pub address: String,
    pub users: Arc<InMemoryUserStore>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
    pub audit: Arc<RecordingAuditSink>,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/login", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login_ok(&self) -> (String, String) {
        let response = self.login(EMAIL, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    async fn refresh(&self, user_id: &str, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/refresh", &self.address))
            .json(&json!({ "user_id": user_id, "refresh_token": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn logout(&self, access_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/logout", &self.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

fn spawn_app_with_ttl(refresh_ttl: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let users = Arc::new(InMemoryUserStore::new());
    users.insert(User {
        id: "u1".to_string(),
        email: EMAIL.to_string(),
        role: "admin".to_string(),
        password_hash: bcrypt::hash(PASSWORD, 4).expect("Failed to hash password"),
    });
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new("test:"));
    let audit = Arc::new(RecordingAuditSink::new());

    let issuer = TokenIssuer::new(&JwtSettings {
        secret: "integration-secret-at-least-32-characters".to_string(),
        access_token_expiry: 180,
        refresh_token_expiry: 3600,
        issuer: "test".to_string(),
    })
    .expect("Failed to build token issuer");

    let auth = AuthService::new(
        users.clone(),
        refresh_tokens.clone(),
        issuer,
        audit.clone(),
        refresh_ttl,
        StdDuration::from_secs(5),
    );

    let server = run(listener, auth).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        users,
        refresh_tokens,
        audit,
        client: reqwest::Client::new(),
    }
}

fn spawn_app() -> TestApp {
    spawn_app_with_ttl(Duration::hours(1))
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_200_for_valid_credentials() {
    let app = spawn_app();

    let response = app.login(EMAIL, PASSWORD).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert!(!body["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 180);
    assert!(!app.refresh_tokens.is_empty());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();

    let wrong_password = app.login(EMAIL, "WrongPassword123").await;
    let unknown_email = app.login("nobody@x.com", PASSWORD).await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_password["code"], unknown_email["code"]);
    assert_eq!(wrong_password["message"], unknown_email["message"]);

    assert_eq!(
        app.audit.kinds(),
        vec![AuthEventKind::LoginFailed, AuthEventKind::LoginFailed]
    );
}

#[tokio::test]
async fn every_response_carries_its_own_request_id() {
    let app = spawn_app();

    let first = app.login(EMAIL, "WrongPassword123").await;
    let second = app.login(EMAIL, "WrongPassword123").await;

    let first_id = first.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
    let second_id = second.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
    assert!(!first_id.is_empty());
    assert_ne!(first_id, second_id);

    let body: Value = first.json().await.unwrap();
    assert!(!body["error_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_returns_400_for_malformed_body() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"password": PASSWORD}), "missing email"),
        (json!({"email": EMAIL}), "missing password"),
        (json!({"email": "notanemail", "password": PASSWORD}), "invalid email"),
        (json!({"email": EMAIL, "password": ""}), "empty password"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/auth/login", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject request: {}", reason);
    }

    assert!(app.audit.events().is_empty());
}

#[tokio::test]
async fn login_records_client_ip_in_audit_trail() {
    let app = spawn_app();
    app.login_ok().await;

    let event = app.audit.events().pop().unwrap();
    assert_eq!(event.kind, AuthEventKind::LoginSuccess);
    assert_eq!(event.user_id.as_deref(), Some("u1"));
    assert!(event.client_ip.as_deref().unwrap_or("").starts_with("127.0.0.1"));
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let app = spawn_app();
    let (access_token, refresh_token) = app.login_ok().await;

    let response = app.refresh("u1", &refresh_token).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    let renewed = body["access_token"].as_str().unwrap();
    assert_ne!(renewed, access_token);
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
async fn refresh_with_superseded_token_is_rejected() {
    let app = spawn_app();
    let (_, first) = app.login_ok().await;
    let (_, second) = app.login_ok().await;
    assert_ne!(first, second);

    let response = app.refresh("u1", &first).await;
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");

    assert_eq!(200, app.refresh("u1", &second).await.status().as_u16());
}

#[tokio::test]
async fn refresh_with_forged_token_is_rejected() {
    let app = spawn_app();
    app.login_ok().await;

    let response = app.refresh("u1", "forged.token.value").await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_fails_when_token_was_never_stored() {
    let app = spawn_app_with_ttl(Duration::seconds(-1));
    let (_, refresh_token) = app.login_ok().await;

    assert!(app.refresh_tokens.is_empty());
    assert_eq!(401, app.refresh("u1", &refresh_token).await.status().as_u16());
}

#[tokio::test]
async fn refresh_for_deleted_account_returns_404() {
    let app = spawn_app();
    let (_, refresh_token) = app.login_ok().await;

    app.users.remove("u1");

    let response = app.refresh("u1", &refresh_token).await;
    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_requires_access_token() {
    let app = spawn_app();

    let missing = app
        .client
        .post(&format!("{}/auth/logout", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, missing.status().as_u16());

    let invalid = app.logout("not-a-jwt").await;
    assert_eq!(401, invalid.status().as_u16());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = spawn_app();
    let (access_token, _) = app.login_ok().await;

    assert_eq!(204, app.logout(&access_token).await.status().as_u16());
    assert_eq!(204, app.logout(&access_token).await.status().as_u16());
    assert!(app.refresh_tokens.is_empty());
}

#[tokio::test]
async fn full_session_lifecycle() {
    let app = spawn_app();

    let (access_token, refresh_token) = app.login_ok().await;

    let response = app.refresh("u1", &refresh_token).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_ne!(body["access_token"].as_str().unwrap(), access_token);

    assert_eq!(204, app.logout(&access_token).await.status().as_u16());

    let response = app.refresh("u1", &refresh_token).await;
    assert_eq!(401, response.status().as_u16());

    let kinds = app.audit.kinds();
    assert_eq!(
        kinds,
        vec![
            AuthEventKind::LoginSuccess,
            AuthEventKind::RefreshSuccess,
            AuthEventKind::LogoutSuccess,
            AuthEventKind::RefreshFailed,
        ]
    );
}
