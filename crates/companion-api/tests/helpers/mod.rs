//! Test helpers: build the router over an in-memory store.
//!
//! Run from workspace root: `cargo test -p companion-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use companion_api::setup::{build_state, routes};
use companion_core::Config;
use companion_services::LogInvitationNotifier;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long";
pub const TEST_PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub server: TestServer,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// A signed-in member.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn from_session(user: &Value, token: &Value) -> Self {
        TestUser {
            id: parse_uuid(&user["id"]),
            organization_id: parse_uuid(&user["organizationId"]),
            email: user["email"].as_str().unwrap_or_default().to_string(),
            token: token.as_str().expect("session token").to_string(),
        }
    }
}

pub fn parse_uuid(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("expected uuid, got {}", value))
}

pub async fn setup_test_app() -> TestApp {
    let config = Config::for_memory(TEST_JWT_SECRET);
    let state = build_state(&config, None, Arc::new(LogInvitationNotifier))
        .await
        .expect("Failed to build application state");
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");
    TestApp { server }
}

/// New organization; returns its signed-in admin.
pub async fn signup_org(client: &TestServer, org_name: &str) -> TestUser {
    let response = client
        .post("/api/auth/signup-org")
        .json(&json!({
            "orgName": org_name,
            "adminName": format!("{} Admin", org_name),
            "email": format!("admin@{}.test", org_name.to_lowercase()),
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let body: Value = response.json();
    TestUser::from_session(&body["data"]["user"], &body["data"]["token"])
}

/// Issue one invitation and return its raw token.
pub async fn invite(client: &TestServer, sender: &TestUser, email: &str, role: &str) -> String {
    let response = client
        .post("/api/auth/invite")
        .add_header("Authorization", sender.bearer())
        .json(&json!({ "invites": [{ "email": email, "role": role }] }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let body: Value = response.json();
    assert_eq!(body["count"], 1, "{}", body);
    body["results"][0]["token"]
        .as_str()
        .expect("issued token")
        .to_string()
}

pub async fn accept(client: &TestServer, token: &str, name: &str) -> TestUser {
    let response = client
        .post("/api/auth/invite/accept")
        .json(&json!({ "token": token, "name": name, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let body: Value = response.json();
    TestUser::from_session(&body["user"], &body["token"])
}

/// Invite and immediately redeem.
pub async fn add_member(
    client: &TestServer,
    sender: &TestUser,
    name: &str,
    email: &str,
    role: &str,
) -> TestUser {
    let token = invite(client, sender, email, role).await;
    accept(client, &token, name).await
}
