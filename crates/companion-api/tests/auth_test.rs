//! Signup, login and session handling over HTTP.

mod helpers;

use helpers::{add_member, setup_test_app, signup_org, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn test_signup_returns_admin_session() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/api/auth/signup-org")
        .json(&json!({
            "orgName": "Acme",
            "adminName": "Ada",
            "email": "Ada@Acme.test",
            "password": TEST_PASSWORD,
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "ADMIN");
    assert_eq!(body["data"]["user"]["email"], "ada@acme.test");
    assert!(body["data"]["token"].as_str().is_some());
}

#[tokio::test]
async fn test_duplicate_organization_name_conflicts() {
    let app = setup_test_app().await;
    let client = app.client();
    signup_org(client, "Acme").await;

    let response = client
        .post("/api/auth/signup-org")
        .json(&json!({
            "orgName": "Acme",
            "adminName": "Other",
            "email": "other@acme.test",
            "password": TEST_PASSWORD,
        }))
        .await;

    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/auth/signup-org")
        .json(&json!({
            "orgName": "Acme",
            "adminName": "Ada",
            "email": "ada@acme.test",
            "password": "123",
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_login_checks_organization_and_password() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    signup_org(client, "Globex").await;

    let ok = client
        .post("/api/auth/login")
        .json(&json!({ "email": admin.email, "orgName": "Acme", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(ok.status_code(), 200);
    let body: Value = ok.json();
    assert_eq!(body["user"]["id"], admin.id.to_string());

    let wrong_password = client
        .post("/api/auth/login")
        .json(&json!({ "email": admin.email, "orgName": "Acme", "password": "wrong-password" }))
        .await;
    assert_eq!(wrong_password.status_code(), 401);

    let wrong_org = client
        .post("/api/auth/login")
        .json(&json!({ "email": admin.email, "orgName": "Globex", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(wrong_org.status_code(), 401);
    let body: Value = wrong_org.json();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = setup_test_app().await;
    let client = app.client();

    let missing = client.get("/api/auth/me").await;
    assert_eq!(missing.status_code(), 401);

    let garbage = client
        .get("/api/auth/me")
        .add_header("Authorization", "Bearer not-a-token")
        .await;
    assert_eq!(garbage.status_code(), 401);

    let admin = signup_org(client, "Acme").await;
    let me = client
        .get("/api/auth/me")
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(me.status_code(), 200);
    let body: Value = me.json();
    assert_eq!(body["id"], admin.id.to_string());
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let member = add_member(client, &admin, "Eve", "eve@acme.test", "EMPLOYEE").await;

    let deleted = client
        .delete(&format!("/api/auth/users/{}", member.id))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(deleted.status_code(), 200);

    let me = client
        .get("/api/auth/me")
        .add_header("Authorization", member.bearer())
        .await;
    assert_eq!(me.status_code(), 401);
}

#[tokio::test]
async fn test_roster_is_scoped_to_session_organization() {
    let app = setup_test_app().await;
    let client = app.client();
    let acme = signup_org(client, "Acme").await;
    let globex = signup_org(client, "Globex").await;
    add_member(client, &acme, "Bob", "bob@acme.test", "EMPLOYEE").await;

    let own = client
        .get("/api/auth/users")
        .add_header("Authorization", acme.bearer())
        .await;
    assert_eq!(own.status_code(), 200);
    let users: Vec<Value> = own.json();
    assert_eq!(users.len(), 2);

    let foreign = client
        .get(&format!("/api/auth/users?customerId={}", globex.organization_id))
        .add_header("Authorization", acme.bearer())
        .await;
    assert_eq!(foreign.status_code(), 403);
}

#[tokio::test]
async fn test_assign_manager_requires_people_manager_role() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let manager = add_member(client, &admin, "Mia", "mia@acme.test", "MANAGER").await;
    let employee = add_member(client, &admin, "Eve", "eve@acme.test", "EMPLOYEE").await;
    let other = add_member(client, &admin, "Oli", "oli@acme.test", "EMPLOYEE").await;

    let ok = client
        .put(&format!("/api/auth/users/{}/manager", employee.id))
        .add_header("Authorization", admin.bearer())
        .json(&json!({ "managerId": manager.id }))
        .await;
    assert_eq!(ok.status_code(), 200);
    let body: Value = ok.json();
    assert_eq!(body["managerId"], manager.id.to_string());

    let to_employee = client
        .put(&format!("/api/auth/users/{}/manager", employee.id))
        .add_header("Authorization", admin.bearer())
        .json(&json!({ "managerId": other.id }))
        .await;
    assert_eq!(to_employee.status_code(), 400);

    let by_manager = client
        .put(&format!("/api/auth/users/{}/manager", employee.id))
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "managerId": null }))
        .await;
    assert_eq!(by_manager.status_code(), 403);
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = setup_test_app().await;
    let client = app.client();

    let live = client.get("/health").await;
    assert_eq!(live.status_code(), 200);

    let ready = client.get("/health/ready").await;
    assert_eq!(ready.status_code(), 200);
    let body: Value = ready.json();
    assert_eq!(body["database"], "memory");

    let openapi = client.get("/api/openapi.json").await;
    assert_eq!(openapi.status_code(), 200);
    let body: Value = openapi.json();
    assert!(body["paths"]["/api/auth/invite"].is_object());
}
