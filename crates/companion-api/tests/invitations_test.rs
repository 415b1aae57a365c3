//! Invitation issue, listing, revocation and redemption over HTTP.

mod helpers;

use helpers::{accept, add_member, invite, setup_test_app, signup_org, TEST_PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn test_redeemed_invitation_creates_member_with_invited_role() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;

    let token = invite(client, &admin, "Mia@Acme.test", "manager").await;
    let manager = accept(client, &token, "Mia").await;

    assert_eq!(manager.organization_id, admin.organization_id);
    assert_eq!(manager.email, "mia@acme.test");

    let me = client
        .get("/api/auth/me")
        .add_header("Authorization", manager.bearer())
        .await;
    let body: Value = me.json();
    assert_eq!(body["role"], "MANAGER");
}

#[tokio::test]
async fn test_token_cannot_be_redeemed_twice() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let token = invite(client, &admin, "eve@acme.test", "EMPLOYEE").await;
    accept(client, &token, "Eve").await;

    let again = client
        .post("/api/auth/invite/accept")
        .json(&json!({ "token": token, "name": "Mallory", "password": TEST_PASSWORD }))
        .await;

    assert_eq!(again.status_code(), 409);
    let body: Value = again.json();
    assert_eq!(body["code"], "INVITATION_ALREADY_USED");
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/auth/invite/accept")
        .json(&json!({ "token": "inv_unknown", "name": "Eve", "password": TEST_PASSWORD }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_revoked_invitation_is_gone() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;

    let issued = client
        .post("/api/auth/invite")
        .add_header("Authorization", admin.bearer())
        .json(&json!({ "invites": [{ "email": "eve@acme.test", "role": "EMPLOYEE" }] }))
        .await;
    let body: Value = issued.json();
    let token = body["results"][0]["token"].as_str().unwrap().to_string();
    let invitation_id = body["results"][0]["invitation"]["id"].as_str().unwrap().to_string();

    let revoked = client
        .delete(&format!("/api/auth/invitations/{}", invitation_id))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(revoked.status_code(), 200);
    let body: Value = revoked.json();
    assert_eq!(body["status"], "REVOKED");

    let twice = client
        .delete(&format!("/api/auth/invitations/{}", invitation_id))
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(twice.status_code(), 409);

    let redeem = client
        .post("/api/auth/invite/accept")
        .json(&json!({ "token": token, "name": "Eve", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(redeem.status_code(), 410);
    let body: Value = redeem.json();
    assert_eq!(body["code"], "INVITATION_REVOKED");
}

#[tokio::test]
async fn test_batch_reports_each_entry() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;

    let response = client
        .post("/api/auth/invite")
        .add_header("Authorization", admin.bearer())
        .json(&json!({
            "invites": [
                { "email": "eve@acme.test", "role": "EMPLOYEE" },
                { "email": admin.email, "role": "EMPLOYEE" },
                { "email": "not-an-email", "role": "EMPLOYEE" },
            ]
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["status"], "ISSUED");
    assert_eq!(body["results"][1]["status"], "FAILED");
    assert_eq!(body["results"][1]["code"], "DUPLICATE");
    assert_eq!(body["results"][2]["code"], "INVALID_INPUT");
    assert!(body["results"][1].get("token").is_none());
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;

    let response = client
        .post("/api/auth/invite")
        .add_header("Authorization", admin.bearer())
        .json(&json!({ "invites": [] }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_employees_cannot_invite() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let employee = add_member(client, &admin, "Eve", "eve@acme.test", "EMPLOYEE").await;

    let response = client
        .post("/api/auth/invite")
        .add_header("Authorization", employee.bearer())
        .json(&json!({ "invites": [{ "email": "x@acme.test", "role": "EMPLOYEE" }] }))
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_manager_cannot_invite_admin() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let manager = add_member(client, &admin, "Mia", "mia@acme.test", "MANAGER").await;

    let response = client
        .post("/api/auth/invite")
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "invites": [{ "email": "boss@acme.test", "role": "ADMIN" }] }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"][0]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_mismatched_sender_or_customer_is_forbidden() {
    let app = setup_test_app().await;
    let client = app.client();
    let acme = signup_org(client, "Acme").await;
    let globex = signup_org(client, "Globex").await;

    let wrong_customer = client
        .post("/api/auth/invite")
        .add_header("Authorization", acme.bearer())
        .json(&json!({
            "invites": [{ "email": "eve@acme.test", "role": "EMPLOYEE" }],
            "customerId": globex.organization_id,
        }))
        .await;
    assert_eq!(wrong_customer.status_code(), 403);

    let wrong_sender = client
        .post("/api/auth/invite")
        .add_header("Authorization", acme.bearer())
        .json(&json!({
            "invites": [{ "email": "eve@acme.test", "role": "EMPLOYEE" }],
            "senderId": globex.id,
        }))
        .await;
    assert_eq!(wrong_sender.status_code(), 403);
}

#[tokio::test]
async fn test_managers_list_only_their_own_invitations() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let manager = add_member(client, &admin, "Mia", "mia@acme.test", "MANAGER").await;
    invite(client, &admin, "a@acme.test", "EMPLOYEE").await;
    invite(client, &manager, "b@acme.test", "EMPLOYEE").await;

    let as_admin = client
        .get("/api/auth/invitations")
        .add_header("Authorization", admin.bearer())
        .await;
    assert_eq!(as_admin.status_code(), 200);
    let all: Vec<Value> = as_admin.json();
    // Mia's own accepted invitation plus the two pending ones
    assert_eq!(all.len(), 3);

    let as_manager = client
        .get("/api/auth/invitations")
        .add_header("Authorization", manager.bearer())
        .await;
    let own: Vec<Value> = as_manager.json();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["email"], "b@acme.test");

    let someone_else = client
        .get(&format!("/api/auth/invitations?senderId={}", admin.id))
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(someone_else.status_code(), 403);
}

#[tokio::test]
async fn test_manager_invitee_reports_to_manager() {
    let app = setup_test_app().await;
    let client = app.client();
    let admin = signup_org(client, "Acme").await;
    let manager = add_member(client, &admin, "Mia", "mia@acme.test", "MANAGER").await;
    let report = add_member(client, &manager, "Eve", "eve@acme.test", "EMPLOYEE").await;

    let me = client
        .get("/api/auth/me")
        .add_header("Authorization", report.bearer())
        .await;
    let body: Value = me.json();
    assert_eq!(body["managerId"], manager.id.to_string());
}
