//! Review requests, submissions and the manager dashboard over HTTP.

mod helpers;

use axum_test::TestServer;
use helpers::{add_member, setup_test_app, signup_org, TestUser};
use serde_json::{json, Value};
use uuid::Uuid;

/// Admin, a manager and two of the manager's reports.
struct Team {
    admin: TestUser,
    manager: TestUser,
    alice: TestUser,
    bob: TestUser,
}

async fn team(client: &TestServer) -> Team {
    let admin = signup_org(client, "Acme").await;
    let manager = add_member(client, &admin, "Mia", "mia@acme.test", "MANAGER").await;
    let alice = add_member(client, &manager, "Alice", "alice@acme.test", "EMPLOYEE").await;
    let bob = add_member(client, &manager, "Bob", "bob@acme.test", "EMPLOYEE").await;
    Team {
        admin,
        manager,
        alice,
        bob,
    }
}

async fn request_review(
    client: &TestServer,
    requester: &TestUser,
    target: &TestUser,
    reviewer: &TestUser,
) -> Value {
    let response = client
        .post("/api/reviews/requests")
        .add_header("Authorization", requester.bearer())
        .json(&json!({
            "targetId": target.id,
            "reviewerId": reviewer.id,
            "quarter": "2024-Q3",
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}

fn ratings(score: i32) -> Value {
    let principle_id = Uuid::new_v4().to_string();
    json!({ "ratings": { principle_id: { "score": score, "comment": "Solid" } } })
}

#[tokio::test]
async fn test_review_lifecycle_reaches_dashboard() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;

    let review = request_review(client, &t.manager, &t.alice, &t.bob).await;
    assert_eq!(review["status"], "PENDING");
    assert_eq!(review["requesterId"], t.manager.id.to_string());
    let review_id = review["id"].as_str().unwrap().to_string();

    let assigned = client
        .get("/api/reviews/requests?status=pending")
        .add_header("Authorization", t.bob.bearer())
        .await;
    assert_eq!(assigned.status_code(), 200);
    let pending: Vec<Value> = assigned.json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], review_id);

    let dashboard_path = format!("/api/reviews/dashboard/manager/{}", t.manager.id);
    let before: Value = client
        .get(&dashboard_path)
        .add_header("Authorization", t.manager.bearer())
        .await
        .json();
    assert_eq!(before["quarters"]["2024-Q3"][0]["status"], "NOT_STARTED");

    let submitted = client
        .post(&format!("/api/reviews/requests/{}/submission", review_id))
        .add_header("Authorization", t.bob.bearer())
        .json(&ratings(4))
        .await;
    assert_eq!(submitted.status_code(), 200, "{}", submitted.text());

    let after = client
        .get(&dashboard_path)
        .add_header("Authorization", t.manager.bearer())
        .await;
    assert_eq!(after.status_code(), 200);
    let after: Value = after.json();
    let entry = &after["quarters"]["2024-Q3"][0];
    assert_eq!(entry["status"], "COMPLETED");
    assert_eq!(entry["reportee"]["name"], "Alice");
    assert_eq!(entry["reviewer"]["name"], "Bob");

    let read_back = client
        .get(&format!("/api/reviews/requests/{}/submission", review_id))
        .add_header("Authorization", t.manager.bearer())
        .await;
    assert_eq!(read_back.status_code(), 200);
}

#[tokio::test]
async fn test_submission_is_final() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;
    let review = request_review(client, &t.manager, &t.alice, &t.bob).await;
    let path = format!(
        "/api/reviews/requests/{}/submission",
        review["id"].as_str().unwrap()
    );

    let first = client
        .post(&path)
        .add_header("Authorization", t.bob.bearer())
        .json(&ratings(5))
        .await;
    assert_eq!(first.status_code(), 200);

    let second = client
        .post(&path)
        .add_header("Authorization", t.bob.bearer())
        .json(&ratings(1))
        .await;
    assert_eq!(second.status_code(), 409);
    let body: Value = second.json();
    assert_eq!(body["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_only_assigned_reviewer_submits_in_range_scores() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;
    let review = request_review(client, &t.manager, &t.alice, &t.bob).await;
    let path = format!(
        "/api/reviews/requests/{}/submission",
        review["id"].as_str().unwrap()
    );

    let by_target = client
        .post(&path)
        .add_header("Authorization", t.alice.bearer())
        .json(&ratings(3))
        .await;
    assert_eq!(by_target.status_code(), 403);

    let out_of_range = client
        .post(&path)
        .add_header("Authorization", t.bob.bearer())
        .json(&ratings(6))
        .await;
    assert_eq!(out_of_range.status_code(), 400);

    let empty = client
        .post(&path)
        .add_header("Authorization", t.bob.bearer())
        .json(&json!({ "ratings": {} }))
        .await;
    assert_eq!(empty.status_code(), 400);
}

#[tokio::test]
async fn test_request_rules() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;

    let by_employee = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.alice.bearer())
        .json(&json!({ "targetId": t.bob.id, "reviewerId": t.alice.id }))
        .await;
    assert_eq!(by_employee.status_code(), 403);

    let self_review = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.manager.bearer())
        .json(&json!({ "targetId": t.alice.id, "reviewerId": t.alice.id }))
        .await;
    assert_eq!(self_review.status_code(), 400);

    let bad_quarter = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.manager.bearer())
        .json(&json!({ "targetId": t.alice.id, "reviewerId": t.bob.id, "quarter": "Q3-2024" }))
        .await;
    assert_eq!(bad_quarter.status_code(), 400);

    let spoofed_requester = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.manager.bearer())
        .json(&json!({
            "targetId": t.alice.id,
            "reviewerId": t.bob.id,
            "requesterId": t.admin.id,
        }))
        .await;
    assert_eq!(spoofed_requester.status_code(), 403);

    let outsider = signup_org(client, "Globex").await;
    let cross_org = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.manager.bearer())
        .json(&json!({ "targetId": t.alice.id, "reviewerId": outsider.id }))
        .await;
    assert_eq!(cross_org.status_code(), 404);
}

#[tokio::test]
async fn test_default_quarter_is_current() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;

    let response = client
        .post("/api/reviews/requests")
        .add_header("Authorization", t.admin.bearer())
        .json(&json!({ "targetId": t.alice.id, "reviewerId": t.bob.id }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let quarter = body["quarter"].as_str().unwrap();
    assert_eq!(quarter.len(), 7);
    assert_eq!(&quarter[4..6], "-Q");
}

#[tokio::test]
async fn test_decline_only_while_pending() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;
    let review = request_review(client, &t.manager, &t.alice, &t.bob).await;
    let review_id = review["id"].as_str().unwrap();

    let declined = client
        .post(&format!("/api/reviews/requests/{}/decline", review_id))
        .add_header("Authorization", t.bob.bearer())
        .await;
    assert_eq!(declined.status_code(), 200);
    let body: Value = declined.json();
    assert_eq!(body["status"], "DECLINED");

    let submit = client
        .post(&format!("/api/reviews/requests/{}/submission", review_id))
        .add_header("Authorization", t.bob.bearer())
        .json(&ratings(3))
        .await;
    assert_eq!(submit.status_code(), 409);

    let dashboard: Value = client
        .get(&format!("/api/reviews/dashboard/manager/{}", t.manager.id))
        .add_header("Authorization", t.manager.bearer())
        .await
        .json();
    assert_eq!(dashboard["quarters"]["2024-Q3"][0]["status"], "NOT_STARTED");
    assert_eq!(dashboard["quarters"]["2024-Q3"][0]["requestStatus"], "DECLINED");
}

#[tokio::test]
async fn test_dashboard_and_reviewer_lists_are_private() {
    let app = setup_test_app().await;
    let client = app.client();
    let t = team(client).await;

    let other_dashboard = client
        .get(&format!("/api/reviews/dashboard/manager/{}", t.manager.id))
        .add_header("Authorization", t.alice.bearer())
        .await;
    assert_eq!(other_dashboard.status_code(), 403);

    let admin_view = client
        .get(&format!("/api/reviews/dashboard/manager/{}", t.manager.id))
        .add_header("Authorization", t.admin.bearer())
        .await;
    assert_eq!(admin_view.status_code(), 200);

    let other_reviewer = client
        .get(&format!("/api/reviews/requests?reviewerId={}", t.bob.id))
        .add_header("Authorization", t.alice.bearer())
        .await;
    assert_eq!(other_reviewer.status_code(), 403);

    let bad_status = client
        .get("/api/reviews/requests?status=started")
        .add_header("Authorization", t.bob.bearer())
        .await;
    assert_eq!(bad_status.status_code(), 400);
}
