/// Integration tests for the Taskboard API
///
/// These drive the full router (auth layer, handlers, services) over the
/// in-memory store:
/// - Registration, login, and bearer authentication
/// - Projects, invitations, and joining
/// - Task workflow with history and reports
/// - Notifications and the live activity stream

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestContext;
use serde_json::json;
use std::time::Duration as StdDuration;
use tokio_stream::StreamExt;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;

    assert!(!alice.token.is_empty());
    Uuid::parse_str(&alice.id).expect("register returns a uuid");

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let ctx = TestContext::new();
    ctx.register_and_login("alice").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "other" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_rejects_empty_fields() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "username": "", "password": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_are_unauthorized() {
    let ctx = TestContext::new();
    ctx.register_and_login("alice").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "pw")] {
        let (status, body) = ctx
            .send(
                "POST",
                "/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;

    let (status, _) = ctx.send("GET", "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tampered = format!("{}x", alice.token);
    let (status, _) = ctx.send("GET", "/v1/projects", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send("GET", "/v1/projects", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invite_join_and_list_projects() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;

    let project_id = ctx.create_project(&alice, "Roadmap").await;

    let invitation = ctx.invite(&alice, &project_id).await;
    let token = invitation["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);

    // Bob is not a member yet
    let (status, _) = ctx
        .send("GET", &format!("/v1/projects/{}/tasks", project_id), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/join", project_id),
            Some(&bob.token),
            Some(json!({ "token": token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "join failed: {}", body);
    assert_eq!(body["ok"], true);
    assert_eq!(body["project_id"], project_id.as_str());

    let (status, body) = ctx.send("GET", "/v1/projects", Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let projects = body.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Roadmap");

    let (status, _) = ctx
        .send("GET", &format!("/v1/projects/{}/tasks", project_id), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invitation_is_single_use() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;
    let carol = ctx.register_and_login("carol").await;

    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let invitation = ctx.invite(&alice, &project_id).await;
    let join_body = json!({ "token": invitation["token"] });
    let join_uri = format!("/v1/projects/{}/join", project_id);

    let (status, _) = ctx
        .send("POST", &join_uri, Some(&bob.token), Some(join_body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send("POST", &join_uri, Some(&carol.token), Some(join_body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_unknown_and_malformed_tokens_are_invalid() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let join_uri = format!("/v1/projects/{}/join", project_id);

    for token in ["a".repeat(64), "not-a-token".to_string()] {
        let (status, body) = ctx
            .send("POST", &join_uri, Some(&alice.token), Some(json!({ "token": token })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_token");
    }
}

#[tokio::test]
async fn test_expired_invitation_is_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;

    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let invitation = ctx.invite(&alice, &project_id).await;

    let invitation_id = Uuid::parse_str(invitation["invitation_id"].as_str().unwrap()).unwrap();
    let found = ctx
        .store
        .set_invitation_expiry(invitation_id, Utc::now() - Duration::seconds(1))
        .unwrap();
    assert!(found);

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/join", project_id),
            Some(&bob.token),
            Some(json!({ "token": invitation["token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "expired");

    let (_, body) = ctx.send("GET", "/v1/projects", Some(&bob.token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invite_requires_membership() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let mallory = ctx.register_and_login("mallory").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/invite", project_id),
            Some(&mallory.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/invite", Uuid::new_v4()),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_workflow_with_history() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;

    let task = ctx.create_task(&alice, &project_id, "Write docs").await;
    assert_eq!(task["status"], "todo");
    assert_eq!(task["description"], "");
    let task_id = task["id"].as_str().unwrap();

    for (to, from) in [("doing", "todo"), ("done", "doing")] {
        let (status, body) = ctx
            .send(
                "PATCH",
                &format!("/v1/tasks/{}/move", task_id),
                Some(&alice.token),
                Some(json!({ "to_status": to })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "move failed: {}", body);
        assert_eq!(body["ok"], true);
        assert_eq!(body["from"], from);
        assert_eq!(body["to"], to);
    }

    let (status, body) = ctx
        .send("GET", &format!("/v1/tasks/{}/history", task_id), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["from_status"], "todo");
    assert_eq!(history[0]["to_status"], "doing");
    assert_eq!(history[1]["to_status"], "done");
    assert_eq!(history[1]["changed_by"], alice.id.as_str());

    let (_, body) = ctx
        .send("GET", &format!("/v1/projects/{}/tasks", project_id), Some(&alice.token), None)
        .await;
    assert_eq!(body[0]["status"], "done");
}

#[tokio::test]
async fn test_move_to_same_status_is_recorded() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let task = ctx.create_task(&alice, &project_id, "Triage").await;
    let task_id = task["id"].as_str().unwrap();

    let (status, body) = ctx
        .send(
            "PATCH",
            &format!("/v1/tasks/{}/move", task_id),
            Some(&alice.token),
            Some(json!({ "to_status": "todo" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "todo");
    assert_eq!(body["to"], "todo");

    let (_, body) = ctx
        .send("GET", &format!("/v1/tasks/{}/history", task_id), Some(&alice.token), None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_task_with_unknown_assignee_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let tasks_uri = format!("/v1/projects/{}/tasks", project_id);

    let (status, body) = ctx
        .send(
            "POST",
            &tasks_uri,
            Some(&alice.token),
            Some(json!({ "title": "Orphan", "assignee_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "assignee not found");

    // any existing user may be assigned
    let (status, body) = ctx
        .send(
            "POST",
            &tasks_uri,
            Some(&alice.token),
            Some(json!({ "title": "Handoff", "assignee_id": bob.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["assignee_id"], bob.id.as_str());

    let (_, body) = ctx.send("GET", &tasks_uri, Some(&alice.token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_move_rejects_invalid_status_and_unknown_task() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let task = ctx.create_task(&alice, &project_id, "Triage").await;

    let (status, body) = ctx
        .send(
            "PATCH",
            &format!("/v1/tasks/{}/move", task["id"].as_str().unwrap()),
            Some(&alice.token),
            Some(json!({ "to_status": "archived" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid status");

    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("/v1/tasks/{}/move", Uuid::new_v4()),
            Some(&alice.token),
            Some(json!({ "to_status": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "GET",
            &format!("/v1/tasks/{}/history", Uuid::new_v4()),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_member_cannot_touch_tasks() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let mallory = ctx.register_and_login("mallory").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    let task = ctx.create_task(&alice, &project_id, "Secret").await;
    let task_id = task["id"].as_str().unwrap();

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&mallory.token),
            Some(json!({ "title": "Sneaky" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "PATCH",
            &format!("/v1/tasks/{}/move", task_id),
            Some(&mallory.token),
            Some(json!({ "to_status": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("GET", &format!("/v1/tasks/{}/history", task_id), Some(&mallory.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("GET", &format!("/v1/projects/{}/report", project_id), Some(&mallory.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_report_counts() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;

    let (_, body) = ctx
        .send("GET", &format!("/v1/projects/{}/report", project_id), Some(&alice.token), None)
        .await;
    assert_eq!(body, json!({ "todo": 0, "doing": 0, "done": 0 }));

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let task = ctx.create_task(&alice, &project_id, title).await;
        ids.push(task["id"].as_str().unwrap().to_string());
    }
    for (id, to) in [(&ids[0], "doing"), (&ids[1], "done")] {
        let (status, _) = ctx
            .send(
                "PATCH",
                &format!("/v1/tasks/{}/move", id),
                Some(&alice.token),
                Some(json!({ "to_status": to })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx
        .send("GET", &format!("/v1/projects/{}/report", project_id), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "todo": 1, "doing": 1, "done": 1 }));
}

#[tokio::test]
async fn test_notifications_newest_first_and_mark_read() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;

    ctx.invite(&alice, &project_id).await;
    ctx.create_task(&alice, &project_id, "Write docs").await;

    let (status, body) = ctx.send("GET", "/v1/notifications", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body.as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[0]["message"],
        format!("Task \"Write docs\" created in project {}", project_id)
    );
    assert_eq!(
        notifications[1]["message"],
        format!("Invitation created for project {}", project_id)
    );
    assert_eq!(notifications[0]["read"], false);

    let (_, body) = ctx.send("GET", "/v1/notifications", Some(&bob.token), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let notification_id = notifications[0]["id"].as_str().unwrap();
    let read_uri = format!("/v1/notifications/{}/read", notification_id);

    // Only the recipient can mark it
    let (status, _) = ctx.send("POST", &read_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.send("POST", &read_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (_, body) = ctx.send("GET", "/v1/notifications", Some(&alice.token), None).await;
    assert_eq!(body[0]["read"], true);
    assert_eq!(body[1]["read"], false);
}

#[tokio::test]
async fn test_stream_sends_backlog_then_live_events() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let project_id = ctx.create_project(&alice, "Roadmap").await;
    ctx.invite(&alice, &project_id).await;

    let response = ctx
        .send_raw("GET", "/v1/notifications/stream", Some(&alice.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();

    let first = tokio::time::timeout(StdDuration::from_secs(5), body.next())
        .await
        .expect("init event in time")
        .expect("stream open")
        .expect("frame");
    let first = String::from_utf8_lossy(&first).to_string();
    assert!(first.starts_with("event: init\n"), "unexpected frame: {}", first);
    assert!(first.contains("Invitation created for project"));

    ctx.create_task(&alice, &project_id, "Live one").await;

    let next = tokio::time::timeout(StdDuration::from_secs(5), body.next())
        .await
        .expect("live event in time")
        .expect("stream open")
        .expect("frame");
    let next = String::from_utf8_lossy(&next).to_string();
    assert!(next.starts_with("event: task_created\n"), "unexpected frame: {}", next);
    assert!(next.contains("\"title\":\"Live one\""));
    assert!(next.contains("\"type\":\"task_created\""));
}

#[tokio::test]
async fn test_stream_skips_events_from_other_projects() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice").await;
    let bob = ctx.register_and_login("bob").await;
    let alice_project = ctx.create_project(&alice, "Roadmap").await;
    let bob_project = ctx.create_project(&bob, "Side quest").await;

    let response = ctx
        .send_raw("GET", "/v1/notifications/stream", Some(&bob.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    let first = tokio::time::timeout(StdDuration::from_secs(5), body.next())
        .await
        .expect("init event in time")
        .expect("stream open")
        .expect("frame");
    assert!(String::from_utf8_lossy(&first).starts_with("event: init\n"));

    ctx.create_task(&alice, &alice_project, "Private plan").await;
    ctx.create_task(&bob, &bob_project, "Own work").await;

    let next = tokio::time::timeout(StdDuration::from_secs(5), body.next())
        .await
        .expect("live event in time")
        .expect("stream open")
        .expect("frame");
    let next = String::from_utf8_lossy(&next).to_string();
    assert!(next.starts_with("event: task_created\n"), "unexpected frame: {}", next);
    assert!(next.contains("\"title\":\"Own work\""), "unexpected frame: {}", next);
    assert!(!next.contains("Private plan"));
}

#[tokio::test]
async fn test_stream_requires_authentication() {
    let ctx = TestContext::new();

    let response = ctx.send_raw("GET", "/v1/notifications/stream", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
