mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use lms_backend::routes::router;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::harness;

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness().await;
    let (status, _) = send(router(h.state.clone()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    h.repo.set_unavailable(true);
    let (status, _) = send(router(h.state), get("/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_get_course_view() {
    let h = harness().await;
    let (status, body) = send(router(h.state), get("/api/courses/C1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instructor"]["id"], "U1");
    assert!(body["instructor"].get("password_hash").is_none());
    assert_eq!(body["modules"][0]["lessons"][0]["id"], "L2");
    assert_eq!(body["modules"][0]["lessons"][0]["type"], "video");
}

#[tokio::test]
async fn test_missing_course_is_404() {
    let h = harness().await;
    let (status, body) = send(router(h.state), get("/api/courses/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "404 Not Found");
    assert_eq!(body["message"], "Course not found");
}

#[tokio::test]
async fn test_create_course_with_taken_slug_conflicts() {
    let h = harness().await;
    let payload = json!({
        "title": "Another",
        "slug": "course-c1",
        "instructor_id": "U1"
    });
    let (status, _) = send(
        router(h.state),
        json_request("POST", "/api/courses", payload),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_soft_and_hard_delete_lesson() {
    let h = harness().await;
    let app = router(h.state);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/lessons/L2")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app.clone(), get("/api/lessons/L2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/lessons/L1?hard=true")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(app, get("/api/courses/C1")).await;
    assert_eq!(body["modules"][0]["lessons"], json!([]));
}

#[tokio::test]
async fn test_enrollment_flow_over_http() {
    let h = harness().await;
    let app = router(h.state);

    let (status, created) = send(
        app.clone(),
        json_request("POST", "/api/enrollments", json!({"course_id": "C1", "student_id": "S1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app.clone(),
        json_request("POST", "/api/enrollments", json!({"course_id": "C1", "student_id": "S1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let anonymous = Request::builder()
        .method("POST")
        .uri(format!("/api/enrollments/{}/cancel-request", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), anonymous).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let as_student = Request::builder()
        .method("POST")
        .uri(format!("/api/enrollments/{}/cancel-request", id))
        .header("x-subject-id", "S1")
        .header("x-role", "student")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), as_student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancel_request"], true);

    let (status, _) = send(
        app.clone(),
        json_request(
            "PATCH",
            &format!("/api/enrollments/{}/cancel-request", id),
            json!({"action": "maybe"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app,
        json_request(
            "PATCH",
            &format!("/api/enrollments/{}/cancel-request", id),
            json!({"action": "approve"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn test_quiz_attempt_over_http() {
    let h = harness().await;
    let app = router(h.state);

    let (status, quiz) = send(
        app.clone(),
        json_request(
            "POST",
            "/api/quizzes",
            json!({
                "title": "Checkpoint",
                "module_id": "M1",
                "questions": [
                    {"question_text": "A?", "options": ["x", "y"], "correct_answer": 1},
                    {"question_text": "B?", "options": ["x", "y"], "correct_answer": 0}
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/quizzes/{}/attempts", quiz["id"].as_str().unwrap());

    let (status, _) = send(app.clone(), json_request("POST", &uri, json!({"answers": [1]}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let submit = Request::builder()
        .method("POST")
        .uri(&uri)
        .header("content-type", "application/json")
        .header("x-subject-id", "S1")
        .body(Body::from(json!({"answers": [1, 1]}).to_string()))
        .unwrap();
    let (status, attempt) = send(app.clone(), submit).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attempt["score"], 1);
    assert_eq!(attempt["total_questions"], 2);
    assert_eq!(attempt["student_id"], "S1");

    let mine = Request::builder()
        .uri("/api/attempts/mine")
        .header("x-subject-id", "S1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), mine).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/attempts/{}", attempt["id"].as_str().unwrap()))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
