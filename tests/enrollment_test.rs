mod common;

use chrono::{Duration, Utc};
use lms_backend::db::EntityRepository;
use lms_backend::error::AppError;
use lms_backend::models::{
    AuthContext, CancelAction, Enrollment, EnrollmentStatus, NewEnrollmentRequest, Role,
};

use common::harness;

fn request(course_id: &str, student_id: &str) -> NewEnrollmentRequest {
    NewEnrollmentRequest {
        course_id: course_id.to_string(),
        student_id: student_id.to_string(),
    }
}

fn student(id: &str) -> AuthContext {
    AuthContext {
        subject_id: id.to_string(),
        role: Role::Student,
    }
}

fn enrolled_days_ago(id: &str, days: i64) -> Enrollment {
    Enrollment {
        id: id.to_string(),
        course_id: "C1".to_string(),
        student_id: "S1".to_string(),
        status: EnrollmentStatus::Active,
        cancel_request: false,
        cancel_request_at: None,
        enrolled_at: Utc::now() - Duration::days(days),
    }
}

#[tokio::test]
async fn test_enroll_creates_active_enrollment() {
    let h = harness().await;

    let enrollment = h.state.enrollments.enroll(request("C1", "S1")).await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert!(!enrollment.cancel_request);

    let view = h.state.enrollments.get_enrollment(&enrollment.id).await.unwrap();
    assert_eq!(view.course.id, "C1");
    assert_eq!(view.student.id, "S1");
    assert!(h.cache.contains(&format!("enrollment:{}", enrollment.id)));
}

#[tokio::test]
async fn test_duplicate_enrollment_conflicts_without_invalidation() {
    let h = harness().await;
    h.state.enrollments.enroll(request("C1", "S1")).await.unwrap();

    let listing = h.state.enrollments.list_enrollments().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert!(h.cache.contains("enrollments:all"));

    let result = h.state.enrollments.enroll(request("C1", "S1")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(h.cache.contains("enrollments:all"));
    assert_eq!(h.repo.list_enrollments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_enroll_in_missing_course_is_rejected() {
    let h = harness().await;

    let result = h.state.enrollments.enroll(request("C9", "S1")).await;
    assert!(matches!(result, Err(AppError::InvalidReference(_))));

    let result = h.state.enrollments.enroll(request("C1", "nobody")).await;
    assert!(matches!(result, Err(AppError::InvalidReference(_))));
}

#[tokio::test]
async fn test_new_enrollment_invalidates_listing() {
    let h = harness().await;
    h.state.enrollments.list_enrollments().await.unwrap();

    h.state.enrollments.enroll(request("C1", "S2")).await.unwrap();
    assert!(!h.cache.contains("enrollments:all"));
    assert_eq!(h.state.enrollments.list_enrollments().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_request_inside_window() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 4)).await.unwrap();
    h.state.enrollments.get_enrollment("E1").await.unwrap();

    let enrollment = h
        .state
        .enrollments
        .request_cancel("E1", &student("S1"))
        .await
        .unwrap();
    assert!(enrollment.cancel_request);
    assert!(enrollment.cancel_request_at.is_some());
    assert!(!h.cache.contains("enrollment:E1"));

    let again = h.state.enrollments.request_cancel("E1", &student("S1")).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_cancel_request_after_window_is_refused() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 6)).await.unwrap();

    let result = h.state.enrollments.request_cancel("E1", &student("S1")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = h.repo.get_enrollment("E1").await.unwrap().unwrap();
    assert!(!stored.cancel_request);
}

#[tokio::test]
async fn test_cancel_request_by_other_student_is_forbidden() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 1)).await.unwrap();

    let result = h.state.enrollments.request_cancel("E1", &student("S2")).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_approve_cancel_request() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 1)).await.unwrap();
    h.state
        .enrollments
        .request_cancel("E1", &student("S1"))
        .await
        .unwrap();

    let enrollment = h
        .state
        .enrollments
        .handle_cancel_request("E1", CancelAction::Approve)
        .await
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Cancelled);
    assert!(!enrollment.cancel_request);
}

#[tokio::test]
async fn test_reject_cancel_request_keeps_enrollment_active() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 1)).await.unwrap();
    h.state
        .enrollments
        .request_cancel("E1", &student("S1"))
        .await
        .unwrap();

    let enrollment = h
        .state
        .enrollments
        .handle_cancel_request("E1", CancelAction::Reject)
        .await
        .unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert!(!enrollment.cancel_request);

    let result = h
        .state
        .enrollments
        .handle_cancel_request("E1", CancelAction::Approve)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_admin_cancel() {
    let h = harness().await;
    h.repo.insert_enrollment(&enrolled_days_ago("E1", 30)).await.unwrap();

    let enrollment = h.state.enrollments.admin_cancel("E1").await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Cancelled);

    let again = h.state.enrollments.admin_cancel("E1").await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let missing = h.state.enrollments.admin_cancel("E9").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
