pub mod auth;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
struct DeleteParams {
    #[serde(default)]
    hard: bool,
}

#[derive(Deserialize)]
struct CancelDecision {
    action: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/modules", post(create_module))
        .route(
            "/modules/{id}",
            get(get_module).patch(update_module).delete(delete_module),
        )
        .route("/modules/{id}/quizzes", get(list_module_quizzes))
        .route("/lessons", post(create_lesson))
        .route(
            "/lessons/{id}",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/quizzes", get(list_quizzes).post(create_quiz))
        .route(
            "/quizzes/{id}",
            get(get_quiz).patch(update_quiz).delete(delete_quiz),
        )
        .route(
            "/quizzes/{id}/attempts",
            get(list_quiz_attempts).post(attempt_quiz),
        )
        .route("/attempts/mine", get(list_my_attempts))
        .route("/attempts/{id}", get(get_attempt).delete(delete_attempt))
        .route("/enrollments", get(list_enrollments).post(create_enrollment))
        .route("/enrollments/{id}", get(get_enrollment))
        .route("/enrollments/{id}/cancel-request", post(request_cancel).patch(handle_cancel))
        .route("/enrollments/{id}/cancel", patch(admin_cancel))
}

// ---- courses ----

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let courses = state.catalog.list_courses().await?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseView>, AppError> {
    let course = state.catalog.get_course(&id).await?;
    Ok(Json(course))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.catalog.create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = state.catalog.update_course(&id, req).await?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    if params.hard {
        state.catalog.delete_course(&id).await?;
    } else {
        state.catalog.soft_delete_course(&id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---- modules ----

async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModuleView>, AppError> {
    let module = state.catalog.get_module(&id).await?;
    Ok(Json(module))
}

async fn create_module(
    State(state): State<AppState>,
    Json(req): Json<NewModuleRequest>,
) -> Result<(StatusCode, Json<Module>), AppError> {
    let module = state.catalog.create_module(req).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

async fn update_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateModuleRequest>,
) -> Result<Json<Module>, AppError> {
    let module = state.catalog.update_module(&id, req).await?;
    Ok(Json(module))
}

async fn delete_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    if params.hard {
        state.catalog.delete_module(&id).await?;
    } else {
        state.catalog.soft_delete_module(&id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_module_quizzes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<QuizView>>, AppError> {
    let quizzes = state.quizzes.list_module_quizzes(&id).await?;
    Ok(Json(quizzes))
}

// ---- lessons ----

async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LessonView>, AppError> {
    let lesson = state.catalog.get_lesson(&id).await?;
    Ok(Json(lesson))
}

async fn create_lesson(
    State(state): State<AppState>,
    Json(req): Json<NewLessonRequest>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = state.catalog.create_lesson(req).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state.catalog.update_lesson(&id, req).await?;
    Ok(Json(lesson))
}

async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    if params.hard {
        state.catalog.delete_lesson(&id).await?;
    } else {
        state.catalog.soft_delete_lesson(&id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---- quizzes ----

async fn list_quizzes(State(state): State<AppState>) -> Result<Json<Vec<QuizView>>, AppError> {
    let quizzes = state.quizzes.list_quizzes().await?;
    Ok(Json(quizzes))
}

async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuizView>, AppError> {
    let quiz = state.quizzes.get_quiz(&id).await?;
    Ok(Json(quiz))
}

async fn create_quiz(
    State(state): State<AppState>,
    Json(req): Json<NewQuizRequest>,
) -> Result<(StatusCode, Json<Quiz>), AppError> {
    let quiz = state.quizzes.create_quiz(req).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateQuizRequest>,
) -> Result<Json<Quiz>, AppError> {
    let quiz = state.quizzes.update_quiz(&id, req).await?;
    Ok(Json(quiz))
}

async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.quizzes.soft_delete_quiz(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- attempts ----

async fn attempt_quiz(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<NewAttemptRequest>,
) -> Result<(StatusCode, Json<Attempt>), AppError> {
    let attempt = state.quizzes.attempt_quiz(&id, &auth, req).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

async fn list_quiz_attempts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Attempt>>, AppError> {
    let attempts = state.quizzes.list_quiz_attempts(&id).await?;
    Ok(Json(attempts))
}

async fn list_my_attempts(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Attempt>>, AppError> {
    let attempts = state.quizzes.list_student_attempts(&auth.subject_id).await?;
    Ok(Json(attempts))
}

async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Attempt>, AppError> {
    let attempt = state.quizzes.get_attempt(&id).await?;
    Ok(Json(attempt))
}

async fn delete_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.quizzes.delete_attempt(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- enrollments ----

async fn list_enrollments(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    let enrollments = state.enrollments.list_enrollments().await?;
    Ok(Json(enrollments))
}

async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EnrollmentView>, AppError> {
    let enrollment = state.enrollments.get_enrollment(&id).await?;
    Ok(Json(enrollment))
}

async fn create_enrollment(
    State(state): State<AppState>,
    Json(req): Json<NewEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = state.enrollments.enroll(req).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn request_cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state.enrollments.request_cancel(&id, &auth).await?;
    Ok(Json(enrollment))
}

async fn handle_cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CancelDecision>,
) -> Result<Json<Enrollment>, AppError> {
    let action = body
        .action
        .parse::<CancelAction>()
        .map_err(AppError::Validation)?;
    let enrollment = state.enrollments.handle_cancel_request(&id, action).await?;
    Ok(Json(enrollment))
}

async fn admin_cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state.enrollments.admin_cancel(&id).await?;
    Ok(Json(enrollment))
}
