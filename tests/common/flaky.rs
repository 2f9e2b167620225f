use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lms_backend::db::{EntityRepository, MemoryRepository};
use lms_backend::error::StoreError;
use lms_backend::models::{Attempt, Course, Enrollment, Lesson, Module, Quiz, User};

/// Wraps the in-memory repository. Every call yields to the scheduler first,
/// so concurrent operations interleave, and course updates can be made to
/// fail on demand.
#[derive(Default)]
pub struct FlakyRepository {
    pub inner: MemoryRepository,
    fail_course_updates: AtomicBool,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_course_updates(&self, fail: bool) {
        self.fail_course_updates.store(fail, Ordering::SeqCst);
    }
}

async fn step() {
    tokio::task::yield_now().await;
}

#[async_trait]
impl EntityRepository for FlakyRepository {
    async fn health_check(&self) -> Result<(), StoreError> {
        step().await;
        self.inner.health_check().await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        step().await;
        self.inner.get_user(id).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_user(user).await
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, StoreError> {
        step().await;
        self.inner.get_course(id).await
    }

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError> {
        step().await;
        self.inner.find_course_by_slug(slug).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        step().await;
        self.inner.list_courses().await
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_course(course).await
    }

    async fn update_course(&self, course: &Course) -> Result<bool, StoreError> {
        step().await;
        if self.fail_course_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("course table locked".to_string()));
        }
        self.inner.update_course(course).await
    }

    async fn delete_course(&self, id: &str) -> Result<bool, StoreError> {
        step().await;
        self.inner.delete_course(id).await
    }

    async fn get_module(&self, id: &str) -> Result<Option<Module>, StoreError> {
        step().await;
        self.inner.get_module(id).await
    }

    async fn get_modules(&self, ids: &[String]) -> Result<Vec<Module>, StoreError> {
        step().await;
        self.inner.get_modules(ids).await
    }

    async fn insert_module(&self, module: &Module) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_module(module).await
    }

    async fn update_module(&self, module: &Module) -> Result<bool, StoreError> {
        step().await;
        self.inner.update_module(module).await
    }

    async fn delete_module(&self, id: &str) -> Result<bool, StoreError> {
        step().await;
        self.inner.delete_module(id).await
    }

    async fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, StoreError> {
        step().await;
        self.inner.get_lesson(id).await
    }

    async fn get_lessons(&self, ids: &[String]) -> Result<Vec<Lesson>, StoreError> {
        step().await;
        self.inner.get_lessons(ids).await
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_lesson(lesson).await
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError> {
        step().await;
        self.inner.update_lesson(lesson).await
    }

    async fn delete_lesson(&self, id: &str) -> Result<bool, StoreError> {
        step().await;
        self.inner.delete_lesson(id).await
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        step().await;
        self.inner.get_quiz(id).await
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        step().await;
        self.inner.list_quizzes().await
    }

    async fn list_quizzes_by_module(&self, module_id: &str) -> Result<Vec<Quiz>, StoreError> {
        step().await;
        self.inner.list_quizzes_by_module(module_id).await
    }

    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_quiz(quiz).await
    }

    async fn update_quiz(&self, quiz: &Quiz) -> Result<bool, StoreError> {
        step().await;
        self.inner.update_quiz(quiz).await
    }

    async fn get_enrollment(&self, id: &str) -> Result<Option<Enrollment>, StoreError> {
        step().await;
        self.inner.get_enrollment(id).await
    }

    async fn find_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        step().await;
        self.inner.find_enrollment(student_id, course_id).await
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StoreError> {
        step().await;
        self.inner.list_enrollments().await
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_enrollment(enrollment).await
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<bool, StoreError> {
        step().await;
        self.inner.update_enrollment(enrollment).await
    }

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, StoreError> {
        step().await;
        self.inner.get_attempt(id).await
    }

    async fn list_attempts_by_quiz(&self, quiz_id: &str) -> Result<Vec<Attempt>, StoreError> {
        step().await;
        self.inner.list_attempts_by_quiz(quiz_id).await
    }

    async fn list_attempts_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        step().await;
        self.inner.list_attempts_by_student(student_id).await
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        step().await;
        self.inner.insert_attempt(attempt).await
    }

    async fn delete_attempt(&self, id: &str) -> Result<bool, StoreError> {
        step().await;
        self.inner.delete_attempt(id).await
    }
}
