//! Storage boundary for the normalized collections.
//!
//! Implementations only persist what they are handed. Keeping the paired
//! references (`Course::module_ids` against `Module::course_id`,
//! `Module::lesson_ids` against `Lesson::module_id`) in step is the caller's
//! job.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Attempt, Course, Enrollment, Lesson, Module, Quiz, User};

#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn get_course(&self, id: &str) -> Result<Option<Course>, StoreError>;
    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError>;
    /// All courses, soft-deleted included, oldest first.
    async fn list_courses(&self) -> Result<Vec<Course>, StoreError>;
    /// Fails with `StoreError::Duplicate` when the slug is taken.
    async fn insert_course(&self, course: &Course) -> Result<(), StoreError>;
    async fn update_course(&self, course: &Course) -> Result<bool, StoreError>;
    async fn delete_course(&self, id: &str) -> Result<bool, StoreError>;

    async fn get_module(&self, id: &str) -> Result<Option<Module>, StoreError>;
    /// Modules for `ids` in the order given; unknown ids are skipped.
    async fn get_modules(&self, ids: &[String]) -> Result<Vec<Module>, StoreError>;
    async fn insert_module(&self, module: &Module) -> Result<(), StoreError>;
    async fn update_module(&self, module: &Module) -> Result<bool, StoreError>;
    async fn delete_module(&self, id: &str) -> Result<bool, StoreError>;

    async fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, StoreError>;
    /// Lessons for `ids` in the order given; unknown ids are skipped.
    async fn get_lessons(&self, ids: &[String]) -> Result<Vec<Lesson>, StoreError>;
    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError>;
    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError>;
    async fn delete_lesson(&self, id: &str) -> Result<bool, StoreError>;

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError>;
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError>;
    async fn list_quizzes_by_module(&self, module_id: &str) -> Result<Vec<Quiz>, StoreError>;
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError>;
    async fn update_quiz(&self, quiz: &Quiz) -> Result<bool, StoreError>;

    async fn get_enrollment(&self, id: &str) -> Result<Option<Enrollment>, StoreError>;
    async fn find_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, StoreError>;
    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StoreError>;
    /// Fails with `StoreError::Duplicate` when the (student, course) pair exists.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError>;
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<bool, StoreError>;

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, StoreError>;
    /// Attempts at one quiz, newest first.
    async fn list_attempts_by_quiz(&self, quiz_id: &str) -> Result<Vec<Attempt>, StoreError>;
    /// Attempts by one student, newest first.
    async fn list_attempts_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Attempt>, StoreError>;
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError>;
    async fn delete_attempt(&self, id: &str) -> Result<bool, StoreError>;
}
