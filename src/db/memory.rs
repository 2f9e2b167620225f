//! In-process repository backed by vectors, for tests and local experiments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::repository::EntityRepository;
use crate::error::StoreError;
use crate::models::{Attempt, Course, Enrollment, Lesson, Module, Quiz, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    modules: Vec<Module>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    enrollments: Vec<Enrollment>,
    attempts: Vec<Attempt>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

fn replace<T: Clone>(rows: &mut [T], item: &T, same: impl Fn(&T) -> bool) -> bool {
    match rows.iter_mut().find(|row| same(row)) {
        Some(row) => {
            *row = item.clone();
            true
        }
        None => false,
    }
}

fn remove<T>(rows: &mut Vec<T>, same: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|row| !same(row));
    rows.len() != before
}

/// Ties keep the later insert first.
fn newest_first(mut attempts: Vec<Attempt>) -> Vec<Attempt> {
    attempts.reverse();
    attempts.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
    attempts
}

fn pick<T: Clone>(rows: &[T], ids: &[String], id_of: impl Fn(&T) -> &str) -> Vec<T> {
    ids.iter()
        .filter_map(|id| rows.iter().find(|row| id_of(row) == id).cloned())
        .collect()
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory repository offline".to_string()));
        }
        Ok(self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

#[async_trait]
impl EntityRepository for MemoryRepository {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("user email".to_string()));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, StoreError> {
        Ok(self.tables()?.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError> {
        Ok(self.tables()?.courses.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        Ok(self.tables()?.courses.clone())
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables.courses.iter().any(|c| c.slug == course.slug) {
            return Err(StoreError::Duplicate("course slug".to_string()));
        }
        tables.courses.push(course.clone());
        Ok(())
    }

    async fn update_course(&self, course: &Course) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .courses
            .iter()
            .any(|c| c.slug == course.slug && c.id != course.id)
        {
            return Err(StoreError::Duplicate("course slug".to_string()));
        }
        Ok(replace(&mut tables.courses, course, |c| c.id == course.id))
    }

    async fn delete_course(&self, id: &str) -> Result<bool, StoreError> {
        Ok(remove(&mut self.tables()?.courses, |c| c.id == id))
    }

    async fn get_module(&self, id: &str) -> Result<Option<Module>, StoreError> {
        Ok(self.tables()?.modules.iter().find(|m| m.id == id).cloned())
    }

    async fn get_modules(&self, ids: &[String]) -> Result<Vec<Module>, StoreError> {
        Ok(pick(&self.tables()?.modules, ids, |m| m.id.as_str()))
    }

    async fn insert_module(&self, module: &Module) -> Result<(), StoreError> {
        self.tables()?.modules.push(module.clone());
        Ok(())
    }

    async fn update_module(&self, module: &Module) -> Result<bool, StoreError> {
        Ok(replace(&mut self.tables()?.modules, module, |m| m.id == module.id))
    }

    async fn delete_module(&self, id: &str) -> Result<bool, StoreError> {
        Ok(remove(&mut self.tables()?.modules, |m| m.id == id))
    }

    async fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, StoreError> {
        Ok(self.tables()?.lessons.iter().find(|l| l.id == id).cloned())
    }

    async fn get_lessons(&self, ids: &[String]) -> Result<Vec<Lesson>, StoreError> {
        Ok(pick(&self.tables()?.lessons, ids, |l| l.id.as_str()))
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        self.tables()?.lessons.push(lesson.clone());
        Ok(())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError> {
        Ok(replace(&mut self.tables()?.lessons, lesson, |l| l.id == lesson.id))
    }

    async fn delete_lesson(&self, id: &str) -> Result<bool, StoreError> {
        Ok(remove(&mut self.tables()?.lessons, |l| l.id == id))
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        Ok(self.tables()?.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        Ok(self.tables()?.quizzes.clone())
    }

    async fn list_quizzes_by_module(&self, module_id: &str) -> Result<Vec<Quiz>, StoreError> {
        Ok(self
            .tables()?
            .quizzes
            .iter()
            .filter(|q| q.module_id == module_id)
            .cloned()
            .collect())
    }

    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        self.tables()?.quizzes.push(quiz.clone());
        Ok(())
    }

    async fn update_quiz(&self, quiz: &Quiz) -> Result<bool, StoreError> {
        Ok(replace(&mut self.tables()?.quizzes, quiz, |q| q.id == quiz.id))
    }

    async fn get_enrollment(&self, id: &str) -> Result<Option<Enrollment>, StoreError> {
        Ok(self.tables()?.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn find_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables()?
            .enrollments
            .iter()
            .find(|e| e.student_id == student_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self.tables()?.enrollments.clone())
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if tables
            .enrollments
            .iter()
            .any(|e| e.student_id == enrollment.student_id && e.course_id == enrollment.course_id)
        {
            return Err(StoreError::Duplicate(
                "enrollment for student and course".to_string(),
            ));
        }
        tables.enrollments.push(enrollment.clone());
        Ok(())
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<bool, StoreError> {
        Ok(replace(&mut self.tables()?.enrollments, enrollment, |e| {
            e.id == enrollment.id
        }))
    }

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, StoreError> {
        Ok(self.tables()?.attempts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_attempts_by_quiz(&self, quiz_id: &str) -> Result<Vec<Attempt>, StoreError> {
        let attempts = self
            .tables()?
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        Ok(newest_first(attempts))
    }

    async fn list_attempts_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        let attempts = self
            .tables()?
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        Ok(newest_first(attempts))
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        self.tables()?.attempts.push(attempt.clone());
        Ok(())
    }

    async fn delete_attempt(&self, id: &str) -> Result<bool, StoreError> {
        Ok(remove(&mut self.tables()?.attempts, |a| a.id == id))
    }
}
