//! Assembles the typed read models from the normalized collections.
//!
//! Soft-deleted children are dropped, and so is any child whose back
//! reference disagrees with the parent list it was found through. Children
//! are sorted by `order`; the sort is stable, so ties keep list order.

use std::sync::Arc;

use crate::db::EntityRepository;
use crate::error::AppError;
use crate::models::{
    Course, CourseSummary, CourseView, EnrollmentView, Lesson, LessonView, Module, ModuleView,
    QuizView, UserSummary,
};

/// Live lessons of `module` in display order.
pub fn assemble_lessons(module: &Module, lessons: &[Lesson]) -> Vec<LessonView> {
    let mut views: Vec<LessonView> = lessons
        .iter()
        .filter(|lesson| !lesson.is_deleted && lesson.module_id == module.id)
        .map(LessonView::from)
        .collect();
    views.sort_by_key(|lesson| lesson.order);
    views
}

/// Live modules of `course`, each merged with its lessons, in display order.
pub fn assemble_modules(course: &Course, modules: Vec<(Module, Vec<Lesson>)>) -> Vec<ModuleView> {
    let mut views: Vec<ModuleView> = modules
        .into_iter()
        .filter(|(module, _)| !module.is_deleted && module.course_id == course.id)
        .map(|(module, lessons)| ModuleView::new(&module, assemble_lessons(&module, &lessons)))
        .collect();
    views.sort_by_key(|module| module.order);
    views
}

#[derive(Clone)]
pub struct ViewBuilder {
    repo: Arc<dyn EntityRepository>,
}

impl ViewBuilder {
    pub fn new(repo: Arc<dyn EntityRepository>) -> Self {
        Self { repo }
    }

    async fn live_course(&self, course_id: &str) -> Result<Course, AppError> {
        self.repo
            .get_course(course_id)
            .await?
            .filter(|course| !course.is_deleted)
            .ok_or_else(|| AppError::NotFound("Course".to_string()))
    }

    async fn instructor(&self, course: &Course) -> Result<UserSummary, AppError> {
        let user = self
            .repo
            .get_user(&course.instructor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Instructor".to_string()))?;
        Ok(UserSummary::from(&user))
    }

    pub async fn course_view(&self, course_id: &str) -> Result<CourseView, AppError> {
        let course = self.live_course(course_id).await?;
        let instructor = self.instructor(&course).await?;

        let modules = self.repo.get_modules(&course.module_ids).await?;
        let mut merged = Vec::with_capacity(modules.len());
        for module in modules {
            if module.is_deleted {
                continue;
            }
            let lessons = self.repo.get_lessons(&module.lesson_ids).await?;
            merged.push((module, lessons));
        }

        Ok(CourseView::new(
            &course,
            instructor,
            assemble_modules(&course, merged),
        ))
    }

    pub async fn module_view(&self, module_id: &str) -> Result<ModuleView, AppError> {
        let module = self
            .repo
            .get_module(module_id)
            .await?
            .filter(|module| !module.is_deleted)
            .ok_or_else(|| AppError::NotFound("Module".to_string()))?;
        let lessons = self.repo.get_lessons(&module.lesson_ids).await?;
        Ok(ModuleView::new(&module, assemble_lessons(&module, &lessons)))
    }

    pub async fn lesson_view(&self, lesson_id: &str) -> Result<LessonView, AppError> {
        let lesson = self
            .repo
            .get_lesson(lesson_id)
            .await?
            .filter(|lesson| !lesson.is_deleted)
            .ok_or_else(|| AppError::NotFound("Lesson".to_string()))?;
        // A lesson is only reachable through a live module.
        self.repo
            .get_module(&lesson.module_id)
            .await?
            .filter(|module| !module.is_deleted)
            .ok_or_else(|| AppError::NotFound("Lesson".to_string()))?;
        Ok(LessonView::from(&lesson))
    }

    /// Live courses with their instructor inlined. Courses whose instructor
    /// no longer resolves are left out.
    pub async fn course_listing(&self) -> Result<Vec<CourseSummary>, AppError> {
        let courses = self.repo.list_courses().await?;
        let mut summaries = Vec::with_capacity(courses.len());
        for course in courses.iter().filter(|course| !course.is_deleted) {
            if let Some(user) = self.repo.get_user(&course.instructor_id).await? {
                summaries.push(CourseSummary::new(course, UserSummary::from(&user)));
            }
        }
        Ok(summaries)
    }

    pub async fn quiz_view(&self, quiz_id: &str) -> Result<QuizView, AppError> {
        let quiz = self
            .repo
            .get_quiz(quiz_id)
            .await?
            .filter(|quiz| !quiz.is_deleted)
            .ok_or_else(|| AppError::NotFound("Quiz".to_string()))?;
        let module = self
            .repo
            .get_module(&quiz.module_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz module".to_string()))?;
        Ok(QuizView::new(&quiz, &module))
    }

    pub async fn quiz_listing(&self) -> Result<Vec<QuizView>, AppError> {
        let quizzes = self.repo.list_quizzes().await?;
        let mut views = Vec::with_capacity(quizzes.len());
        for quiz in quizzes.iter().filter(|quiz| !quiz.is_deleted) {
            if let Some(module) = self.repo.get_module(&quiz.module_id).await? {
                views.push(QuizView::new(quiz, &module));
            }
        }
        Ok(views)
    }

    pub async fn module_quizzes(&self, module_id: &str) -> Result<Vec<QuizView>, AppError> {
        let module = self
            .repo
            .get_module(module_id)
            .await?
            .filter(|module| !module.is_deleted)
            .ok_or_else(|| AppError::NotFound("Module".to_string()))?;
        let quizzes = self.repo.list_quizzes_by_module(module_id).await?;
        Ok(quizzes
            .iter()
            .filter(|quiz| !quiz.is_deleted)
            .map(|quiz| QuizView::new(quiz, &module))
            .collect())
    }

    pub async fn enrollment_view(&self, enrollment_id: &str) -> Result<EnrollmentView, AppError> {
        let enrollment = self
            .repo
            .get_enrollment(enrollment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment".to_string()))?;
        let course = self
            .repo
            .get_course(&enrollment.course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrolled course".to_string()))?;
        let student = self
            .repo
            .get_user(&enrollment.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
        Ok(EnrollmentView::new(&enrollment, &course, &student))
    }

    pub async fn enrollment_listing(&self) -> Result<Vec<EnrollmentView>, AppError> {
        let enrollments = self.repo.list_enrollments().await?;
        let mut views = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let course = self.repo.get_course(&enrollment.course_id).await?;
            let student = self.repo.get_user(&enrollment.student_id).await?;
            if let (Some(course), Some(student)) = (course, student) {
                views.push(EnrollmentView::new(enrollment, &course, &student));
            }
        }
        Ok(views)
    }
}
