//! Typed read models assembled from the normalized collections.
//!
//! These are what gets serialized into the cache; nothing here is persisted
//! on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Course, Enrollment, EnrollmentStatus, Lesson, LessonType, Module, Question, Quiz, User};

/// Public projection of a user. Credential fields are never copied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    pub module_id: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub content_url: Option<String>,
    pub duration: i64,
    pub order: i64,
}

impl From<&Lesson> for LessonView {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id.clone(),
            title: lesson.title.clone(),
            module_id: lesson.module_id.clone(),
            lesson_type: lesson.lesson_type,
            content_url: lesson.content_url.clone(),
            duration: lesson.duration,
            order: lesson.order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleView {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub course_id: String,
    pub lessons: Vec<LessonView>,
}

impl ModuleView {
    pub fn new(module: &Module, lessons: Vec<LessonView>) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            order: module.order,
            course_id: module.course_id.clone(),
            lessons,
        }
    }
}

/// Composite course view: course fields, inlined instructor, and the
/// course's live modules each carrying its live lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub instructor: UserSummary,
    pub modules: Vec<ModuleView>,
}

impl CourseView {
    pub fn new(course: &Course, instructor: UserSummary, modules: Vec<ModuleView>) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            slug: course.slug.clone(),
            description: course.description.clone(),
            price: course.price,
            thumbnail: course.thumbnail.clone(),
            category: course.category.clone(),
            created_at: course.created_at,
            instructor,
            modules,
        }
    }
}

/// Row of the course listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub instructor: UserSummary,
}

impl CourseSummary {
    pub fn new(course: &Course, instructor: UserSummary) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            slug: course.slug.clone(),
            description: course.description.clone(),
            price: course.price,
            thumbnail: course.thumbnail.clone(),
            category: course.category.clone(),
            created_at: course.created_at,
            instructor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizView {
    pub id: String,
    pub title: String,
    pub module_id: String,
    pub module_title: String,
    pub time_limit: Option<i64>,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

impl QuizView {
    pub fn new(quiz: &Quiz, module: &Module) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            module_id: module.id.clone(),
            module_title: module.title.clone(),
            time_limit: quiz.time_limit,
            questions: quiz.questions.clone(),
            total_questions: quiz.questions.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentView {
    pub id: String,
    pub status: EnrollmentStatus,
    pub cancel_request: bool,
    pub enrolled_at: DateTime<Utc>,
    pub course: EnrolledCourse,
    pub student: UserSummary,
}

impl EnrollmentView {
    pub fn new(enrollment: &Enrollment, course: &Course, student: &User) -> Self {
        Self {
            id: enrollment.id.clone(),
            status: enrollment.status,
            cancel_request: enrollment.cancel_request,
            enrolled_at: enrollment.enrolled_at,
            course: EnrolledCourse {
                id: course.id.clone(),
                title: course.title.clone(),
            },
            student: UserSummary::from(student),
        }
    }
}
