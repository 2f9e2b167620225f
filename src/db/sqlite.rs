use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::repository::EntityRepository;
use crate::error::StoreError;
use crate::models::{Attempt, Course, Enrollment, Lesson, Module, Question, Quiz, User};

const COURSE_COLUMNS: &str = "id, title, slug, description, instructor_id, price, thumbnail, category, module_ids, is_deleted, created_at";
const MODULE_COLUMNS: &str = "id, title, position, course_id, lesson_ids, is_deleted";
const LESSON_COLUMNS: &str = "id, title, module_id, kind, content_url, duration, position, is_deleted";
const QUIZ_COLUMNS: &str = "id, title, module_id, questions, time_limit, is_deleted";
const ATTEMPT_COLUMNS: &str =
    "id, quiz_id, student_id, answers, score, total_questions, attempted_at";
const ENROLLMENT_COLUMNS: &str = "id, course_id, student_id, status, cancel_request, cancel_request_at, enrolled_at";

#[derive(Debug, FromRow)]
struct CourseRow {
    id: String,
    title: String,
    slug: String,
    description: Option<String>,
    instructor_id: String,
    price: f64,
    thumbnail: Option<String>,
    category: Option<String>,
    module_ids: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = StoreError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            instructor_id: row.instructor_id,
            price: row.price,
            thumbnail: row.thumbnail,
            category: row.category,
            module_ids: serde_json::from_str(&row.module_ids)?,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ModuleRow {
    id: String,
    title: String,
    position: i64,
    course_id: String,
    lesson_ids: String,
    is_deleted: bool,
}

impl TryFrom<ModuleRow> for Module {
    type Error = StoreError;

    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        Ok(Module {
            id: row.id,
            title: row.title,
            order: row.position,
            course_id: row.course_id,
            lesson_ids: serde_json::from_str(&row.lesson_ids)?,
            is_deleted: row.is_deleted,
        })
    }
}

#[derive(Debug, FromRow)]
struct QuizRow {
    id: String,
    title: String,
    module_id: String,
    questions: String,
    time_limit: Option<i64>,
    is_deleted: bool,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = StoreError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        let questions: Vec<Question> = serde_json::from_str(&row.questions)?;
        Ok(Quiz {
            id: row.id,
            title: row.title,
            module_id: row.module_id,
            questions,
            time_limit: row.time_limit,
            is_deleted: row.is_deleted,
        })
    }
}

#[derive(Debug, FromRow)]
struct AttemptRow {
    id: String,
    quiz_id: String,
    student_id: String,
    answers: String,
    score: i64,
    total_questions: i64,
    attempted_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = StoreError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Attempt {
            id: row.id,
            quiz_id: row.quiz_id,
            student_id: row.student_id,
            answers: serde_json::from_str(&row.answers)?,
            score: row.score,
            total_questions: row.total_questions,
            attempted_at: row.attempted_at,
        })
    }
}

fn duplicate_or(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(what.to_string());
        }
    }
    StoreError::Database(err)
}

/// Restores caller order for `WHERE id IN (...)` results.
fn in_request_order<T>(ids: &[String], mut found: Vec<T>, id_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut ordered = Vec::with_capacity(found.len());
    for id in ids {
        if let Some(pos) = found.iter().position(|item| id_of(item) == id) {
            ordered.push(found.swap_remove(pos));
        }
    }
    ordered
}

#[derive(Clone)]
pub struct SqliteRepository {
    db: SqlitePool,
}

impl SqliteRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityRepository for SqliteRepository {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, refresh_token, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, refresh_token, role) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.role)
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_or(e, "user email"))?;
        Ok(())
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {} FROM courses WHERE id = ?",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Course::try_from).transpose()
    }

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, StoreError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {} FROM courses WHERE slug = ?",
            COURSE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await?;
        row.map(Course::try_from).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        let rows = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {} FROM courses ORDER BY created_at ASC, id ASC",
            COURSE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Course::try_from).collect()
    }

    async fn insert_course(&self, course: &Course) -> Result<(), StoreError> {
        let module_ids = serde_json::to_string(&course.module_ids)?;
        sqlx::query(
            r#"
            INSERT INTO courses
                (id, title, slug, description, instructor_id, price, thumbnail,
                category, module_ids, is_deleted, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&course.id)
        .bind(&course.title)
        .bind(&course.slug)
        .bind(&course.description)
        .bind(&course.instructor_id)
        .bind(course.price)
        .bind(&course.thumbnail)
        .bind(&course.category)
        .bind(module_ids)
        .bind(course.is_deleted)
        .bind(course.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_or(e, "course slug"))?;
        Ok(())
    }

    async fn update_course(&self, course: &Course) -> Result<bool, StoreError> {
        let module_ids = serde_json::to_string(&course.module_ids)?;
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET title = ?1,
                slug = ?2,
                description = ?3,
                instructor_id = ?4,
                price = ?5,
                thumbnail = ?6,
                category = ?7,
                module_ids = ?8,
                is_deleted = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&course.title)
        .bind(&course.slug)
        .bind(&course.description)
        .bind(&course.instructor_id)
        .bind(course.price)
        .bind(&course.thumbnail)
        .bind(&course.category)
        .bind(module_ids)
        .bind(course.is_deleted)
        .bind(&course.id)
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_or(e, "course slug"))?
        .rows_affected();

        Ok(result > 0)
    }

    async fn delete_course(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result > 0)
    }

    async fn get_module(&self, id: &str) -> Result<Option<Module>, StoreError> {
        let row = sqlx::query_as::<_, ModuleRow>(&format!(
            "SELECT {} FROM modules WHERE id = ?",
            MODULE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Module::try_from).transpose()
    }

    async fn get_modules(&self, ids: &[String]) -> Result<Vec<Module>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM modules WHERE id IN (", MODULE_COLUMNS));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<ModuleRow>()
            .fetch_all(&self.db)
            .await?;
        let modules = rows
            .into_iter()
            .map(Module::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(in_request_order(ids, modules, |m| m.id.as_str()))
    }

    async fn insert_module(&self, module: &Module) -> Result<(), StoreError> {
        let lesson_ids = serde_json::to_string(&module.lesson_ids)?;
        sqlx::query(
            "INSERT INTO modules (id, title, position, course_id, lesson_ids, is_deleted) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&module.id)
        .bind(&module.title)
        .bind(module.order)
        .bind(&module.course_id)
        .bind(lesson_ids)
        .bind(module.is_deleted)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_module(&self, module: &Module) -> Result<bool, StoreError> {
        let lesson_ids = serde_json::to_string(&module.lesson_ids)?;
        let result = sqlx::query(
            r#"
            UPDATE modules
            SET title = ?1,
                position = ?2,
                course_id = ?3,
                lesson_ids = ?4,
                is_deleted = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&module.title)
        .bind(module.order)
        .bind(&module.course_id)
        .bind(lesson_ids)
        .bind(module.is_deleted)
        .bind(&module.id)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(result > 0)
    }

    async fn delete_module(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM modules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result > 0)
    }

    async fn get_lesson(&self, id: &str) -> Result<Option<Lesson>, StoreError> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lessons WHERE id = ?",
            LESSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(lesson)
    }

    async fn get_lessons(&self, ids: &[String]) -> Result<Vec<Lesson>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM lessons WHERE id IN (", LESSON_COLUMNS));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let lessons = query
            .build_query_as::<Lesson>()
            .fetch_all(&self.db)
            .await?;

        Ok(in_request_order(ids, lessons, |l| l.id.as_str()))
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO lessons
                (id, title, module_id, kind, content_url, duration, position, is_deleted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&lesson.id)
        .bind(&lesson.title)
        .bind(&lesson.module_id)
        .bind(lesson.lesson_type)
        .bind(&lesson.content_url)
        .bind(lesson.duration)
        .bind(lesson.order)
        .bind(lesson.is_deleted)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE lessons
            SET title = ?1,
                module_id = ?2,
                kind = ?3,
                content_url = ?4,
                duration = ?5,
                position = ?6,
                is_deleted = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&lesson.title)
        .bind(&lesson.module_id)
        .bind(lesson.lesson_type)
        .bind(&lesson.content_url)
        .bind(lesson.duration)
        .bind(lesson.order)
        .bind(lesson.is_deleted)
        .bind(&lesson.id)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(result > 0)
    }

    async fn delete_lesson(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result > 0)
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE id = ?",
            QUIZ_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Quiz::try_from).transpose()
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes ORDER BY rowid ASC",
            QUIZ_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Quiz::try_from).collect()
    }

    async fn list_quizzes_by_module(&self, module_id: &str) -> Result<Vec<Quiz>, StoreError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE module_id = ? ORDER BY rowid ASC",
            QUIZ_COLUMNS
        ))
        .bind(module_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Quiz::try_from).collect()
    }

    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        let questions = serde_json::to_string(&quiz.questions)?;
        sqlx::query(
            "INSERT INTO quizzes (id, title, module_id, questions, time_limit, is_deleted) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&quiz.id)
        .bind(&quiz.title)
        .bind(&quiz.module_id)
        .bind(questions)
        .bind(quiz.time_limit)
        .bind(quiz.is_deleted)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_quiz(&self, quiz: &Quiz) -> Result<bool, StoreError> {
        let questions = serde_json::to_string(&quiz.questions)?;
        let result = sqlx::query(
            r#"
            UPDATE quizzes
            SET title = ?1,
                module_id = ?2,
                questions = ?3,
                time_limit = ?4,
                is_deleted = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.module_id)
        .bind(questions)
        .bind(quiz.time_limit)
        .bind(quiz.is_deleted)
        .bind(&quiz.id)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(result > 0)
    }

    async fn get_enrollment(&self, id: &str) -> Result<Option<Enrollment>, StoreError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {} FROM enrollments WHERE id = ?",
            ENROLLMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(enrollment)
    }

    async fn find_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {} FROM enrollments WHERE student_id = ? AND course_id = ?",
            ENROLLMENT_COLUMNS
        ))
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(enrollment)
    }

    async fn list_enrollments(&self) -> Result<Vec<Enrollment>, StoreError> {
        let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {} FROM enrollments ORDER BY enrolled_at ASC, id ASC",
            ENROLLMENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(enrollments)
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO enrollments
                (id, course_id, student_id, status, cancel_request, cancel_request_at, enrolled_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&enrollment.id)
        .bind(&enrollment.course_id)
        .bind(&enrollment.student_id)
        .bind(enrollment.status)
        .bind(enrollment.cancel_request)
        .bind(enrollment.cancel_request_at)
        .bind(enrollment.enrolled_at)
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_or(e, "enrollment for student and course"))?;
        Ok(())
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE enrollments
            SET status = ?1,
                cancel_request = ?2,
                cancel_request_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(enrollment.status)
        .bind(enrollment.cancel_request)
        .bind(enrollment.cancel_request_at)
        .bind(&enrollment.id)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(result > 0)
    }

    async fn get_attempt(&self, id: &str) -> Result<Option<Attempt>, StoreError> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM attempts WHERE id = ?",
            ATTEMPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Attempt::try_from).transpose()
    }

    async fn list_attempts_by_quiz(&self, quiz_id: &str) -> Result<Vec<Attempt>, StoreError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM attempts WHERE quiz_id = ? ORDER BY attempted_at DESC, rowid DESC",
            ATTEMPT_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Attempt::try_from).collect()
    }

    async fn list_attempts_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {} FROM attempts WHERE student_id = ? ORDER BY attempted_at DESC, rowid DESC",
            ATTEMPT_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Attempt::try_from).collect()
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        let answers = serde_json::to_string(&attempt.answers)?;
        sqlx::query(
            r#"
            INSERT INTO attempts
                (id, quiz_id, student_id, answers, score, total_questions, attempted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&attempt.id)
        .bind(&attempt.quiz_id)
        .bind(&attempt.student_id)
        .bind(answers)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(attempt.attempted_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_attempt(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM attempts WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result > 0)
    }
}
