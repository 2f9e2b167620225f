use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::cache_aside::{CacheAside, CacheTtl};
use super::view_builder::ViewBuilder;
use crate::cache::{CacheStore, EntityKind, Lineage, MutationEvent, keys};
use crate::db::EntityRepository;
use crate::error::AppError;
use crate::models::{
    Attempt, AuthContext, NewAttemptRequest, NewQuizRequest, Question, Quiz, QuizView,
    UpdateQuizRequest,
};

fn validate_questions(questions: &[Question]) -> Result<(), AppError> {
    for (index, question) in questions.iter().enumerate() {
        if question.question_text.trim().is_empty() {
            return Err(AppError::Validation(format!("Question {} has no text", index + 1)));
        }
        if question.correct_answer >= question.options.len() {
            return Err(AppError::Validation(format!(
                "Question {} answer index is out of range",
                index + 1
            )));
        }
    }
    Ok(())
}

pub struct QuizService {
    repo: Arc<dyn EntityRepository>,
    cache: CacheAside,
    views: ViewBuilder,
    ttl: CacheTtl,
}

impl QuizService {
    pub fn new(repo: Arc<dyn EntityRepository>, cache: Arc<dyn CacheStore>, ttl: CacheTtl) -> Self {
        Self {
            views: ViewBuilder::new(repo.clone()),
            cache: CacheAside::new(cache),
            repo,
            ttl,
        }
    }

    async fn module_reference(&self, id: &str) -> Result<(), AppError> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidReference("Module id is empty".to_string()));
        }
        match self.repo.get_module(id).await? {
            Some(module) if !module.is_deleted => Ok(()),
            _ => Err(AppError::InvalidReference(format!("Module {} does not exist", id))),
        }
    }

    pub async fn get_quiz(&self, id: &str) -> Result<QuizView, AppError> {
        let key = keys::quiz(id)?;
        self.cache
            .read_through(&key, self.ttl.listing, || self.views.quiz_view(id))
            .await
    }

    pub async fn list_quizzes(&self) -> Result<Vec<QuizView>, AppError> {
        self.cache
            .read_through(&keys::all_quizzes(), self.ttl.listing, || {
                self.views.quiz_listing()
            })
            .await
    }

    pub async fn list_module_quizzes(&self, module_id: &str) -> Result<Vec<QuizView>, AppError> {
        let key = keys::module_quizzes(module_id)?;
        self.cache
            .read_through(&key, self.ttl.listing, || {
                self.views.module_quizzes(module_id)
            })
            .await
    }

    pub async fn create_quiz(&self, req: NewQuizRequest) -> Result<Quiz, AppError> {
        if req.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        validate_questions(&req.questions)?;
        self.module_reference(&req.module_id).await?;

        let quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            module_id: req.module_id,
            questions: req.questions,
            time_limit: req.time_limit,
            is_deleted: false,
        };
        self.repo.insert_quiz(&quiz).await?;

        let event = MutationEvent::new(EntityKind::Quiz, &quiz.id)
            .after(Lineage::module(&quiz.module_id, None));
        self.cache.invalidate(&[event]).await;
        info!(quiz_id = %quiz.id, module_id = %quiz.module_id, "quiz created");
        Ok(quiz)
    }

    pub async fn update_quiz(&self, id: &str, req: UpdateQuizRequest) -> Result<Quiz, AppError> {
        let mut quiz = self
            .repo
            .get_quiz(id)
            .await?
            .filter(|quiz| !quiz.is_deleted)
            .ok_or_else(|| AppError::NotFound("Quiz".to_string()))?;
        let previous_module = quiz.module_id.clone();

        if let Some(title) = req.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("Title is required".to_string()));
            }
            quiz.title = title;
        }
        if let Some(questions) = req.questions {
            validate_questions(&questions)?;
            quiz.questions = questions;
        }
        if let Some(time_limit) = req.time_limit {
            quiz.time_limit = Some(time_limit);
        }
        if let Some(module_id) = req.module_id {
            if module_id != previous_module {
                self.module_reference(&module_id).await?;
            }
            quiz.module_id = module_id;
        }

        if !self.repo.update_quiz(&quiz).await? {
            return Err(AppError::NotFound("Quiz".to_string()));
        }

        let event = MutationEvent::new(EntityKind::Quiz, &quiz.id)
            .before(Lineage::module(previous_module, None))
            .after(Lineage::module(&quiz.module_id, None));
        self.cache.invalidate(&[event]).await;
        Ok(quiz)
    }

    pub async fn soft_delete_quiz(&self, id: &str) -> Result<Quiz, AppError> {
        let mut quiz = self
            .repo
            .get_quiz(id)
            .await?
            .filter(|quiz| !quiz.is_deleted)
            .ok_or_else(|| AppError::NotFound("Quiz".to_string()))?;
        quiz.is_deleted = true;
        if !self.repo.update_quiz(&quiz).await? {
            return Err(AppError::NotFound("Quiz".to_string()));
        }

        let event = MutationEvent::new(EntityKind::Quiz, &quiz.id)
            .within(Lineage::module(&quiz.module_id, None));
        self.cache.invalidate(&[event]).await;
        info!(quiz_id = %quiz.id, "quiz soft deleted");
        Ok(quiz)
    }

    // ---- attempts ----
    // Attempts are read straight from the repository; nothing embeds them.

    /// Scores `req.answers` against the quiz and records the attempt for the caller.
    pub async fn attempt_quiz(
        &self,
        quiz_id: &str,
        auth: &AuthContext,
        req: NewAttemptRequest,
    ) -> Result<Attempt, AppError> {
        let quiz = self
            .repo
            .get_quiz(quiz_id)
            .await?
            .filter(|quiz| !quiz.is_deleted)
            .ok_or_else(|| AppError::NotFound("Quiz".to_string()))?;

        let attempt = Attempt {
            id: Uuid::new_v4().to_string(),
            quiz_id: quiz.id.clone(),
            student_id: auth.subject_id.clone(),
            score: Attempt::score(&quiz.questions, &req.answers),
            total_questions: quiz.questions.len() as i64,
            answers: req.answers,
            attempted_at: Utc::now(),
        };
        self.repo.insert_attempt(&attempt).await?;

        info!(
            attempt_id = %attempt.id,
            quiz_id = %quiz.id,
            score = attempt.score,
            total = attempt.total_questions,
            "quiz attempted"
        );
        Ok(attempt)
    }

    pub async fn get_attempt(&self, id: &str) -> Result<Attempt, AppError> {
        self.repo
            .get_attempt(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt".to_string()))
    }

    pub async fn list_quiz_attempts(&self, quiz_id: &str) -> Result<Vec<Attempt>, AppError> {
        Ok(self.repo.list_attempts_by_quiz(quiz_id).await?)
    }

    pub async fn list_student_attempts(
        &self,
        student_id: &str,
    ) -> Result<Vec<Attempt>, AppError> {
        Ok(self.repo.list_attempts_by_student(student_id).await?)
    }

    pub async fn delete_attempt(&self, id: &str) -> Result<(), AppError> {
        if !self.repo.delete_attempt(id).await? {
            return Err(AppError::NotFound("Attempt".to_string()));
        }
        Ok(())
    }
}
