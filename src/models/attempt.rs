use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quiz::Question;

/// A scored submission of answers to a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    /// Chosen option index per question, in question order.
    pub answers: Vec<usize>,
    pub score: i64,
    pub total_questions: i64,
    pub attempted_at: DateTime<Utc>,
}

impl Attempt {
    /// Counts answers matching `correct_answer` position by position.
    /// Missing answers score nothing, extra ones are ignored.
    pub fn score(questions: &[Question], answers: &[usize]) -> i64 {
        questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.correct_answer == **answer)
            .count() as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttemptRequest {
    #[serde(default)]
    pub answers: Vec<usize>,
}
