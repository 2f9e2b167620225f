use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_text: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub module_id: String,
    pub questions: Vec<Question>,
    pub time_limit: Option<i64>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuizRequest {
    pub title: String,
    pub module_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub time_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateQuizRequest {
    pub title: Option<String>,
    pub module_id: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub time_limit: Option<i64>,
}
