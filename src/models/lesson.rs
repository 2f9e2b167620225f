use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LessonType {
    Video,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub module_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "kind")]
    pub lesson_type: LessonType,
    pub content_url: Option<String>,
    pub duration: i64,
    #[sqlx(rename = "position")]
    pub order: i64,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLessonRequest {
    pub title: String,
    pub module_id: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    /// Durable URL handed back by the blob store after upload.
    pub content_url: Option<String>,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub module_id: Option<String>,
    #[serde(rename = "type")]
    pub lesson_type: Option<LessonType>,
    pub content_url: Option<String>,
    pub duration: Option<i64>,
    pub order: Option<i64>,
}
