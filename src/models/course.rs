use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub instructor_id: String,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
    /// Ordered module ids; mirrors `Module::course_id` on the other side.
    pub module_ids: Vec<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub instructor_id: String,
    #[serde(default)]
    pub price: f64,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub instructor_id: Option<String>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
}
