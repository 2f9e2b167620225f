use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub order: i64,
    pub course_id: String,
    pub lesson_ids: Vec<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModuleRequest {
    pub title: String,
    #[serde(default)]
    pub order: i64,
    pub course_id: String,
}

/// Setting `course_id` to a different course rehomes the module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateModuleRequest {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub course_id: Option<String>,
}
