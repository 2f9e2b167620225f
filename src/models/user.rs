use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Stored user record. Credential fields never leave the repository layer;
/// views copy out `id`, `name` and `email` only.
#[derive(Debug, Clone, PartialEq, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub role: Role,
}

/// Caller identity supplied by the gateway in front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject_id: String,
    pub role: Role,
}
