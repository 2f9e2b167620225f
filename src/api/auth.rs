use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::{AuthContext, Role};

pub const SUBJECT_HEADER: &str = "x-subject-id";
pub const ROLE_HEADER: &str = "x-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Identity forwarded by the gateway; tokens are verified before requests reach us.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject_id = header(parts, SUBJECT_HEADER)
            .ok_or_else(|| AppError::Forbidden("Missing caller identity".to_string()))?;
        let role = header(parts, ROLE_HEADER)
            .unwrap_or("student")
            .parse::<Role>()
            .map_err(AppError::Validation)?;

        Ok(AuthContext {
            subject_id: subject_id.to_string(),
            role,
        })
    }
}
