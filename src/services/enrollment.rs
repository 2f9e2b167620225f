//! Enrollment workflow: enroll, student cancel requests, admin decisions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use super::cache_aside::{CacheAside, CacheTtl};
use super::view_builder::ViewBuilder;
use crate::cache::{CacheStore, EntityKind, MutationEvent, keys};
use crate::db::EntityRepository;
use crate::error::{AppError, StoreError};
use crate::models::{
    AuthContext, CancelAction, Enrollment, EnrollmentStatus, EnrollmentView, NewEnrollmentRequest,
};

/// True while `now` is no more than `window` past `enrolled_at`.
pub fn within_cancel_window(
    enrolled_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    now.signed_duration_since(enrolled_at) <= window
}

pub struct EnrollmentService {
    repo: Arc<dyn EntityRepository>,
    cache: CacheAside,
    views: ViewBuilder,
    ttl: CacheTtl,
    cancel_window: Duration,
}

impl EnrollmentService {
    pub fn new(
        repo: Arc<dyn EntityRepository>,
        cache: Arc<dyn CacheStore>,
        ttl: CacheTtl,
        cancel_window: Duration,
    ) -> Self {
        Self {
            views: ViewBuilder::new(repo.clone()),
            cache: CacheAside::new(cache),
            repo,
            ttl,
            cancel_window,
        }
    }

    async fn existing(&self, id: &str) -> Result<Enrollment, AppError> {
        self.repo
            .get_enrollment(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment".to_string()))
    }

    async fn save(&self, enrollment: &Enrollment) -> Result<(), AppError> {
        if !self.repo.update_enrollment(enrollment).await? {
            return Err(AppError::NotFound("Enrollment".to_string()));
        }
        self.cache
            .invalidate(&[MutationEvent::new(EntityKind::Enrollment, &enrollment.id)])
            .await;
        Ok(())
    }

    pub async fn get_enrollment(&self, id: &str) -> Result<EnrollmentView, AppError> {
        let key = keys::enrollment(id)?;
        self.cache
            .read_through(&key, self.ttl.listing, || self.views.enrollment_view(id))
            .await
    }

    pub async fn list_enrollments(&self) -> Result<Vec<EnrollmentView>, AppError> {
        self.cache
            .read_through(&keys::all_enrollments(), self.ttl.listing, || {
                self.views.enrollment_listing()
            })
            .await
    }

    pub async fn enroll(&self, req: NewEnrollmentRequest) -> Result<Enrollment, AppError> {
        if req.student_id.trim().is_empty() {
            return Err(AppError::InvalidReference("Student id is empty".to_string()));
        }
        if req.course_id.trim().is_empty() {
            return Err(AppError::InvalidReference("Course id is empty".to_string()));
        }

        if self
            .repo
            .find_enrollment(&req.student_id, &req.course_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already enrolled in this course".to_string()));
        }

        match self.repo.get_course(&req.course_id).await? {
            Some(course) if !course.is_deleted => {}
            _ => {
                return Err(AppError::InvalidReference(format!(
                    "Course {} does not exist",
                    req.course_id
                )));
            }
        }
        if self.repo.get_user(&req.student_id).await?.is_none() {
            return Err(AppError::InvalidReference(format!(
                "Student {} does not exist",
                req.student_id
            )));
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4().to_string(),
            course_id: req.course_id,
            student_id: req.student_id,
            status: EnrollmentStatus::Active,
            cancel_request: false,
            cancel_request_at: None,
            enrolled_at: Utc::now(),
        };
        self.repo
            .insert_enrollment(&enrollment)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    AppError::Conflict("Already enrolled in this course".to_string())
                }
                other => AppError::Repository(other),
            })?;

        self.cache
            .invalidate(&[MutationEvent::new(EntityKind::Enrollment, &enrollment.id)])
            .await;
        info!(
            enrollment_id = %enrollment.id,
            course_id = %enrollment.course_id,
            "enrollment created"
        );
        Ok(enrollment)
    }

    /// A student asks to leave a course within the cancel window.
    pub async fn request_cancel(
        &self,
        id: &str,
        auth: &AuthContext,
    ) -> Result<Enrollment, AppError> {
        let mut enrollment = self.existing(id).await?;

        if enrollment.student_id != auth.subject_id {
            return Err(AppError::Forbidden(
                "You cannot cancel someone else's enrollment".to_string(),
            ));
        }
        if enrollment.status == EnrollmentStatus::Cancelled {
            return Err(AppError::Conflict("Already cancelled".to_string()));
        }
        if enrollment.cancel_request {
            return Err(AppError::Conflict("Cancel request already applied".to_string()));
        }

        let now = Utc::now();
        if !within_cancel_window(enrollment.enrolled_at, now, self.cancel_window) {
            return Err(AppError::Conflict(format!(
                "Cancel request window ({} days) is over",
                self.cancel_window.num_days()
            )));
        }

        enrollment.cancel_request = true;
        enrollment.cancel_request_at = Some(now);
        self.save(&enrollment).await?;
        Ok(enrollment)
    }

    pub async fn admin_cancel(&self, id: &str) -> Result<Enrollment, AppError> {
        let mut enrollment = self.existing(id).await?;
        if enrollment.status == EnrollmentStatus::Cancelled {
            return Err(AppError::Conflict("Already cancelled".to_string()));
        }

        enrollment.status = EnrollmentStatus::Cancelled;
        enrollment.cancel_request = false;
        self.save(&enrollment).await?;
        info!(enrollment_id = %enrollment.id, "enrollment cancelled by admin");
        Ok(enrollment)
    }

    pub async fn handle_cancel_request(
        &self,
        id: &str,
        action: CancelAction,
    ) -> Result<Enrollment, AppError> {
        let mut enrollment = self.existing(id).await?;
        if !enrollment.cancel_request {
            return Err(AppError::Conflict("No cancel request to handle".to_string()));
        }

        if action == CancelAction::Approve {
            enrollment.status = EnrollmentStatus::Cancelled;
        }
        enrollment.cancel_request = false;
        self.save(&enrollment).await?;
        info!(enrollment_id = %enrollment.id, action = ?action, "cancel request handled");
        Ok(enrollment)
    }
}
