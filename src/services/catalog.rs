//! Courses, modules and lessons.
//!
//! Every write commits to the repository first and invalidates afterwards.
//! The paired references between a parent's id list and a child's owner id
//! are updated inside the same operation, child first.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::cache_aside::{CacheAside, CacheTtl};
use super::view_builder::ViewBuilder;
use crate::cache::{CacheStore, EntityKind, Lineage, MutationEvent, keys};
use crate::db::EntityRepository;
use crate::error::{AppError, StoreError};
use crate::models::{
    Course, CourseSummary, CourseView, Lesson, LessonView, Module, ModuleView, NewCourseRequest,
    NewLessonRequest, NewModuleRequest, UpdateCourseRequest, UpdateLessonRequest,
    UpdateModuleRequest,
};

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_reference(what: &str, id: &str) -> Result<(), AppError> {
    if id.trim().is_empty() {
        return Err(AppError::InvalidReference(format!("{} id is empty", what)));
    }
    Ok(())
}

fn slug_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => AppError::Conflict("Slug is already in use".to_string()),
        other => AppError::Repository(other),
    }
}

fn course_event(course_id: &str) -> MutationEvent {
    MutationEvent::new(EntityKind::Course, course_id)
}

fn module_event(module: &Module) -> MutationEvent {
    MutationEvent::new(EntityKind::Module, &module.id).within(Lineage::course(&module.course_id))
}

pub struct CatalogService {
    repo: Arc<dyn EntityRepository>,
    cache: CacheAside,
    views: ViewBuilder,
    ttl: CacheTtl,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn EntityRepository>, cache: Arc<dyn CacheStore>, ttl: CacheTtl) -> Self {
        Self {
            views: ViewBuilder::new(repo.clone()),
            cache: CacheAside::new(cache),
            repo,
            ttl,
        }
    }

    async fn existing_course(&self, id: &str) -> Result<Course, AppError> {
        self.repo
            .get_course(id)
            .await?
            .filter(|course| !course.is_deleted)
            .ok_or_else(|| AppError::NotFound("Course".to_string()))
    }

    async fn existing_module(&self, id: &str) -> Result<Module, AppError> {
        self.repo
            .get_module(id)
            .await?
            .filter(|module| !module.is_deleted)
            .ok_or_else(|| AppError::NotFound("Module".to_string()))
    }

    async fn existing_lesson(&self, id: &str) -> Result<Lesson, AppError> {
        self.repo
            .get_lesson(id)
            .await?
            .filter(|lesson| !lesson.is_deleted)
            .ok_or_else(|| AppError::NotFound("Lesson".to_string()))
    }

    /// Resolves a parent course given by a caller.
    async fn course_reference(&self, id: &str) -> Result<Course, AppError> {
        require_reference("Course", id)?;
        self.repo
            .get_course(id)
            .await?
            .filter(|course| !course.is_deleted)
            .ok_or_else(|| AppError::InvalidReference(format!("Course {} does not exist", id)))
    }

    /// Resolves a parent module given by a caller.
    async fn module_reference(&self, id: &str) -> Result<Module, AppError> {
        require_reference("Module", id)?;
        self.repo
            .get_module(id)
            .await?
            .filter(|module| !module.is_deleted)
            .ok_or_else(|| AppError::InvalidReference(format!("Module {} does not exist", id)))
    }

    async fn instructor_reference(&self, id: &str) -> Result<(), AppError> {
        require_reference("Instructor", id)?;
        match self.repo.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::InvalidReference(format!("Instructor {} does not exist", id))),
        }
    }

    /// Module and course that a lesson hangs under, for invalidation.
    async fn lesson_lineage(&self, module_id: &str) -> Result<Lineage, AppError> {
        let course_id = self
            .repo
            .get_module(module_id)
            .await?
            .map(|module| module.course_id);
        Ok(Lineage::module(module_id, course_id))
    }

    async fn detach_module(&self, course_id: &str, module_id: &str) -> Result<(), AppError> {
        match self.repo.get_course(course_id).await? {
            Some(mut course) => {
                course.module_ids.retain(|id| id != module_id);
                self.repo.update_course(&course).await?;
            }
            None => warn!(
                course_id = %course_id,
                module_id = %module_id,
                "owning course missing while detaching module"
            ),
        }
        Ok(())
    }

    async fn attach_module(&self, course_id: &str, module_id: &str) -> Result<(), AppError> {
        let mut course = self
            .repo
            .get_course(course_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidReference(format!("Course {} does not exist", course_id))
            })?;
        if !course.module_ids.iter().any(|id| id == module_id) {
            course.module_ids.push(module_id.to_string());
            self.repo.update_course(&course).await?;
        }
        Ok(())
    }

    async fn detach_lesson(&self, module_id: &str, lesson_id: &str) -> Result<(), AppError> {
        match self.repo.get_module(module_id).await? {
            Some(mut module) => {
                module.lesson_ids.retain(|id| id != lesson_id);
                self.repo.update_module(&module).await?;
            }
            None => warn!(
                module_id = %module_id,
                lesson_id = %lesson_id,
                "owning module missing while detaching lesson"
            ),
        }
        Ok(())
    }

    async fn attach_lesson(&self, module_id: &str, lesson_id: &str) -> Result<(), AppError> {
        let mut module = self
            .repo
            .get_module(module_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidReference(format!("Module {} does not exist", module_id))
            })?;
        if !module.lesson_ids.iter().any(|id| id == lesson_id) {
            module.lesson_ids.push(lesson_id.to_string());
            self.repo.update_module(&module).await?;
        }
        Ok(())
    }

    /// Invalidates whatever `events` already committed, then hands back the
    /// outcome of the rest of the operation.
    async fn settle<T>(
        &self,
        events: &[MutationEvent],
        outcome: Result<T, AppError>,
    ) -> Result<T, AppError> {
        let removed = self.cache.invalidate(events).await;
        if let Err(e) = &outcome {
            warn!(
                keys = removed.len(),
                error = %e,
                "write failed part way, committed rows invalidated"
            );
        }
        outcome
    }

    async fn relink_module(&self, from: &str, module: &Module) -> Result<(), AppError> {
        self.detach_module(from, &module.id).await?;
        self.attach_module(&module.course_id, &module.id).await
    }

    async fn relink_lesson(&self, from: &str, lesson: &Lesson) -> Result<(), AppError> {
        self.detach_lesson(from, &lesson.id).await?;
        self.attach_lesson(&lesson.module_id, &lesson.id).await
    }

    /// Removes a module and its lessons from the store, pushing an event for
    /// each row as soon as its delete commits. The owning course list is left
    /// to the caller.
    async fn purge_module(
        &self,
        module: &Module,
        events: &mut Vec<MutationEvent>,
    ) -> Result<(), AppError> {
        let lineage = Lineage::module(&module.id, Some(module.course_id.clone()));

        for lesson_id in &module.lesson_ids {
            if self.repo.delete_lesson(lesson_id).await? {
                events.push(
                    MutationEvent::new(EntityKind::Lesson, lesson_id).within(lineage.clone()),
                );
            }
        }
        self.repo.delete_module(&module.id).await?;
        events.push(module_event(module));
        Ok(())
    }

    async fn purge_course(
        &self,
        course: &Course,
        events: &mut Vec<MutationEvent>,
    ) -> Result<(), AppError> {
        for module in self.repo.get_modules(&course.module_ids).await? {
            if module.course_id == course.id {
                self.purge_module(&module, events).await?;
            }
        }
        if !self.repo.delete_course(&course.id).await? {
            return Err(AppError::NotFound("Course".to_string()));
        }
        events.push(course_event(&course.id));
        Ok(())
    }

    // ---- courses ----

    pub async fn get_course(&self, id: &str) -> Result<CourseView, AppError> {
        let key = keys::course(id)?;
        self.cache
            .read_through(&key, self.ttl.view, || self.views.course_view(id))
            .await
    }

    pub async fn list_courses(&self) -> Result<Vec<CourseSummary>, AppError> {
        self.cache
            .read_through(&keys::all_courses(), self.ttl.view, || {
                self.views.course_listing()
            })
            .await
    }

    pub async fn create_course(&self, req: NewCourseRequest) -> Result<Course, AppError> {
        require_text("Title", &req.title)?;
        require_text("Slug", &req.slug)?;
        self.instructor_reference(&req.instructor_id).await?;

        if self.repo.find_course_by_slug(&req.slug).await?.is_some() {
            return Err(AppError::Conflict(format!("Slug {} is already in use", req.slug)));
        }

        let course = Course {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            slug: req.slug,
            description: req.description,
            instructor_id: req.instructor_id,
            price: req.price,
            thumbnail: req.thumbnail,
            category: req.category,
            module_ids: Vec::new(),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.repo.insert_course(&course).await.map_err(slug_conflict)?;

        self.cache.invalidate(&[course_event(&course.id)]).await;
        info!(course_id = %course.id, "course created");
        Ok(course)
    }

    pub async fn update_course(
        &self,
        id: &str,
        req: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        let mut course = self.existing_course(id).await?;

        if let Some(title) = req.title {
            require_text("Title", &title)?;
            course.title = title;
        }
        if let Some(slug) = req.slug {
            require_text("Slug", &slug)?;
            if slug != course.slug {
                if let Some(other) = self.repo.find_course_by_slug(&slug).await? {
                    if other.id != course.id {
                        return Err(AppError::Conflict(format!("Slug {} is already in use", slug)));
                    }
                }
            }
            course.slug = slug;
        }
        if let Some(instructor_id) = req.instructor_id {
            if instructor_id != course.instructor_id {
                self.instructor_reference(&instructor_id).await?;
            }
            course.instructor_id = instructor_id;
        }
        if let Some(description) = req.description {
            course.description = Some(description);
        }
        if let Some(price) = req.price {
            course.price = price;
        }
        if let Some(thumbnail) = req.thumbnail {
            course.thumbnail = Some(thumbnail);
        }
        if let Some(category) = req.category {
            course.category = Some(category);
        }

        if !self.repo.update_course(&course).await.map_err(slug_conflict)? {
            return Err(AppError::NotFound("Course".to_string()));
        }

        self.cache.invalidate(&[course_event(&course.id)]).await;
        Ok(course)
    }

    pub async fn soft_delete_course(&self, id: &str) -> Result<Course, AppError> {
        let mut course = self.existing_course(id).await?;
        course.is_deleted = true;
        if !self.repo.update_course(&course).await? {
            return Err(AppError::NotFound("Course".to_string()));
        }

        self.cache.invalidate(&[course_event(&course.id)]).await;
        info!(course_id = %course.id, "course soft deleted");
        Ok(course)
    }

    /// Removes the course together with its modules and their lessons.
    pub async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        let course = self
            .repo
            .get_course(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course".to_string()))?;

        let mut events = Vec::new();
        let purged = self.purge_course(&course, &mut events).await;
        self.settle(&events, purged).await?;

        info!(course_id = %course.id, "course deleted");
        Ok(())
    }

    // ---- modules ----

    pub async fn get_module(&self, id: &str) -> Result<ModuleView, AppError> {
        let key = keys::module(id)?;
        self.cache
            .read_through(&key, self.ttl.view, || self.views.module_view(id))
            .await
    }

    pub async fn create_module(&self, req: NewModuleRequest) -> Result<Module, AppError> {
        require_text("Title", &req.title)?;
        let course = self.course_reference(&req.course_id).await?;

        let module = Module {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            order: req.order,
            course_id: course.id.clone(),
            lesson_ids: Vec::new(),
            is_deleted: false,
        };
        self.repo.insert_module(&module).await?;
        let linked = self.attach_module(&course.id, &module.id).await;
        self.settle(&[module_event(&module)], linked).await?;

        info!(module_id = %module.id, course_id = %course.id, "module created");
        Ok(module)
    }

    pub async fn update_module(
        &self,
        id: &str,
        req: UpdateModuleRequest,
    ) -> Result<Module, AppError> {
        let mut module = self.existing_module(id).await?;
        let previous_course = module.course_id.clone();

        if let Some(title) = req.title {
            require_text("Title", &title)?;
            module.title = title;
        }
        if let Some(order) = req.order {
            module.order = order;
        }
        let rehomed = match req.course_id {
            Some(course_id) if course_id != previous_course => {
                let target = self.course_reference(&course_id).await?;
                module.course_id = target.id;
                true
            }
            _ => false,
        };

        if !self.repo.update_module(&module).await? {
            return Err(AppError::NotFound("Module".to_string()));
        }

        let event = MutationEvent::new(EntityKind::Module, &module.id)
            .before(Lineage::course(&previous_course))
            .after(Lineage::course(&module.course_id));
        let relinked = if rehomed {
            self.relink_module(&previous_course, &module).await
        } else {
            Ok(())
        };
        self.settle(&[event], relinked).await?;

        if rehomed {
            info!(
                module_id = %module.id,
                from = %previous_course,
                to = %module.course_id,
                "module rehomed"
            );
        }
        Ok(module)
    }

    pub async fn soft_delete_module(&self, id: &str) -> Result<Module, AppError> {
        let mut module = self.existing_module(id).await?;
        module.is_deleted = true;
        if !self.repo.update_module(&module).await? {
            return Err(AppError::NotFound("Module".to_string()));
        }

        // Lessons stay stored but are no longer reachable through the module.
        let lineage = Lineage::module(&module.id, Some(module.course_id.clone()));
        let mut events: Vec<MutationEvent> = module
            .lesson_ids
            .iter()
            .map(|lesson_id| {
                MutationEvent::new(EntityKind::Lesson, lesson_id).within(lineage.clone())
            })
            .collect();
        events.push(module_event(&module));
        self.cache.invalidate(&events).await;
        Ok(module)
    }

    /// Removes the module and its lessons, and unlinks it from its course.
    pub async fn delete_module(&self, id: &str) -> Result<(), AppError> {
        let module = self
            .repo
            .get_module(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Module".to_string()))?;

        let mut events = Vec::new();
        let removed = match self.purge_module(&module, &mut events).await {
            Ok(()) => self.detach_module(&module.course_id, &module.id).await,
            Err(e) => Err(e),
        };
        self.settle(&events, removed).await?;

        info!(module_id = %module.id, "module deleted");
        Ok(())
    }

    // ---- lessons ----

    pub async fn get_lesson(&self, id: &str) -> Result<LessonView, AppError> {
        let key = keys::lesson(id)?;
        self.cache
            .read_through(&key, self.ttl.view, || self.views.lesson_view(id))
            .await
    }

    pub async fn create_lesson(&self, req: NewLessonRequest) -> Result<Lesson, AppError> {
        require_text("Title", &req.title)?;
        let module = self.module_reference(&req.module_id).await?;

        let lesson = Lesson {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            module_id: module.id.clone(),
            lesson_type: req.lesson_type,
            content_url: req.content_url,
            duration: req.duration,
            order: req.order,
            is_deleted: false,
        };
        self.repo.insert_lesson(&lesson).await?;
        let event = MutationEvent::new(EntityKind::Lesson, &lesson.id)
            .after(Lineage::module(&module.id, Some(module.course_id.clone())));
        let linked = self.attach_lesson(&module.id, &lesson.id).await;
        self.settle(&[event], linked).await?;

        info!(lesson_id = %lesson.id, module_id = %module.id, "lesson created");
        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        id: &str,
        req: UpdateLessonRequest,
    ) -> Result<Lesson, AppError> {
        let mut lesson = self.existing_lesson(id).await?;
        let before = self.lesson_lineage(&lesson.module_id).await?;
        let previous_module = lesson.module_id.clone();

        if let Some(title) = req.title {
            require_text("Title", &title)?;
            lesson.title = title;
        }
        if let Some(lesson_type) = req.lesson_type {
            lesson.lesson_type = lesson_type;
        }
        if let Some(content_url) = req.content_url {
            lesson.content_url = Some(content_url);
        }
        if let Some(duration) = req.duration {
            lesson.duration = duration;
        }
        if let Some(order) = req.order {
            lesson.order = order;
        }
        let after = match req.module_id {
            Some(module_id) if module_id != previous_module => {
                let target = self.module_reference(&module_id).await?;
                lesson.module_id = target.id.clone();
                Lineage::module(target.id, Some(target.course_id))
            }
            _ => before.clone(),
        };

        if !self.repo.update_lesson(&lesson).await? {
            return Err(AppError::NotFound("Lesson".to_string()));
        }

        let event = MutationEvent::new(EntityKind::Lesson, &lesson.id)
            .before(before)
            .after(after);
        let rehomed = lesson.module_id != previous_module;
        let relinked = if rehomed {
            self.relink_lesson(&previous_module, &lesson).await
        } else {
            Ok(())
        };
        self.settle(&[event], relinked).await?;

        if rehomed {
            info!(
                lesson_id = %lesson.id,
                from = %previous_module,
                to = %lesson.module_id,
                "lesson rehomed"
            );
        }
        Ok(lesson)
    }

    pub async fn soft_delete_lesson(&self, id: &str) -> Result<Lesson, AppError> {
        let mut lesson = self.existing_lesson(id).await?;
        lesson.is_deleted = true;
        if !self.repo.update_lesson(&lesson).await? {
            return Err(AppError::NotFound("Lesson".to_string()));
        }

        let lineage = self.lesson_lineage(&lesson.module_id).await?;
        self.cache
            .invalidate(&[MutationEvent::new(EntityKind::Lesson, &lesson.id).within(lineage)])
            .await;
        Ok(lesson)
    }

    pub async fn delete_lesson(&self, id: &str) -> Result<(), AppError> {
        let lesson = self
            .repo
            .get_lesson(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lesson".to_string()))?;
        let lineage = self.lesson_lineage(&lesson.module_id).await?;

        if !self.repo.delete_lesson(&lesson.id).await? {
            return Err(AppError::NotFound("Lesson".to_string()));
        }

        let event = MutationEvent::new(EntityKind::Lesson, &lesson.id).within(lineage);
        let unlinked = self.detach_lesson(&lesson.module_id, &lesson.id).await;
        self.settle(&[event], unlinked).await
    }
}
