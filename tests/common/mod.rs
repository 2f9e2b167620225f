#![allow(dead_code)]

pub mod flaky;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lms_backend::cache::{CacheStore, MemoryCache};
use lms_backend::db::{EntityRepository, MemoryRepository};
use lms_backend::error::CacheError;
use lms_backend::models::{Course, Lesson, LessonType, Module, Role, User};
use lms_backend::services::CacheTtl;
use lms_backend::state::AppState;

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id.to_lowercase()),
        password_hash: "hash".to_string(),
        refresh_token: None,
        role,
    }
}

pub fn course(id: &str, module_ids: &[&str]) -> Course {
    Course {
        id: id.to_string(),
        title: format!("Course {}", id),
        slug: format!("course-{}", id.to_lowercase()),
        description: None,
        instructor_id: "U1".to_string(),
        price: 0.0,
        thumbnail: None,
        category: None,
        module_ids: module_ids.iter().map(|s| s.to_string()).collect(),
        is_deleted: false,
        created_at: Utc::now(),
    }
}

pub fn module(id: &str, course_id: &str, order: i64, lesson_ids: &[&str]) -> Module {
    Module {
        id: id.to_string(),
        title: format!("Module {}", id),
        order,
        course_id: course_id.to_string(),
        lesson_ids: lesson_ids.iter().map(|s| s.to_string()).collect(),
        is_deleted: false,
    }
}

pub fn lesson(id: &str, module_id: &str, order: i64) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: format!("Lesson {}", id),
        module_id: module_id.to_string(),
        lesson_type: LessonType::Video,
        content_url: None,
        duration: 300,
        order,
        is_deleted: false,
    }
}

/// Two courses: C1 holds M1 (lessons L1 order 2, L2 order 1), C2 holds M2
/// (no lessons). U1 teaches both; S1 is a student.
pub async fn seed(repo: &MemoryRepository) {
    repo.insert_user(&user("U1", Role::Instructor)).await.unwrap();
    repo.insert_user(&user("S1", Role::Student)).await.unwrap();
    repo.insert_user(&user("S2", Role::Student)).await.unwrap();

    repo.insert_course(&course("C1", &["M1"])).await.unwrap();
    repo.insert_course(&course("C2", &["M2"])).await.unwrap();
    repo.insert_module(&module("M1", "C1", 0, &["L1", "L2"])).await.unwrap();
    repo.insert_module(&module("M2", "C2", 0, &[])).await.unwrap();
    repo.insert_lesson(&lesson("L1", "M1", 2)).await.unwrap();
    repo.insert_lesson(&lesson("L2", "M1", 1)).await.unwrap();
}

pub fn state_with(repo: Arc<dyn EntityRepository>, cache: Arc<dyn CacheStore>) -> AppState {
    AppState::new(repo, cache, CacheTtl::default(), chrono::Duration::days(5))
}

pub struct Harness {
    pub repo: Arc<MemoryRepository>,
    pub cache: Arc<MemoryCache>,
    pub state: AppState,
}

pub async fn harness() -> Harness {
    let repo = Arc::new(MemoryRepository::new());
    seed(&repo).await;
    let cache = Arc::new(MemoryCache::new());
    let state = state_with(repo.clone(), cache.clone());
    Harness { repo, cache, state }
}

/// Cache whose every operation fails.
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("cache down".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("cache down".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("cache down".to_string()))
    }
}

/// Records, for each delete, which module the watched lesson belonged to in
/// the repository at that moment.
pub struct RecordingCache {
    pub inner: MemoryCache,
    pub repo: Arc<MemoryRepository>,
    pub lesson_id: String,
    pub seen: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingCache {
    pub fn new(repo: Arc<MemoryRepository>, lesson_id: &str) -> Self {
        Self {
            inner: MemoryCache::new(),
            repo,
            lesson_id: lesson_id.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let module_id = self
            .repo
            .get_lesson(&self.lesson_id)
            .await
            .ok()
            .flatten()
            .map(|lesson| lesson.module_id);
        self.seen.lock().unwrap().push((key.to_string(), module_id));
        self.inner.delete(key).await
    }
}

/// Asserts the paired references agree in both directions for every live row.
pub async fn assert_consistent(repo: &MemoryRepository, course_ids: &[&str]) {
    for course_id in course_ids {
        let course = repo.get_course(course_id).await.unwrap().unwrap();
        for module in repo.get_modules(&course.module_ids).await.unwrap() {
            assert_eq!(module.course_id, course.id, "module {} back reference", module.id);
            for lesson in repo.get_lessons(&module.lesson_ids).await.unwrap() {
                assert_eq!(lesson.module_id, module.id, "lesson {} back reference", lesson.id);
            }
        }
    }
}
