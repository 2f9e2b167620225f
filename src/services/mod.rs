pub mod cache_aside;
pub mod catalog;
pub mod enrollment;
pub mod quiz;
pub mod view_builder;

pub use cache_aside::{CacheAside, CacheTtl};
pub use catalog::CatalogService;
pub use enrollment::EnrollmentService;
pub use quiz::QuizService;
pub use view_builder::ViewBuilder;
