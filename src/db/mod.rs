pub mod memory;
pub mod repository;
pub mod sqlite;

pub use memory::MemoryRepository;
pub use repository::EntityRepository;
pub use sqlite::SqliteRepository;
