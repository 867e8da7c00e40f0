pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{
    AggregatorConfig, AppConfig, DirectoryConfig, OpenAlexConfig, ResolverConfig, StoreConfig,
};
pub use error::{CoreError, Result};
pub use models::*;

pub use storage::faculty_store::{FacultyStore, NameOrder};
pub use storage::identity_cache::{IdentityCache, MemoryIdentityCache, SqliteIdentityCache};
