pub mod faculty_store;
pub mod identity_cache;
pub mod schema;
