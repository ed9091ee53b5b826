pub mod project_cache;
pub mod schema;
pub mod store;

pub use project_cache::ProjectNameCache;
