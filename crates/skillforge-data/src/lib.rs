pub mod builtin;
pub mod loader;
pub mod schema;

pub use builtin::{builtin_catalog, builtin_engine_config};
pub use loader::{DataLoadError, load_catalog, load_engine_config};
