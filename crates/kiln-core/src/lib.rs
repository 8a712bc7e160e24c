// Core modules
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod path;
pub mod template;

// Re-export commonly used types
pub use cache::CacheStats;
pub use config::{Delimiters, EngineConfig};
pub use engine::Engine;
pub use error::{Result, TemplateError};
pub use loader::{FsSource, MemorySource, TemplateSource};
pub use path::{PathResolver, TemplatePath};
