//! Shared types, error model, and configuration for CourseGraph.
//!
//! This crate is the foundation depended on by all other CourseGraph crates.
//! It provides:
//! - [`CourseGraphError`]: the unified error type
//! - Domain types ([`Course`], [`CourseCatalog`], [`TopicMap`], [`Student`],
//!   [`GradeRecord`], [`Grade`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, FilesConfig, GraphConfig, QueryConfig, SpotlightConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{CourseGraphError, Result};
pub use types::{Course, CourseCatalog, Grade, GradeRecord, Student, TopicLink, TopicMap};
