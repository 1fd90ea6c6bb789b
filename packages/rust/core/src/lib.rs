//! Core pipeline orchestration for CourseGraph.
//!
//! This crate ties together catalog extraction, topic annotation and graph
//! serialization into the `build` workflow, and runs the report queries over
//! the written document.

pub mod pipeline;

pub use pipeline::{
    BuildConfig, BuildResult, CatalogSource, ProgressReporter, SilentProgress, build_graph,
    build_graph_with, extract_catalog, list_courses, run_queries,
};
