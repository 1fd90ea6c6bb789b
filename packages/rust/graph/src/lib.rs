//! Course knowledge graph: Turtle serialization of courses, topics, students
//! and grades, plus the SPARQL reports run over the written document.

pub mod namespaces;
pub mod query;
pub mod tabular;
pub mod turtle;

pub use namespaces::Namespaces;
pub use query::{EntityCounts, GradeRow, GraphQueryRunner, QueryReport, TopicRow};
pub use tabular::{read_fragment, read_grades, read_students};
pub use turtle::{
    GraphInputs, GraphOptions, RenderedGraph, TopicId, derive_topic_id, render_document,
    write_document,
};
