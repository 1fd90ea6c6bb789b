//! Readers for the external inputs: student and grade tables and the
//! ontology fragment.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use coursegraph_shared::{CourseGraphError, GradeRecord, Result, Student};

/// Read every row of a headed CSV file into `T`.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| CourseGraphError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| CourseGraphError::csv(path, e))?;

    debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

/// Students table, header `first,last,mbox,id`.
pub fn read_students(path: &Path) -> Result<Vec<Student>> {
    read_table(path)
}

/// Grades table, header `student,grade,course`.
///
/// Letters are not validated here; the writer rejects unknown ones.
pub fn read_grades(path: &Path) -> Result<Vec<GradeRecord>> {
    read_table(path)
}

/// The ontology fragment, verbatim.
pub fn read_fragment(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CourseGraphError::io(path, e))
}
