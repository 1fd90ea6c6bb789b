//! Core domain types: courses, their topics, students and grades.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CourseGraphError, Result};

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// A topic found in a course description: lower-cased surface form and the
/// resource URI it links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicLink {
    pub term: String,
    pub uri: String,
}

/// Topic term to resource URI mapping.
///
/// Keeps first-insertion order; inserting an existing term overwrites its URI
/// in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicMap {
    entries: Vec<(String, String)>,
}

impl TopicMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a term.
    pub fn insert(&mut self, term: impl Into<String>, uri: impl Into<String>) {
        let term = term.into();
        let uri = uri.into();
        match self.entries.iter_mut().find(|(t, _)| *t == term) {
            Some(entry) => entry.1 = uri,
            None => self.entries.push((term, uri)),
        }
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, u)| u.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(term, uri)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, u)| (t.as_str(), u.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// A course scraped from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Subject code, e.g. `COMP`.
    pub subject: String,
    /// Course number, e.g. `6281`.
    pub number: String,
    /// Course name, e.g. `Applications of Cloud Computing`.
    pub name: String,
    /// Course description; empty when the listing has none.
    pub description: String,
    /// Topics found in the description.
    pub topics: TopicMap,
}

impl Course {
    pub fn new(
        subject: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            number: number.into(),
            name: name.into(),
            description: String::new(),
            topics: TopicMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Identity key used by the catalog map and the topic cache
    /// (`"COMP 6281 Applications of Cloud Computing"`).
    pub fn key(&self) -> String {
        format!("{} {} {}", self.subject, self.number, self.name)
    }

    /// Local name of the course node in the graph (`COMP6281`).
    pub fn graph_id(&self) -> String {
        format!("{}{}", self.subject, self.number)
    }
}

// ---------------------------------------------------------------------------
// CourseCatalog
// ---------------------------------------------------------------------------

/// Courses keyed by [`Course::key`], iterated in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a course. A course with an existing key replaces the earlier
    /// record but keeps its position.
    pub fn insert(&mut self, course: Course) {
        let key = course.key();
        match self.index.get(&key) {
            Some(&pos) => self.courses[pos] = course,
            None => {
                self.index.insert(key, self.courses.len());
                self.courses.push(course);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Course> {
        self.index.get(key).map(|&pos| &self.courses[pos])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Course> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.courses[pos]),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Course> {
        self.courses.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Course> {
        self.courses.iter_mut()
    }

    /// Total number of topic entries across all courses.
    pub fn topic_count(&self) -> usize {
        self.courses.iter().map(|c| c.topics.len()).sum()
    }
}

impl<'a> IntoIterator for &'a CourseCatalog {
    type Item = &'a Course;
    type IntoIter = std::slice::Iter<'a, Course>;

    fn into_iter(self) -> Self::IntoIter {
        self.courses.iter()
    }
}

// ---------------------------------------------------------------------------
// Students and grades
// ---------------------------------------------------------------------------

/// A row of `students.csv` (`first,last,mbox,id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub first: String,
    pub last: String,
    pub mbox: String,
    pub id: String,
}

/// A row of `grades.csv` (`student,grade,course`).
///
/// The letter is kept raw; [`GradeRecord::grade`] validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student: String,
    pub grade: String,
    pub course: String,
}

impl GradeRecord {
    pub fn grade(&self) -> Result<Grade> {
        self.grade.parse()
    }
}

/// Letter grade. A–D are passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Local name of the relation between a student and a course.
    pub fn predicate(&self) -> &'static str {
        match self {
            Self::A => "gotAin",
            Self::B => "gotBin",
            Self::C => "gotCin",
            Self::D => "gotDin",
            Self::F => "gotFin",
        }
    }

    pub fn is_passing(&self) -> bool {
        !matches!(self, Self::F)
    }
}

impl FromStr for Grade {
    type Err = CourseGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            other => Err(CourseGraphError::validation(format!(
                "unknown grade letter '{other}' (expected A, B, C, D or F)"
            ))),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}
