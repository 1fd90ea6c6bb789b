//! Graph Query Runner: loads a Turtle document into an in-memory oxigraph
//! store and answers the fixed report queries.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use tracing::{debug, info, instrument};

use coursegraph_shared::{CourseGraphError, Grade, QueryConfig, Result};

use crate::namespaces::{Namespaces, literal, prefixed};

/// Instance counts by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    pub students: usize,
    pub courses: usize,
    pub topics: usize,
}

/// A topic linked from a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRow {
    pub label: String,
    pub link: String,
}

/// A passing grade held by a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRow {
    pub student: String,
    /// `rdfs:label` of the grade predicate.
    pub grade: String,
    pub course: String,
}

/// One numbered report: a title and its rendered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
    pub number: u8,
    pub title: String,
    pub lines: Vec<String>,
}

/// Read-only query access to a loaded course graph.
pub struct GraphQueryRunner {
    store: Store,
    namespaces: Namespaces,
}

impl GraphQueryRunner {
    /// Load the document at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, base_iri: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| CourseGraphError::io(path, e))?;
        let runner = Self::from_reader(BufReader::new(file), base_iri)?;
        info!(triples = runner.triple_count()?, "loaded course graph");
        Ok(runner)
    }

    /// Load a document held in memory.
    pub fn from_turtle(text: &str, base_iri: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes(), base_iri)
    }

    fn from_reader(reader: impl Read, base_iri: &str) -> Result<Self> {
        let store = Store::new().map_err(graph_error)?;
        let parser = RdfParser::from_format(RdfFormat::Turtle)
            .with_base_iri(base_iri)
            .map_err(|e| CourseGraphError::config(format!("invalid base IRI '{base_iri}': {e}")))?;
        store
            .load_from_reader(parser, reader)
            .map_err(|e| CourseGraphError::Graph(format!("failed to parse course graph: {e}")))?;

        Ok(Self {
            store,
            namespaces: Namespaces::new(base_iri),
        })
    }

    /// Number of distinct triples.
    pub fn triple_count(&self) -> Result<usize> {
        let rows = self.select(
            "SELECT (COUNT(*) AS ?n) WHERE { SELECT DISTINCT ?s ?p ?o WHERE { ?s ?p ?o } }",
            &["n"],
        )?;
        count_value(&rows)
    }

    pub fn entity_counts(&self) -> Result<EntityCounts> {
        Ok(EntityCounts {
            students: self.count_instances("uni:Student")?,
            courses: self.count_instances("uni:Course")?,
            topics: self.count_instances("uni:topic")?,
        })
    }

    /// Topics covered by `course` (a graph id such as `COMP6281`).
    pub fn course_topics(&self, course: &str) -> Result<Vec<TopicRow>> {
        let query = format!(
            "SELECT ?label ?uri WHERE {{\n  \
               {} uni:hasTopic ?x .\n  \
               ?x rdfs:label ?label .\n  \
               ?x uni:link ?uri .\n\
             }} ORDER BY ?label",
            prefixed("uni", course)
        );
        Ok(self
            .select(&query, &["label", "uri"])?
            .into_iter()
            .map(|mut row| TopicRow {
                link: row.pop().unwrap_or_default(),
                label: row.pop().unwrap_or_default(),
            })
            .collect())
    }

    /// Courses passed by students with the given first name.
    pub fn student_grades(&self, given_name: &str) -> Result<Vec<GradeRow>> {
        let query = format!(
            "SELECT DISTINCT ?name ?grade ?class WHERE {{\n  \
               ?x a uni:Student ;\n     \
                  foaf:givenName {} ;\n     \
                  foaf:givenName ?name .\n  \
               ?z a uni:Course ;\n     \
                  uni:name ?class .\n  \
               VALUES ?y {{ {} }}\n  \
               ?x ?y ?z .\n  \
               ?y rdfs:label ?grade .\n\
             }} ORDER BY ?class",
            literal(given_name),
            passing_predicates().join(" ")
        );
        Ok(self
            .select(&query, &["name", "grade", "class"])?
            .into_iter()
            .map(|mut row| GradeRow {
                course: row.pop().unwrap_or_default(),
                grade: row.pop().unwrap_or_default(),
                student: row.pop().unwrap_or_default(),
            })
            .collect())
    }

    /// First names of students who passed a course covering `topic`.
    pub fn students_familiar_with(&self, topic: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT ?student WHERE {{\n  \
               ?c uni:hasTopic {} .\n  \
               {}\n  \
               ?s foaf:givenName ?student .\n\
             }} ORDER BY ?student",
            prefixed("uni", topic),
            passing_union("?s", "?c")
        );
        self.select_column(&query, "student")
    }

    /// Topic labels across every course passed by the student with `student_id`.
    pub fn topics_known_by(&self, student_id: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT ?topic WHERE {{\n  \
               ?s a uni:Student ;\n     \
                  uni:hasStudentID {} .\n  \
               {}\n  \
               ?c uni:hasTopic ?t .\n  \
               ?t rdfs:label ?topic .\n\
             }} ORDER BY ?topic",
            literal(student_id),
            passing_union("?s", "?c")
        );
        self.select_column(&query, "topic")
    }

    /// Run the six reports with the configured parameters.
    #[instrument(skip_all)]
    pub fn run_reports(&self, params: &QueryConfig) -> Result<Vec<QueryReport>> {
        let counts = self.entity_counts()?;

        let reports = vec![
            QueryReport {
                number: 1,
                title: "Total number of triples in the KB.".into(),
                lines: vec![format!("Number of triples in KB: {}", self.triple_count()?)],
            },
            QueryReport {
                number: 2,
                title: "Total number of students, courses, and topics.".into(),
                lines: vec![
                    format!("Number of students: {}", counts.students),
                    format!("Number of courses: {}", counts.courses),
                    format!("Number of topics: {}", counts.topics),
                ],
            },
            QueryReport {
                number: 3,
                title: format!("For a course ({}), list all covered topics.", params.course),
                lines: self
                    .course_topics(&params.course)?
                    .into_iter()
                    .map(|t| format!("{} {}", t.label, t.link))
                    .collect(),
            },
            QueryReport {
                number: 4,
                title: format!(
                    "For a given student ({}), list all courses this student completed.",
                    params.student_name
                ),
                lines: self
                    .student_grades(&params.student_name)?
                    .into_iter()
                    .map(|g| format!("{} {} {}", g.student, g.grade, g.course))
                    .collect(),
            },
            QueryReport {
                number: 5,
                title: format!(
                    "For a given topic ({}), list all students that are familiar with the topic.",
                    params.topic
                ),
                lines: self.students_familiar_with(&params.topic)?,
            },
            QueryReport {
                number: 6,
                title: format!(
                    "For a student ({}), list all topics they know.",
                    params.student_id
                ),
                lines: self.topics_known_by(&params.student_id)?,
            },
        ];

        debug!(reports = reports.len(), "ran report queries");
        Ok(reports)
    }

    fn count_instances(&self, class: &str) -> Result<usize> {
        let query = format!("SELECT (COUNT(DISTINCT ?s) AS ?n) WHERE {{ ?s a {class} }}");
        count_value(&self.select(&query, &["n"])?)
    }

    fn select_column(&self, query: &str, var: &str) -> Result<Vec<String>> {
        Ok(self
            .select(query, &[var])?
            .into_iter()
            .filter_map(|mut row| row.pop())
            .collect())
    }

    /// Run a SELECT and render the requested variables of each solution.
    fn select(&self, body: &str, vars: &[&str]) -> Result<Vec<Vec<String>>> {
        let query = format!("{}{body}", self.namespaces.sparql_prefixes());
        debug!(%query, "sparql");

        let results = self.store.query(query.as_str()).map_err(graph_error)?;
        let QueryResults::Solutions(solutions) = results else {
            return Err(CourseGraphError::Graph("expected SELECT results".into()));
        };

        let mut rows = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(graph_error)?;
            rows.push(
                vars.iter()
                    .map(|var| solution.get(*var).map(render_term).unwrap_or_default())
                    .collect(),
            );
        }
        Ok(rows)
    }
}

fn passing_predicates() -> Vec<String> {
    Grade::ALL
        .iter()
        .filter(|g| g.is_passing())
        .map(|g| prefixed("uni", g.predicate()))
        .collect()
}

/// `{ ?s uni:gotAin ?c . } UNION { ... }` over the passing grades.
fn passing_union(student: &str, course: &str) -> String {
    passing_predicates()
        .iter()
        .map(|p| format!("{{ {student} {p} {course} . }}"))
        .collect::<Vec<_>>()
        .join(" UNION ")
}

fn render_term(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::Literal(lit) => lit.value().to_string(),
        other => other.to_string(),
    }
}

fn count_value(rows: &[Vec<String>]) -> Result<usize> {
    let raw = rows
        .first()
        .and_then(|row| row.first())
        .ok_or_else(|| CourseGraphError::Graph("count query returned no rows".into()))?;
    raw.parse()
        .map_err(|e| CourseGraphError::Graph(format!("invalid count '{raw}': {e}")))
}

fn graph_error(e: impl std::fmt::Display) -> CourseGraphError {
    CourseGraphError::Graph(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turtle::{GraphInputs, GraphOptions, render_document};
    use coursegraph_shared::{Course, CourseCatalog, GradeRecord, Student};

    const BASE: &str = "http://localhost:3030/assignment1/";

    const FRAGMENT: &str = r#"uni:Student a rdfs:Class ;
  rdfs:label "Student"@en .
uni:gotAin a rdf:Property ; rdfs:label "got an A in" .
uni:gotBin a rdf:Property ; rdfs:label "got a B in" .
uni:gotCin a rdf:Property ; rdfs:label "got a C in" .
uni:gotDin a rdf:Property ; rdfs:label "got a D in" .
uni:gotFin a rdf:Property ; rdfs:label "got an F in" .
"#;

    fn student(first: &str, id: &str) -> Student {
        Student {
            first: first.into(),
            last: "Doe".into(),
            mbox: format!("{}@example.com", first.to_lowercase()),
            id: id.into(),
        }
    }

    fn grade(student: &str, letter: &str, course: &str) -> GradeRecord {
        GradeRecord {
            student: student.into(),
            grade: letter.into(),
            course: course.into(),
        }
    }

    fn sample_runner() -> GraphQueryRunner {
        let mut catalog = CourseCatalog::new();

        let mut cloud = Course::new("COMP", "6281", "Applications of Cloud Computing")
            .with_description("Cloud computing and scalability.");
        cloud.topics.insert("cloud computing", "http://dbpedia.org/resource/Cloud_computing");
        cloud.topics.insert("scalability", "http://dbpedia.org/resource/Scalability");
        catalog.insert(cloud);

        let mut distributed = Course::new("COMP", "6231", "Distributed System Design")
            .with_description("Distributed systems.");
        distributed.topics.insert("scalability", "http://dbpedia.org/resource/Scalability");
        distributed
            .topics
            .insert("middleware", "http://dbpedia.org/resource/Middleware");
        catalog.insert(distributed);

        catalog.insert(Course::new("COMP", "6961", "Graduate Seminar"));

        let students = [
            student("Agnes", "A1A1A1A1"),
            student("Cindy", "C2C2C2C2"),
            student("Janet", "J3J3J3J3"),
        ];
        let grades = [
            grade("Agnes", "A", "COMP6281"),
            grade("Agnes", "B", "COMP6231"),
            grade("Cindy", "C", "COMP6231"),
            grade("Janet", "F", "COMP6231"),
        ];

        let rendered = render_document(
            GraphInputs {
                catalog: &catalog,
                students: &students,
                grades: &grades,
                fragment: FRAGMENT,
            },
            &GraphOptions::default(),
        )
        .unwrap();

        GraphQueryRunner::from_turtle(&rendered.text, BASE).unwrap()
    }

    #[test]
    fn counts_entities() {
        let runner = sample_runner();
        assert_eq!(
            runner.entity_counts().unwrap(),
            EntityCounts {
                students: 3,
                courses: 3,
                topics: 3,
            }
        );
        assert!(runner.triple_count().unwrap() > 3 * 5);
    }

    #[test]
    fn lists_course_topics() {
        let topics = sample_runner().course_topics("COMP6281").unwrap();
        assert_eq!(
            topics,
            vec![
                TopicRow {
                    label: "Cloud_computing".into(),
                    link: "http://dbpedia.org/resource/Cloud_computing".into(),
                },
                TopicRow {
                    label: "Scalability".into(),
                    link: "http://dbpedia.org/resource/Scalability".into(),
                },
            ]
        );
    }

    #[test]
    fn lists_passed_courses_with_grade_labels() {
        let grades = sample_runner().student_grades("Agnes").unwrap();
        assert_eq!(
            grades,
            vec![
                GradeRow {
                    student: "Agnes".into(),
                    grade: "got an A in".into(),
                    course: "Applications of Cloud Computing".into(),
                },
                GradeRow {
                    student: "Agnes".into(),
                    grade: "got a B in".into(),
                    course: "Distributed System Design".into(),
                },
            ]
        );
    }

    #[test]
    fn failing_students_are_not_familiar_with_topic() {
        let names = sample_runner().students_familiar_with("Scalability").unwrap();
        assert_eq!(names, vec!["Agnes".to_string(), "Cindy".to_string()]);
    }

    #[test]
    fn topics_known_by_student_id() {
        let topics = sample_runner().topics_known_by("C2C2C2C2").unwrap();
        assert_eq!(topics, vec!["Middleware".to_string(), "Scalability".to_string()]);

        assert!(sample_runner().topics_known_by("J3J3J3J3").unwrap().is_empty());
    }

    #[test]
    fn reports_are_numbered_in_order() {
        let reports = sample_runner().run_reports(&QueryConfig::default()).unwrap();
        let numbers: Vec<u8> = reports.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            reports[1].lines,
            vec![
                "Number of students: 3".to_string(),
                "Number of courses: 3".to_string(),
                "Number of topics: 3".to_string(),
            ]
        );
        assert_eq!(reports[3].lines[0], "Agnes got an A in Applications of Cloud Computing");
    }

    fn bare_graph_triples(catalog: &CourseCatalog) -> usize {
        let rendered = render_document(
            GraphInputs {
                catalog,
                students: &[],
                grades: &[],
                fragment: "",
            },
            &GraphOptions::default(),
        )
        .unwrap();
        GraphQueryRunner::from_turtle(&rendered.text, BASE)
            .unwrap()
            .triple_count()
            .unwrap()
    }

    #[test]
    fn each_bare_course_adds_five_triples() {
        let schema = bare_graph_triples(&CourseCatalog::new());
        assert!(schema > 0);

        for n in [1usize, 4, 9] {
            let mut catalog = CourseCatalog::new();
            for i in 0..n {
                catalog.insert(Course::new("COMP", (6000 + i).to_string(), "Seminar"));
            }
            assert_eq!(bare_graph_triples(&catalog), schema + 5 * n, "n = {n}");
        }
    }

    #[test]
    fn triple_count_is_linear_in_topics() {
        let schema = bare_graph_triples(&CourseCatalog::new());
        let courses = 2usize;

        for k in [0usize, 1, 3, 6] {
            let mut catalog = CourseCatalog::new();
            for i in 0..courses {
                let mut course = Course::new("COMP", (6000 + i).to_string(), "Topics")
                    .with_description("Described.");
                for j in 0..k {
                    course.topics.insert(
                        format!("term {i} {j}"),
                        format!("http://dbpedia.org/resource/Topic_{i}_{j}"),
                    );
                }
                catalog.insert(course);
            }
            // Six course statements, then one reference plus three declarations per topic.
            assert_eq!(
                bare_graph_triples(&catalog),
                schema + courses * (6 + 4 * k),
                "k = {k}"
            );
        }
    }

    #[test]
    fn shared_topic_is_declared_once_in_the_store() {
        let schema = bare_graph_triples(&CourseCatalog::new());
        let mut catalog = CourseCatalog::new();
        for number in ["6231", "6281"] {
            let mut course = Course::new("COMP", number, "Shared").with_description("Described.");
            course
                .topics
                .insert("scalability", "http://dbpedia.org/resource/Scalability");
            catalog.insert(course);
        }
        assert_eq!(bare_graph_triples(&catalog), schema + 2 * 7 + 3);
    }

    #[test]
    fn unusual_topic_uris_load() {
        let names = [
            "C++",
            "Node.js",
            "Dijkstra's_algorithm",
            "Erd\u{151}s_number",
            "Inc.",
            "Peer\u{2013}to\u{2013}peer",
            "Node_(computer_science)",
            "-1",
            "Caf\u{E9}\u{B7}au",
            "\u{24B6}",
        ];
        let mut course = Course::new("COMP", "6741", "Intelligent Systems").with_description("x");
        for (i, name) in names.iter().enumerate() {
            course
                .topics
                .insert(format!("t{i}"), format!("http://dbpedia.org/resource/{name}"));
        }
        let mut catalog = CourseCatalog::new();
        catalog.insert(course);

        let rendered = render_document(
            GraphInputs {
                catalog: &catalog,
                students: &[],
                grades: &[],
                fragment: "",
            },
            &GraphOptions::default(),
        )
        .unwrap();
        let runner = GraphQueryRunner::from_turtle(&rendered.text, BASE).unwrap();

        assert_eq!(runner.entity_counts().unwrap().topics, names.len());
        let labels: Vec<String> = runner
            .course_topics("COMP6741")
            .unwrap()
            .into_iter()
            .map(|t| t.label)
            .collect();
        assert!(labels.contains(&"\u{24B6}".to_string()));
        assert!(labels.contains(&"Peer_to_peer".to_string()));
        assert!(labels.contains(&"C++".to_string()));
    }

    #[test]
    fn malformed_document_is_graph_error() {
        let text = "@prefix uni: <http://x/> .\nuni:a uni:b";
        let result = GraphQueryRunner::from_turtle(text, BASE);
        assert!(matches!(result, Err(CourseGraphError::Graph(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kg.ttl");
        std::fs::write(
            &path,
            format!("@prefix uni: <{BASE}> .\nuni:COMP6281 a uni:Course .\n"),
        )
        .unwrap();

        let runner = GraphQueryRunner::load(&path, BASE).unwrap();
        assert_eq!(runner.entity_counts().unwrap().courses, 1);
        assert_eq!(runner.triple_count().unwrap(), 1);
    }
}
