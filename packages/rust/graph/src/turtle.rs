//! Turtle writer for the course knowledge graph.
//!
//! Section order is fixed: prefixes, schema, the supplementary fragment,
//! courses, topics, students, grades.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use tracing::{info, instrument, warn};

use coursegraph_shared::{
    Course, CourseCatalog, CourseGraphError, GradeRecord, GraphConfig, Result, Student,
};

use crate::namespaces::{Namespaces, iri, literal, prefixed};

/// Schema for courses and topics, emitted verbatim after the prefixes.
const SCHEMA: &str = r#"uni:Course a rdfs:Class ;
  rdfs:label    "Course"@en ;
  rdfs:comment  "A course at a university." .

uni:subject a rdf:Property ;
  rdfs:label    "Subject"@en ;
  rdfs:comment  "The course subject (e.g. COMP for Computer Science)." ;
  rdfs:domain   uni:Course .

uni:number a rdf:Property ;
  rdfs:label    "Number"@en ;
  rdfs:comment  "The course number, usually composed of 3 or 4 digits." ;
  rdfs:domain   uni:Course .

uni:name a rdf:Property ;
  rdfs:label    "Name"@en ;
  rdfs:comment  "The course name (e.g. Intelligent Systems)." ;
  rdfs:domain   uni:Course .

uni:description a rdf:Property ;
  rdfs:label    "Description"@en ;
  rdfs:comment  "The course description" ;
  rdfs:domain   uni:Course .

uni:taught_at a rdf:Property ;
  rdfs:label    "Taught at"@en ;
  rdfs:comment  "The academic institution at which the course is taught." ;
  rdfs:domain   uni:Course ;
  rdfs:range    dbo:University .

uni:topic a rdfs:Class ;
  rdfs:label    "has topic"@en ;
  rdfs:comment  "Topic " .

uni:hasTopic a rdf:Property ;
  rdfs:label    "has the topic"@en ;
  rdfs:comment  "predicate that denotes a course having a topic " .

uni:label a rdf:Property ;
  rdfs:label    "Topic"@en ;
  rdfs:comment  "predicate that denotes that a course has a specific topic " .

uni:link a rdf:Property ;
  rdfs:label    "URI is"@en ;
  rdfs:comment  "predicate that denotes a link to URI " .

"#;

// ---------------------------------------------------------------------------
// Options and inputs
// ---------------------------------------------------------------------------

/// Namespace settings for the writer.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// IRI bound to `uni:`.
    pub base_iri: String,
    /// Namespace stripped from topic URIs.
    pub topic_namespace: String,
    /// `dbr:` local name of the institution.
    pub institution: String,
}

impl From<&GraphConfig> for GraphOptions {
    fn from(config: &GraphConfig) -> Self {
        Self {
            base_iri: config.base_iri.clone(),
            topic_namespace: config.topic_namespace.clone(),
            institution: config.institution.clone(),
        }
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::from(&GraphConfig::default())
    }
}

/// Everything that goes into one document.
#[derive(Debug, Clone, Copy)]
pub struct GraphInputs<'a> {
    pub catalog: &'a CourseCatalog,
    pub students: &'a [Student],
    pub grades: &'a [GradeRecord],
    /// Turtle copied verbatim after the schema.
    pub fragment: &'a str,
}

/// A rendered document and what it contains.
#[derive(Debug, Clone)]
pub struct RenderedGraph {
    pub text: String,
    pub courses: usize,
    pub topics: usize,
    pub students: usize,
    pub grades: usize,
}

// ---------------------------------------------------------------------------
// Topic identifiers
// ---------------------------------------------------------------------------

/// A topic node derived from a resource URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicId {
    /// Local name under `uni:` (also used as the label).
    pub local: String,
    /// The cleaned resource URI the topic links back to.
    pub link: String,
}

/// Derive the topic node for `uri`.
///
/// En dashes become underscores and parentheses are dropped, then
/// `namespace` is stripped. URIs outside `namespace` yield `None`.
pub fn derive_topic_id(uri: &str, namespace: &str) -> Option<TopicId> {
    let link: String = uri
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if c == '\u{2013}' { '_' } else { c })
        .collect();

    let local = link.strip_prefix(namespace)?.to_string();
    if local.is_empty() {
        return None;
    }

    Some(TopicId { local, link })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the full document.
#[instrument(
    skip_all,
    fields(
        courses = inputs.catalog.len(),
        students = inputs.students.len(),
        grades = inputs.grades.len()
    )
)]
pub fn render_document(inputs: GraphInputs<'_>, opts: &GraphOptions) -> Result<RenderedGraph> {
    let ns = Namespaces::new(opts.base_iri.as_str());
    let institution = prefixed("dbr", &opts.institution);

    let mut out = String::with_capacity(64 * 1024);

    out.push_str(&ns.turtle_prefixes());
    out.push('\n');
    out.push_str(SCHEMA);

    out.push_str(inputs.fragment);
    if !inputs.fragment.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');

    // Courses; topic nodes are collected in first-reference order.
    let mut topics: Vec<TopicId> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for course in inputs.catalog {
        let course_topics = course_topic_ids(course, &opts.topic_namespace);
        write_course(&mut out, course, &institution, &course_topics);

        for topic in course_topics {
            if seen.insert(topic.local.clone()) {
                topics.push(topic);
            }
        }
    }

    for topic in &topics {
        write_topic(&mut out, topic);
    }
    if !topics.is_empty() {
        out.push('\n');
    }

    for student in inputs.students {
        write_student(&mut out, student, &institution);
    }

    for record in inputs.grades {
        let grade = record.grade().map_err(|e| {
            CourseGraphError::validation(format!(
                "grade row ({}, {}, {}): {e}",
                record.student, record.grade, record.course
            ))
        })?;
        let _ = writeln!(
            out,
            "{} {} {} .",
            prefixed("uni", &record.student),
            prefixed("uni", grade.predicate()),
            prefixed("uni", &record.course)
        );
    }

    info!(topics = topics.len(), bytes = out.len(), "rendered course graph");

    Ok(RenderedGraph {
        text: out,
        courses: inputs.catalog.len(),
        topics: topics.len(),
        students: inputs.students.len(),
        grades: inputs.grades.len(),
    })
}

/// Render and write the document to `path`, replacing any previous file.
pub fn write_document(
    path: &Path,
    inputs: GraphInputs<'_>,
    opts: &GraphOptions,
) -> Result<RenderedGraph> {
    let rendered = render_document(inputs, opts)?;
    std::fs::write(path, &rendered.text).map_err(|e| CourseGraphError::io(path, e))?;
    info!(path = %path.display(), "wrote course graph");
    Ok(rendered)
}

fn course_topic_ids(course: &Course, namespace: &str) -> Vec<TopicId> {
    course
        .topics
        .iter()
        .filter_map(|(term, uri)| {
            let id = derive_topic_id(uri, namespace);
            if id.is_none() {
                warn!(
                    course = %course.key(),
                    term,
                    uri,
                    "topic URI outside topic namespace, skipping"
                );
            }
            id
        })
        .collect()
}

fn write_course(out: &mut String, course: &Course, institution: &str, topics: &[TopicId]) {
    let mut lines = vec![
        format!("{} a uni:Course", prefixed("uni", &course.graph_id())),
        format!("  uni:taught_at    {institution}"),
        format!("  uni:subject      {}", literal(&course.subject)),
        format!("  uni:number       {}", literal(&course.number)),
        format!("  uni:name         {}", literal(&course.name)),
    ];

    if !course.description.is_empty() {
        lines.push(format!("  uni:description  {}", literal(&course.description)));
    }

    for topic in topics {
        lines.push(format!("  uni:hasTopic     {}", prefixed("uni", &topic.local)));
    }

    out.push_str(&lines.join(" ;\n"));
    out.push_str(" .\n\n");
}

fn write_topic(out: &mut String, topic: &TopicId) {
    let node = prefixed("uni", &topic.local);
    let _ = writeln!(out, "{node} a uni:topic .");
    let _ = writeln!(out, "{node} rdfs:label {} .", literal(&topic.local));
    let _ = writeln!(out, "{node} uni:link {} .", iri(&topic.link));
}

fn write_student(out: &mut String, student: &Student, institution: &str) {
    let _ = write!(
        out,
        "{} a uni:Student ;\n  \
         foaf:givenName    {} ;\n  \
         foaf:familyName   {} ;\n  \
         uni:enrolled_at   {institution} ;\n  \
         foaf:mbox         {} ;\n  \
         uni:hasStudentID  {} .\n\n",
        prefixed("uni", &student.first),
        literal(&student.first),
        literal(&student.last),
        literal(&student.mbox),
        literal(&student.id),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_course() -> Course {
        Course::new("COMP", "6281", "Applications of Cloud Computing")
    }

    fn render(
        catalog: &CourseCatalog,
        students: &[Student],
        grades: &[GradeRecord],
    ) -> Result<RenderedGraph> {
        render_document(
            GraphInputs {
                catalog,
                students,
                grades,
                fragment: "uni:Student a rdfs:Class .",
            },
            &GraphOptions::default(),
        )
    }

    fn grade(student: &str, letter: &str, course: &str) -> GradeRecord {
        GradeRecord {
            student: student.into(),
            grade: letter.into(),
            course: course.into(),
        }
    }

    #[test]
    fn derive_topic_id_strips_namespace_and_cleans() {
        let id = derive_topic_id(
            "http://dbpedia.org/resource/Node_(computer_science)",
            "http://dbpedia.org/resource/",
        )
        .unwrap();
        assert_eq!(id.local, "Node_computer_science");
        assert_eq!(id.link, "http://dbpedia.org/resource/Node_computer_science");

        let id = derive_topic_id(
            "http://dbpedia.org/resource/Peer\u{2013}to\u{2013}peer",
            "http://dbpedia.org/resource/",
        )
        .unwrap();
        assert_eq!(id.local, "Peer_to_peer");
    }

    #[test]
    fn derive_topic_id_is_deterministic() {
        let uri = "http://dbpedia.org/resource/Scalability";
        let ns = "http://dbpedia.org/resource/";
        assert_eq!(derive_topic_id(uri, ns), derive_topic_id(uri, ns));
    }

    #[test]
    fn derive_topic_id_rejects_other_namespaces() {
        let ns = "http://dbpedia.org/resource/";
        assert!(derive_topic_id("http://fr.dbpedia.org/resource/Nuage", ns).is_none());
        assert!(derive_topic_id("http://dbpedia.org/resource/", ns).is_none());
    }

    #[test]
    fn derive_topic_id_handles_longer_namespaces() {
        let id = derive_topic_id(
            "https://example.org/knowledge/resource/Scalability",
            "https://example.org/knowledge/resource/",
        )
        .unwrap();
        assert_eq!(id.local, "Scalability");
    }

    #[test]
    fn course_without_description_has_five_statements() {
        let mut catalog = CourseCatalog::new();
        catalog.insert(cloud_course());
        let rendered = render(&catalog, &[], &[]).unwrap();

        let expected = "uni:COMP6281 a uni:Course ;\n  \
            uni:taught_at    dbr:Concordia_University ;\n  \
            uni:subject      \"COMP\" ;\n  \
            uni:number       \"6281\" ;\n  \
            uni:name         \"Applications of Cloud Computing\" .\n\n";
        assert!(rendered.text.contains(expected), "got:\n{}", rendered.text);
        assert!(!rendered.text.contains("uni:description  \""));
        assert_eq!(rendered.topics, 0);
    }

    #[test]
    fn course_with_description_and_topics() {
        let mut course = cloud_course().with_description("Cloud computing and scalability.");
        course.topics.insert("cloud", "http://dbpedia.org/resource/Cloud_computing");
        course.topics.insert("scalability", "http://dbpedia.org/resource/Scalability");
        let mut catalog = CourseCatalog::new();
        catalog.insert(course);

        let rendered = render(&catalog, &[], &[]).unwrap();
        let text = &rendered.text;

        assert!(text.contains(
            "  uni:description  \"Cloud computing and scalability.\" ;\n  \
             uni:hasTopic     uni:Cloud_computing ;\n  \
             uni:hasTopic     uni:Scalability .\n"
        ));
        assert!(text.contains("uni:Cloud_computing a uni:topic .\n"));
        assert!(text.contains("uni:Cloud_computing rdfs:label \"Cloud_computing\" .\n"));
        assert!(text.contains(
            "uni:Cloud_computing uni:link <http://dbpedia.org/resource/Cloud_computing> .\n"
        ));
        assert_eq!(rendered.topics, 2);
    }

    #[test]
    fn shared_topics_are_declared_once() {
        let mut catalog = CourseCatalog::new();
        for (num, name) in [("6231", "Distributed System Design"), ("6281", "Cloud")] {
            let mut course = Course::new("COMP", num, name).with_description("d");
            course.topics.insert("scalability", "http://dbpedia.org/resource/Scalability");
            catalog.insert(course);
        }

        let rendered = render(&catalog, &[], &[]).unwrap();
        assert_eq!(rendered.text.matches("uni:Scalability a uni:topic .").count(), 1);
        assert_eq!(rendered.text.matches("uni:hasTopic     uni:Scalability").count(), 2);
    }

    #[test]
    fn sections_appear_in_order() {
        let mut catalog = CourseCatalog::new();
        catalog.insert(cloud_course());
        let students = [Student {
            first: "Agnes".into(),
            last: "Smith".into(),
            mbox: "agnes@example.com".into(),
            id: "A1A1A1A1".into(),
        }];
        let grades = [grade("Agnes", "A", "COMP6281")];

        let text = render(&catalog, &students, &grades).unwrap().text;
        let prefix = text.find("@prefix rdf:").unwrap();
        let schema = text.find("uni:Course a rdfs:Class").unwrap();
        let fragment = text.find("uni:Student a rdfs:Class .").unwrap();
        let course = text.find("uni:COMP6281 a uni:Course").unwrap();
        let student = text.find("uni:Agnes a uni:Student").unwrap();
        let grade_line = text.find("uni:Agnes uni:gotAin uni:COMP6281 .").unwrap();
        assert!(prefix < schema && schema < fragment && fragment < course);
        assert!(course < student && student < grade_line);
        assert!(text.contains("  uni:hasStudentID  \"A1A1A1A1\" .\n"));
    }

    #[test]
    fn grade_row_becomes_relation() {
        let catalog = CourseCatalog::new();
        let text = render(&catalog, &[], &[grade("Agnes", "A", "COMP6281")]).unwrap().text;
        assert!(text.contains("uni:Agnes uni:gotAin uni:COMP6281 .\n"));
    }

    #[test]
    fn failing_grade_uses_got_f_in() {
        let catalog = CourseCatalog::new();
        let text = render(&catalog, &[], &[grade("Janet", "F", "COMP6231")]).unwrap().text;
        assert!(text.contains("uni:Janet uni:gotFin uni:COMP6231 .\n"));
    }

    #[test]
    fn unknown_grade_letter_is_rejected() {
        let catalog = CourseCatalog::new();
        let err = render(&catalog, &[], &[grade("Agnes", "E", "COMP6281")]).unwrap_err();
        assert!(matches!(err, CourseGraphError::Validation { .. }));
        assert!(err.to_string().contains("Agnes"));
    }

    #[test]
    fn literals_are_escaped() {
        let mut catalog = CourseCatalog::new();
        catalog.insert(
            Course::new("COMP", "6741", "Intelligent Systems")
                .with_description("Covers \"knowledge graphs\"."),
        );
        let text = render(&catalog, &[], &[]).unwrap().text;
        assert!(text.contains("uni:description  \"Covers \\\"knowledge graphs\\\".\""));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut course = cloud_course().with_description("x");
        course.topics.insert("cloud", "http://dbpedia.org/resource/Cloud_computing");
        let mut catalog = CourseCatalog::new();
        catalog.insert(course);

        let a = render(&catalog, &[], &[]).unwrap().text;
        let b = render(&catalog, &[], &[]).unwrap().text;
        assert_eq!(a, b);
    }

    #[test]
    fn write_document_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ttl");
        std::fs::write(&path, "stale").unwrap();

        let catalog = CourseCatalog::new();
        let inputs = GraphInputs {
            catalog: &catalog,
            students: &[],
            grades: &[],
            fragment: "",
        };
        write_document(&path, inputs, &GraphOptions::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("@prefix rdf:"));
        assert!(!content.contains("stale"));
    }
}
