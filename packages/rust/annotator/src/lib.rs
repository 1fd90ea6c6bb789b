//! Topic annotation for course descriptions.
//!
//! Topics come either from the cache file written by an earlier run or from
//! the DBpedia Spotlight service, one request per course with a description.

pub mod cache;
pub mod spotlight;

use std::path::Path;

use tracing::{info, instrument, warn};

use coursegraph_shared::{CourseCatalog, Result};

pub use cache::{CACHE_HEADER, CacheWriter, TopicCacheRow, load_cache};
pub use spotlight::{AnnotationOutcome, Annotator, SpotlightClient, parse_response};

/// Where the topics of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource {
    Cache,
    Service,
}

/// Counters describing one annotation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationStats {
    pub source: TopicSource,
    /// Requests sent to the annotation service.
    pub requests_sent: usize,
    /// Courses that gained at least one topic.
    pub courses_annotated: usize,
    /// Responses that could not be decoded (or failed in transit).
    pub failures: usize,
    /// Cache rows replayed onto courses.
    pub cache_rows_applied: usize,
}

impl AnnotationStats {
    fn new(source: TopicSource) -> Self {
        Self {
            source,
            requests_sent: 0,
            courses_annotated: 0,
            failures: 0,
            cache_rows_applied: 0,
        }
    }
}

/// Progress callback for annotation.
pub trait AnnotationProgress: Send + Sync {
    /// Called after each course request completes.
    fn course_annotated(&self, current: usize, total: usize, course_key: &str);
}

/// No-op annotation progress.
pub struct SilentAnnotationProgress;

impl AnnotationProgress for SilentAnnotationProgress {
    fn course_annotated(&self, _current: usize, _total: usize, _course_key: &str) {}
}

/// Add topics to every course in `catalog`.
///
/// If the cache at `cache_path` exists it is replayed and `annotator` is
/// never called. Otherwise each course with a description is sent to
/// `annotator` once, and every returned topic is written both to the course
/// and to a new cache file.
#[instrument(skip_all, fields(courses = catalog.len(), cache = %cache_path.display()))]
pub async fn annotate_catalog<A: Annotator>(
    mut catalog: CourseCatalog,
    cache_path: &Path,
    annotator: &A,
    progress: &dyn AnnotationProgress,
) -> Result<(CourseCatalog, AnnotationStats)> {
    if let Some(stats) = replay_cache(&mut catalog, cache_path)? {
        return Ok((catalog, stats));
    }

    info!("retrieving topics from annotation service");
    let mut stats = AnnotationStats::new(TopicSource::Service);
    let mut writer = CacheWriter::create(cache_path)?;
    let total = catalog.iter().filter(|c| !c.description.is_empty()).count();

    for course in catalog.iter_mut() {
        if course.description.is_empty() {
            continue;
        }

        let key = course.key();
        stats.requests_sent += 1;

        let outcome = match annotator.annotate(&course.description).await {
            Ok(outcome) => outcome,
            Err(e) => AnnotationOutcome::Malformed {
                status: 0,
                reason: e.to_string(),
            },
        };

        match outcome {
            AnnotationOutcome::Topics(links) => {
                for link in links {
                    writer.append(&TopicCacheRow {
                        course_id: key.clone(),
                        topic: link.term.clone(),
                        uri: link.uri.clone(),
                    })?;
                    course.topics.insert(link.term, link.uri);
                }
                stats.courses_annotated += 1;
            }
            AnnotationOutcome::NoTopics => {
                info!(course = %key, "no topics found");
            }
            AnnotationOutcome::Malformed { status, reason } => {
                warn!(course = %key, status, %reason, "invalid annotation response");
                stats.failures += 1;
            }
        }

        progress.course_annotated(stats.requests_sent, total, &key);
    }

    info!(
        requests_sent = stats.requests_sent,
        annotated = stats.courses_annotated,
        failures = stats.failures,
        cache_rows = writer.rows(),
        "topic and URI requests sent"
    );

    Ok((catalog, stats))
}

/// Add cached topics to `catalog` without contacting the service.
///
/// Returns `None` when no cache file exists; the catalog is left untouched.
#[instrument(skip_all, fields(cache = %cache_path.display()))]
pub fn replay_cache(
    catalog: &mut CourseCatalog,
    cache_path: &Path,
) -> Result<Option<AnnotationStats>> {
    let Some(rows) = load_cache(cache_path)? else {
        return Ok(None);
    };
    info!(rows = rows.len(), "parsing course topics from cache file");
    Ok(Some(apply_cache(catalog, rows)))
}

/// Replay cache rows onto the matching courses.
fn apply_cache(catalog: &mut CourseCatalog, rows: Vec<TopicCacheRow>) -> AnnotationStats {
    let mut stats = AnnotationStats::new(TopicSource::Cache);

    for row in rows {
        match catalog.get_mut(&row.course_id) {
            Some(course) => {
                course.topics.insert(row.topic, row.uri);
                stats.cache_rows_applied += 1;
            }
            None => warn!(course = %row.course_id, "cached topic for unknown course, skipping"),
        }
    }

    stats.courses_annotated = catalog.iter().filter(|c| !c.topics.is_empty()).count();
    stats
}
