//! End-to-end pipeline: catalog → courses → topics → Turtle document → reports.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument};
use url::Url;

use coursegraph_annotator::{AnnotationProgress, AnnotationStats, Annotator, SpotlightClient};
use coursegraph_catalog::FetchOptions;
use coursegraph_graph::{GraphInputs, GraphOptions, GraphQueryRunner, QueryReport};
use coursegraph_shared::{
    AppConfig, CourseCatalog, CourseGraphError, FilesConfig, QueryConfig, Result, SpotlightConfig,
};

/// Where the catalog markup comes from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// Download the page.
    Url { url: Url, fetch: FetchOptions },
    /// Read previously saved markup.
    File(PathBuf),
}

impl CatalogSource {
    /// The configured URL, or `file` when given.
    pub fn from_config(config: &AppConfig, file: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = file {
            return Ok(Self::File(path));
        }
        let url = Url::parse(&config.catalog.url).map_err(|e| {
            CourseGraphError::config(format!("invalid catalog url '{}': {e}", config.catalog.url))
        })?;
        Ok(Self::Url {
            url,
            fetch: FetchOptions::from(&config.catalog),
        })
    }
}

/// Configuration for [`build_graph`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub catalog: CatalogSource,
    pub spotlight: SpotlightConfig,
    /// Input and output paths, already resolved.
    pub files: FilesConfig,
    pub graph: GraphOptions,
}

impl BuildConfig {
    /// Assemble from the app config; relative paths resolve against `base`.
    pub fn from_app(
        config: &AppConfig,
        catalog_file: Option<PathBuf>,
        base: &Path,
    ) -> Result<Self> {
        Ok(Self {
            catalog: CatalogSource::from_config(config, catalog_file)?,
            spotlight: config.spotlight.clone(),
            files: config.files.resolve(base),
            graph: GraphOptions::from(&config.graph),
        })
    }
}

/// Result of [`build_graph`].
#[derive(Debug)]
pub struct BuildResult {
    /// The annotated courses.
    pub catalog: CourseCatalog,
    pub stats: AnnotationStats,
    pub course_count: usize,
    /// Distinct topic nodes written.
    pub topic_count: usize,
    pub student_count: usize,
    pub grade_count: usize,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each annotation request.
    fn course_annotated(&self, current: usize, total: usize, course_key: &str);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn course_annotated(&self, _current: usize, _total: usize, _course_key: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Adapts a `ProgressReporter` to the annotator's progress interface.
struct PipelineAnnotationProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl AnnotationProgress for PipelineAnnotationProgress<'_> {
    fn course_annotated(&self, current: usize, total: usize, course_key: &str) {
        self.inner.course_annotated(current, total, course_key);
    }
}

/// Load the catalog markup and extract its courses.
#[instrument(skip_all)]
pub async fn extract_catalog(source: &CatalogSource) -> Result<CourseCatalog> {
    let html = match source {
        CatalogSource::Url { url, fetch } => coursegraph_catalog::fetch_catalog(url, fetch).await?,
        CatalogSource::File(path) => {
            info!(path = %path.display(), "reading catalog markup from file");
            std::fs::read_to_string(path).map_err(|e| CourseGraphError::io(path, e))?
        }
    };
    coursegraph_catalog::extract_courses(&html)
}

/// Extract the catalog and attach any topics already in the cache.
///
/// Never contacts the annotation service.
#[instrument(skip_all, fields(cache = %cache_path.display()))]
pub async fn list_courses(source: &CatalogSource, cache_path: &Path) -> Result<CourseCatalog> {
    let mut catalog = extract_catalog(source).await?;
    if coursegraph_annotator::replay_cache(&mut catalog, cache_path)?.is_none() {
        info!("no topic cache yet, listing courses without topics");
    }
    Ok(catalog)
}

/// Run the build with the Spotlight service as annotator.
pub async fn build_graph(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let annotator = SpotlightClient::new(&config.spotlight)?;
    build_graph_with(config, &annotator, progress).await
}

/// Run the build.
///
/// 1. Extract courses from the catalog
/// 2. Annotate descriptions (cache or service)
/// 3. Read students, grades and the ontology fragment
/// 4. Write the Turtle document
#[instrument(skip_all, fields(output = %config.files.output.display()))]
pub async fn build_graph_with<A: Annotator>(
    config: &BuildConfig,
    annotator: &A,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    info!("starting build pipeline");

    // --- Phase 1: Extract ---
    progress.phase("Extracting courses");
    let catalog = extract_catalog(&config.catalog).await?;

    // --- Phase 2: Annotate ---
    progress.phase("Annotating course descriptions");
    let annotation_progress = PipelineAnnotationProgress { inner: progress };
    let (catalog, stats) = coursegraph_annotator::annotate_catalog(
        catalog,
        &config.files.topics_cache,
        annotator,
        &annotation_progress,
    )
    .await?;

    // --- Phase 3: External inputs ---
    progress.phase("Reading students and grades");
    let students = coursegraph_graph::read_students(&config.files.students)?;
    let grades = coursegraph_graph::read_grades(&config.files.grades)?;
    let fragment = coursegraph_graph::read_fragment(&config.files.ontology_fragment)?;

    // --- Phase 4: Serialize ---
    progress.phase("Writing knowledge graph");
    let rendered = coursegraph_graph::write_document(
        &config.files.output,
        GraphInputs {
            catalog: &catalog,
            students: &students,
            grades: &grades,
            fragment: &fragment,
        },
        &config.graph,
    )?;

    let result = BuildResult {
        course_count: rendered.courses,
        topic_count: rendered.topics,
        student_count: rendered.students,
        grade_count: rendered.grades,
        catalog,
        stats,
        output_path: config.files.output.clone(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        courses = result.course_count,
        topics = result.topic_count,
        elapsed_ms = result.elapsed.as_millis(),
        "build pipeline complete"
    );

    Ok(result)
}

/// Load the document at `path` and run the six reports.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn run_queries(path: &Path, base_iri: &str, params: &QueryConfig) -> Result<Vec<QueryReport>> {
    let runner = GraphQueryRunner::load(path, base_iri)?;
    runner.run_reports(params)
}
