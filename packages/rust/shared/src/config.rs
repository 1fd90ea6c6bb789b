//! Application configuration for CourseGraph.
//!
//! User config lives at `~/.coursegraph/coursegraph.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursegraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursegraph";

// ---------------------------------------------------------------------------
// Config structs (matching coursegraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Course catalog page.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// DBpedia Spotlight settings.
    #[serde(default)]
    pub spotlight: SpotlightConfig,

    /// Input and output file locations.
    #[serde(default)]
    pub files: FilesConfig,

    /// Namespaces used when writing the graph.
    #[serde(default)]
    pub graph: GraphConfig,

    /// Parameters of the fixed report queries.
    #[serde(default)]
    pub queries: QueryConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Page listing the courses.
    #[serde(default = "default_catalog_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_catalog_url() -> String {
    concat!(
        "https://www.concordia.ca/academics/graduate/calendar/current/",
        "encs/computer-science-courses.html"
    )
    .into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[spotlight]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightConfig {
    /// Annotate endpoint.
    #[serde(default = "default_spotlight_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            endpoint: default_spotlight_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_spotlight_endpoint() -> String {
    "https://api.dbpedia-spotlight.org/en/annotate".into()
}

/// `[files]` section. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Topic cache written on the first run and replayed afterwards.
    #[serde(default = "default_topics_cache")]
    pub topics_cache: PathBuf,

    /// Students table (`first,last,mbox,id`).
    #[serde(default = "default_students")]
    pub students: PathBuf,

    /// Grades table (`student,grade,course`).
    #[serde(default = "default_grades")]
    pub grades: PathBuf,

    /// Turtle fragment copied verbatim into the output.
    #[serde(default = "default_ontology_fragment")]
    pub ontology_fragment: PathBuf,

    /// Output Turtle document.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            topics_cache: default_topics_cache(),
            students: default_students(),
            grades: default_grades(),
            ontology_fragment: default_ontology_fragment(),
            output: default_output(),
        }
    }
}

impl FilesConfig {
    /// Resolve every relative path against `base`.
    pub fn resolve(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            topics_cache: join(&self.topics_cache),
            students: join(&self.students),
            grades: join(&self.grades),
            ontology_fragment: join(&self.ontology_fragment),
            output: join(&self.output),
        }
    }
}

fn default_topics_cache() -> PathBuf {
    "topics.csv".into()
}
fn default_students() -> PathBuf {
    "data/students.csv".into()
}
fn default_grades() -> PathBuf {
    "data/grades.csv".into()
}
fn default_ontology_fragment() -> PathBuf {
    "data/students.ttl".into()
}
fn default_output() -> PathBuf {
    "knowledgegraph.ttl".into()
}

/// `[graph]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// IRI bound to the `uni:` prefix.
    #[serde(default = "default_base_iri")]
    pub base_iri: String,

    /// Namespace stripped from topic URIs to derive topic identifiers.
    #[serde(default = "default_topic_namespace")]
    pub topic_namespace: String,

    /// `dbr:` local name of the institution courses are taught at.
    #[serde(default = "default_institution")]
    pub institution: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_iri: default_base_iri(),
            topic_namespace: default_topic_namespace(),
            institution: default_institution(),
        }
    }
}

fn default_base_iri() -> String {
    "http://localhost:3030/assignment1/".into()
}
fn default_topic_namespace() -> String {
    "http://dbpedia.org/resource/".into()
}
fn default_institution() -> String {
    "Concordia_University".into()
}

/// `[queries]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Course whose topics are listed.
    #[serde(default = "default_query_course")]
    pub course: String,

    /// Given name of the student whose grades are listed.
    #[serde(default = "default_query_student_name")]
    pub student_name: String,

    /// Topic whose familiar students are listed.
    #[serde(default = "default_query_topic")]
    pub topic: String,

    /// Student ID whose known topics are listed.
    #[serde(default = "default_query_student_id")]
    pub student_id: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            course: default_query_course(),
            student_name: default_query_student_name(),
            topic: default_query_topic(),
            student_id: default_query_student_id(),
        }
    }
}

fn default_query_course() -> String {
    "COMP6281".into()
}
fn default_query_student_name() -> String {
    "Agnes".into()
}
fn default_query_topic() -> String {
    "Scalability".into()
}
fn default_query_student_id() -> String {
    "C2C2C2C2".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursegraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.coursegraph/coursegraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CourseGraphError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CourseGraphError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CourseGraphError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}
