//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursegraph_core::pipeline::{BuildConfig, BuildResult, CatalogSource, ProgressReporter};
use coursegraph_core::{build_graph, list_courses, run_queries};
use coursegraph_shared::{
    AppConfig, CourseCatalog, init_config, init_config_at, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CourseGraph: turn a course catalog into a queryable knowledge graph.
#[derive(Parser)]
#[command(
    name = "coursegraph",
    version,
    about = "Scrape a course catalog, link its topics to DBpedia and build an RDF knowledge graph.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.coursegraph/coursegraph.toml).
    #[arg(long, global = true, env = "COURSEGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape, annotate and write the knowledge graph.
    Build {
        /// Read catalog markup from this file instead of downloading it.
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },

    /// Run the report queries against a written knowledge graph.
    Query {
        /// Graph document (defaults to the configured output file).
        #[arg(long)]
        graph: Option<PathBuf>,
    },

    /// Build the knowledge graph, then run the report queries.
    Run {
        /// Read catalog markup from this file instead of downloading it.
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },

    /// Print the courses extracted from the catalog.
    Courses {
        /// Read catalog markup from this file instead of downloading it.
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursegraph=info",
        1 => "coursegraph=debug",
        _ => "coursegraph=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Build { catalog_file } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_build(&config, catalog_file).await.map(|_| ())
        }
        Command::Query { graph } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_query(&config, graph)
        }
        Command::Run { catalog_file } => {
            let config = resolve_config(config_path.as_deref())?;
            let result = cmd_build(&config, catalog_file).await?;
            cmd_query(&config, Some(result.output_path))
        }
        Command::Courses { catalog_file } => {
            let config = resolve_config(config_path.as_deref())?;
            cmd_courses(&config, catalog_file).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(config: &AppConfig, catalog_file: Option<PathBuf>) -> Result<BuildResult> {
    let build_config = BuildConfig::from_app(config, catalog_file, &working_dir()?)?;

    info!(
        output = %build_config.files.output.display(),
        cache = %build_config.files.topics_cache.display(),
        "building knowledge graph"
    );

    let reporter = CliProgress::new();
    let result = build_graph(&build_config, &reporter).await?;

    println!();
    println!("  Knowledge graph written!");
    println!("  Courses:  {}", result.course_count);
    println!("  Topics:   {}", result.topic_count);
    println!("  Students: {}", result.student_count);
    println!("  Grades:   {}", result.grade_count);
    if result.stats.requests_sent > 0 {
        println!(
            "  Topic and URI requests sent for {} courses ({} failed)",
            result.stats.requests_sent, result.stats.failures
        );
    } else {
        println!(
            "  Topics replayed from cache ({} rows)",
            result.stats.cache_rows_applied
        );
    }
    println!("  Path:     {}", result.output_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(result)
}

fn cmd_query(config: &AppConfig, graph: Option<PathBuf>) -> Result<()> {
    let path = match graph {
        Some(p) => p,
        None => config.files.resolve(&working_dir()?).output,
    };

    info!(path = %path.display(), "running report queries");
    let reports = run_queries(&path, &config.graph.base_iri, &config.queries)?;

    for report in reports {
        println!("\nQuery {}: \n{}\n", report.number, report.title);
        for line in &report.lines {
            println!("{line}");
        }
    }
    Ok(())
}

async fn cmd_courses(config: &AppConfig, catalog_file: Option<PathBuf>) -> Result<()> {
    let source = CatalogSource::from_config(config, catalog_file)?;
    let files = config.files.resolve(&working_dir()?);
    let catalog = list_courses(&source, &files.topics_cache).await?;

    print!("{}", format_course_list(&catalog));
    Ok(())
}

fn format_course_list(catalog: &CourseCatalog) -> String {
    let mut out = format!("COURSE LIST ({} courses)\n", catalog.len());
    for course in catalog {
        out.push('\n');
        out.push_str(&course.key());
        out.push('\n');
        if !course.description.is_empty() {
            out.push_str(&format!("  {}\n", course.description));
        }
        for (term, uri) in course.topics.iter() {
            out.push_str(&format!("  - {term}: {uri}\n"));
        }
    }
    out
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => {
            init_config_at(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn course_annotated(&self, current: usize, total: usize, course_key: &str) {
        self.spinner
            .set_message(format!("Annotating [{current}/{total}] {course_key}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
