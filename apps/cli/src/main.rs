//! CourseGraph CLI: course catalog to RDF knowledge graph.
//!
//! Scrapes a course catalog, annotates course descriptions with DBpedia
//! topics, writes a Turtle knowledge graph together with student and grade
//! data, and runs report queries over it.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
