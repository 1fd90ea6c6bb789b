//! Topic cache file (`course_id,topic,uri`).
//!
//! Written row-by-row while annotating; replayed wholesale on later runs so
//! the annotation service is not called again.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use coursegraph_shared::{CourseGraphError, Result};

/// Header row of the cache file.
pub const CACHE_HEADER: [&str; 3] = ["course_id", "topic", "uri"];

/// One cached annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCacheRow {
    pub course_id: String,
    pub topic: String,
    pub uri: String,
}

/// Read the cache. Returns `None` when the file does not exist.
pub fn load_cache(path: &Path) -> Result<Option<Vec<TopicCacheRow>>> {
    if !path.exists() {
        debug!(?path, "topic cache not found");
        return Ok(None);
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| CourseGraphError::csv(path, e))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<TopicCacheRow>, _>>()
        .map_err(|e| CourseGraphError::csv(path, e))?;

    debug!(?path, rows = rows.len(), "loaded topic cache");
    Ok(Some(rows))
}

/// Appends rows to a fresh cache file, flushing after each row.
pub struct CacheWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl CacheWriter {
    /// Create (or truncate) the cache file and write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| CourseGraphError::io(path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer
            .write_record(CACHE_HEADER)
            .map_err(|e| CourseGraphError::csv(path, e))?;
        writer.flush().map_err(|e| CourseGraphError::io(path, e))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn append(&mut self, row: &TopicCacheRow) -> Result<()> {
        self.writer
            .serialize(row)
            .map_err(|e| CourseGraphError::csv(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| CourseGraphError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }
}
