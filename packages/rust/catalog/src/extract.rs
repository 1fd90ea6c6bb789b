//! Course extraction from catalog markup.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use coursegraph_shared::{CourseCatalog, Result};

use crate::listing::ListingBlock;

/// Container tag and class of one course listing.
static LISTING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.large-text").expect("static selector is valid"));

/// Parse catalog markup into courses, in document order.
///
/// Blocks that are not course listings are skipped. A block that looks like a
/// course but whose label cannot be split fails the whole extraction.
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn extract_courses(html: &str) -> Result<CourseCatalog> {
    let doc = Html::parse_document(html);
    let mut catalog = CourseCatalog::new();
    let mut skipped = 0usize;

    for container in doc.select(&LISTING_SELECTOR) {
        let block = ListingBlock::from_element(container);
        if !block.is_course_listing() {
            skipped += 1;
            continue;
        }

        let course = block.to_course()?;
        debug!(
            key = %course.key(),
            has_description = !course.description.is_empty(),
            "extracted course"
        );
        catalog.insert(course);
    }

    info!(courses = catalog.len(), skipped, "parsed course information");
    Ok(catalog)
}
