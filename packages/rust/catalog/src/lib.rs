//! Course catalog download and course extraction.
//!
//! This crate provides:
//! - [`fetch`]: downloads the catalog page
//! - [`listing`]: structural view of a single course listing block
//! - [`extract`]: turns catalog markup into a [`CourseCatalog`](coursegraph_shared::CourseCatalog)

pub mod extract;
pub mod fetch;
pub mod listing;

pub use extract::extract_courses;
pub use fetch::{FetchOptions, fetch_catalog};
pub use listing::{ListingBlock, ListingNode, MAX_LISTING_NODES, Slot, split_label};
