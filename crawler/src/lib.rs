//! Crawl-side collaborators of the index: per-host politeness scheduling and
//! near-duplicate filtering of fetched pages.

pub mod dedup;
pub mod politeness;
