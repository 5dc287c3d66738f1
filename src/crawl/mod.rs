//! Website crawling: fetching pages, walking the frontier and harvesting addresses.

pub mod extractor;
pub mod fetcher;
pub mod frontier;
mod throttle;

pub use extractor::{extract_emails, extract_links, PageLink};
pub use fetcher::{FetchOutcome, HttpFetcher, PageFetcher};
pub use frontier::{CrawlPlan, CrawlReport, CrawlState, CrawlTarget, Crawler};
