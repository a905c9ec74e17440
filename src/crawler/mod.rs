//! Crawler module for catalog page fetching and processing
//!
//! This module contains the core scraping pipeline, including:
//! - Request identity and proxy rotation
//! - HTTP fetching with retry logic
//! - Concurrency and rate limiting of page tasks
//! - Record extraction and normalization
//! - Aggregation and overall coordination

mod aggregator;
mod coordinator;
mod extractor;
mod fetcher;
mod identity;
mod proxy;
mod scheduler;

pub use aggregator::Aggregator;
pub use coordinator::{normalize_origin, page_url, run_scrape, Pipeline, ScrapeReport};
pub use extractor::{
    normalize_availability, normalize_price, normalize_rating, parse_price, parse_rating,
    Extractor, Record,
};
pub use fetcher::{build_http_client, FetchedPage, RetryPolicy, RetryingFetcher};
pub use identity::{IdentityProvider, RequestIdentity};
pub use proxy::select_proxy;
pub use scheduler::{RateGate, ScheduleReport, Scheduler, TaskFailure};

