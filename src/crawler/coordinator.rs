//! Scrape coordinator - wires the pipeline together
//!
//! This module contains the run that coordinates all stages:
//! - Generating the fixed list of page URLs
//! - Dispatching one scheduled task per page
//! - Fetching, extracting and aggregating inside each task
//! - Handing the finished collection to sinks

use crate::config::{validate, Config};
use crate::crawler::aggregator::Aggregator;
use crate::crawler::extractor::{Extractor, Record};
use crate::crawler::fetcher::RetryingFetcher;
use crate::crawler::scheduler::Scheduler;
use crate::output::{RunSummary, Sink};
use crate::ScrapeError;
use chrono::Utc;
use rand::rngs::StdRng;
use std::sync::Arc;
use url::Url;

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Every record extracted, in no particular order
    pub records: Vec<Record>,

    /// Page and record counts for the run
    pub summary: RunSummary,
}

/// The fetch-and-extract pipeline
///
/// Built once from a validated `Config`; holds no process-wide state.
pub struct Pipeline {
    config: Arc<Config>,
    origin: Url,
    fetcher: Arc<RetryingFetcher>,
    extractor: Arc<Extractor>,
    scheduler: Scheduler,
}

impl Pipeline {
    /// Creates a pipeline seeded from OS entropy
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(ScrapeError)` - The configuration is invalid or a client could not be built
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        validate(&config)?;
        let fetcher = RetryingFetcher::new(&config)?;
        Self::assemble(config, fetcher)
    }

    /// Creates a pipeline whose identity and proxy rotation use `rng`
    pub fn with_rng(config: Config, rng: StdRng) -> Result<Self, ScrapeError> {
        validate(&config)?;
        let fetcher = RetryingFetcher::with_rng(&config, rng)?;
        Self::assemble(config, fetcher)
    }

    fn assemble(config: Config, fetcher: RetryingFetcher) -> Result<Self, ScrapeError> {
        let origin = normalize_origin(&config.scraper.origin)?;
        let extractor = Extractor::new(&origin)?;
        let scheduler = Scheduler::new(&config.scheduler);

        Ok(Self {
            config: Arc::new(config),
            origin,
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            scheduler,
        })
    }

    /// Returns the configuration this pipeline runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lists the page URLs a run would fetch, by page index
    pub fn page_urls(&self) -> Result<Vec<(u32, Url)>, ScrapeError> {
        (1..=self.config.scraper.total_pages)
            .map(|index| -> Result<(u32, Url), ScrapeError> {
                Ok((index, page_url(&self.origin, index)?))
            })
            .collect()
    }

    /// Runs every page task and returns the aggregate
    ///
    /// Page failures are contained: a page that exhausts its attempts
    /// contributes no records and is listed in the summary.
    pub async fn run(&self) -> Result<ScrapeReport, ScrapeError> {
        let started_at = Utc::now();
        let total_pages = self.config.scraper.total_pages;
        let aggregator = Aggregator::new();

        tracing::info!(
            "Scraping {} pages from {} (concurrency {}, {} per {}ms)",
            total_pages,
            self.origin,
            self.config.scheduler.max_concurrent_tasks,
            self.config.scheduler.requests_per_window,
            self.config.scheduler.window_ms
        );

        let fetcher = self.fetcher.clone();
        let extractor = self.extractor.clone();
        let origin = self.origin.clone();
        let collection = aggregator.clone();

        let report = self
            .scheduler
            .schedule(1..=total_pages, move |index| {
                let fetcher = fetcher.clone();
                let extractor = extractor.clone();
                let collection = collection.clone();
                let url = page_url(&origin, index);

                async move {
                    let url = url?;
                    tracing::info!("Scraping page {}...", index);

                    let page = fetcher.fetch(url.as_str()).await?;
                    let records = extractor.extract(&page.body);

                    tracing::debug!("Page {} yielded {} records", index, records.len());
                    collection.add(records);
                    Ok::<(), ScrapeError>(())
                }
            })
            .await;

        let records = aggregator.into_records();
        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            pages_total: total_pages,
            pages_succeeded: report.succeeded.len() as u32,
            failed_pages: report.failed_indices(),
            records: records.len(),
        };

        if !summary.failed_pages.is_empty() {
            tracing::warn!(
                "{} of {} pages contributed no records: {:?}",
                summary.failed_pages.len(),
                total_pages,
                summary.failed_pages
            );
        }

        Ok(ScrapeReport { records, summary })
    }

    /// Runs the pipeline and hands the result to every sink
    ///
    /// Sinks run in order after the last page task resolves; the first sink
    /// error aborts the remaining sinks.
    pub async fn run_with_sinks(&self, sinks: &[&dyn Sink]) -> Result<ScrapeReport, ScrapeError> {
        let report = self.run().await?;

        for sink in sinks {
            if let Err(e) = sink.write(&report.records) {
                tracing::error!("Failed to write {} output: {}", sink.name(), e);
                return Err(e);
            }
            tracing::info!("Wrote {} records to {}", report.records.len(), sink.name());
        }

        Ok(report)
    }
}

/// Builds the listing URL for a page index
///
/// # Example
///
/// ```
/// use catalog_ripple::crawler::page_url;
/// use url::Url;
///
/// let origin = Url::parse("https://books.toscrape.com/").unwrap();
/// let url = page_url(&origin, 2).unwrap();
/// assert_eq!(url.as_str(), "https://books.toscrape.com/catalogue/page-2.html");
/// ```
pub fn page_url(origin: &Url, index: u32) -> Result<Url, url::ParseError> {
    origin.join(&format!("catalogue/page-{}.html", index))
}

/// Parses the origin so that relative joins stay beneath its path
pub fn normalize_origin(origin: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(origin)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builds a pipeline from `config`, runs it and hands the result to every sink
pub async fn run_scrape(config: Config, sinks: &[&dyn Sink]) -> Result<ScrapeReport, ScrapeError> {
    Pipeline::new(config)?.run_with_sinks(sinks).await
}
