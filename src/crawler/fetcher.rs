//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients, one direct and one per configured proxy
//! - Rolling a fresh request identity and proxy for every attempt
//! - Bounded retries with fixed or exponential backoff
//! - Error classification

use crate::config::{BackoffPolicy, Config, ProxyDescriptor, ScraperConfig};
use crate::crawler::identity::{IdentityProvider, RequestIdentity};
use crate::crawler::proxy::select_proxy;
use crate::{AttemptError, FetchError, ScrapeError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::{Client, Proxy};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Upper bound for a single exponential backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body markup
    pub body: String,
}

/// Attempt budget and delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// Builds the policy from scraper configuration
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_delay_ms),
            backoff: config.backoff,
        }
    }

    /// Delay to wait after the given (1-based) attempt failed
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffPolicy::Fixed => self.base_delay,
            BackoffPolicy::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay
                    .checked_mul(factor)
                    .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
            }
        }
    }
}

/// Where a single attempt is currently at
enum RetryState {
    /// About to issue the given (1-based) attempt
    Attempting { attempt: u32 },
    /// The given attempt failed; suspended before the next one
    Backoff { attempt: u32 },
}

/// A client that routes through one configured proxy
#[derive(Debug)]
struct ProxyRoute {
    label: String,
    client: Client,
}

/// Fetches one logical page with retries and identity rotation
///
/// The fetcher shares nothing mutable between concurrent calls except the
/// random generator, which is only locked while rolling an attempt's
/// identity and proxy.
pub struct RetryingFetcher {
    direct: Client,
    proxies: Vec<ProxyRoute>,
    use_proxy: bool,
    identities: IdentityProvider,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl RetryingFetcher {
    /// Creates a fetcher seeded from OS entropy
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a fetcher with a caller-supplied random source
    ///
    /// Proxy clients are built up front so a malformed proxy surfaces here,
    /// at startup, rather than on some later attempt.
    pub fn with_rng(config: &Config, rng: StdRng) -> Result<Self, ScrapeError> {
        let timeout = Duration::from_secs(config.scraper.request_timeout_secs);

        let direct = build_http_client(timeout, None)?;

        let proxies = config
            .proxy
            .servers
            .iter()
            .map(|descriptor| -> Result<ProxyRoute, ScrapeError> {
                Ok(ProxyRoute {
                    label: descriptor.url(),
                    client: build_http_client(timeout, Some(descriptor))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            direct,
            proxies,
            use_proxy: config.proxy.use_proxy,
            identities: IdentityProvider::with_user_agents(config.identity.user_agents.clone()),
            policy: RetryPolicy::from_config(&config.scraper),
            rng: Mutex::new(rng),
        })
    }

    /// Fetches a URL, retrying until success or until attempts run out
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body immediately |
    /// | HTTP non-2xx | Retry after backoff |
    /// | Timeout | Retry after backoff |
    /// | Connection / body error | Retry after backoff |
    /// | Last attempt failed | `FetchError::ExhaustedRetries` with the last cause |
    ///
    /// Identity and proxy are re-rolled on every attempt.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut state = RetryState::Attempting { attempt: 1 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => match self.attempt(url).await {
                    Ok(page) => {
                        tracing::debug!("Fetched {} on attempt {}", url, attempt);
                        return Ok(page);
                    }
                    Err(last) if attempt >= self.policy.max_attempts => {
                        return Err(FetchError::ExhaustedRetries {
                            url: url.to_string(),
                            attempts: attempt,
                            last,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}",
                            attempt,
                            self.policy.max_attempts,
                            url,
                            e
                        );
                        RetryState::Backoff { attempt }
                    }
                },
                RetryState::Backoff { attempt } => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::trace!("Backing off {:?} before retrying {}", delay, url);
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
            };
        }
    }

    /// Performs a single attempt with a freshly rolled identity and route
    async fn attempt(&self, url: &str) -> Result<FetchedPage, AttemptError> {
        let (identity, route) = self.roll();

        let client = match route {
            Some(route) => {
                tracing::trace!("Routing {} through proxy {}", url, route.label);
                &route.client
            }
            None => &self.direct,
        };

        let mut request = client.get(url);
        match identity.to_headers() {
            Ok(headers) => request = request.headers(headers),
            Err(e) => tracing::warn!("Sending {} without identity headers: {}", url, e),
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AttemptError::Timeout {
                    url: url.to_string(),
                }
            } else {
                AttemptError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// Rolls the identity and, when enabled, the proxy for one attempt
    fn roll(&self) -> (RequestIdentity, Option<&ProxyRoute>) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let identity = self.identities.next_identity(&mut *rng);
        let route = if self.use_proxy {
            select_proxy(&self.proxies, &mut *rng)
        } else {
            None
        };
        (identity, route)
    }
}

/// Classifies a send error into an attempt error
fn classify(url: &str, error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::Timeout {
            url: url.to_string(),
        }
    } else {
        AttemptError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Builds an HTTP client, optionally routed through a proxy
///
/// Credentials are attached only when the descriptor carries a username.
/// Identity headers are set per request, not on the client.
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::ProxyDescriptor;
/// use catalog_ripple::crawler::build_http_client;
/// use std::time::Duration;
///
/// let proxy = ProxyDescriptor {
///     host: "10.0.0.1".to_string(),
///     port: 8080,
///     username: None,
///     password: None,
/// };
///
/// let client = build_http_client(Duration::from_secs(30), Some(&proxy)).unwrap();
/// ```
pub fn build_http_client(
    timeout: Duration,
    proxy: Option<&ProxyDescriptor>,
) -> Result<Client, reqwest::Error> {
    let builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    let builder = match proxy {
        Some(descriptor) => {
            let mut proxy = Proxy::all(descriptor.url())?;
            if let Some((username, password)) = descriptor.credentials() {
                proxy = proxy.basic_auth(username, password);
            }
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder.build()
}
