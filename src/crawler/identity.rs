//! Request identity rotation
//!
//! Every fetch attempt goes out with a freshly rolled set of browser-like
//! headers so that a blocked fingerprint does not recur deterministically.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT,
};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.2; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-US,en;q=0.8,fr;q=0.6",
    "en-US,en;q=0.9,de;q=0.7",
];

const ACCEPTS: &[&str] = &[
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
];

const CONNECTIONS: &[&str] = &["keep-alive"];

/// Header set presented by one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: String,
    pub accept_language: String,
    pub accept: String,
    pub connection: String,
}

impl RequestIdentity {
    /// Converts the identity into request headers
    pub fn to_headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&self.accept_language)?);
        headers.insert(ACCEPT, HeaderValue::from_str(&self.accept)?);
        headers.insert(CONNECTION, HeaderValue::from_str(&self.connection)?);
        Ok(headers)
    }
}

/// Produces randomized request identities
///
/// The provider is immutable after construction; randomness comes from the
/// generator passed to each call, so concurrent callers share no state.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    user_agents: Vec<String>,
}

impl IdentityProvider {
    /// Creates a provider using the built-in user-agent pool
    pub fn new() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }

    /// Creates a provider with a custom user-agent pool
    ///
    /// An empty pool falls back to the built-in one.
    pub fn with_user_agents(user_agents: Vec<String>) -> Self {
        if user_agents.is_empty() {
            return Self::new();
        }
        Self { user_agents }
    }

    /// Rolls a fresh identity
    pub fn next_identity<R: Rng + ?Sized>(&self, rng: &mut R) -> RequestIdentity {
        let user_agent = self
            .user_agents
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| USER_AGENTS[0].to_string());

        RequestIdentity {
            user_agent,
            accept_language: pick(ACCEPT_LANGUAGES, rng),
            accept: pick(ACCEPTS, rng),
            connection: pick(CONNECTIONS, rng),
        }
    }

    /// Number of user agents in the pool
    pub fn pool_size(&self) -> usize {
        self.user_agents.len()
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).copied().unwrap_or(pool[0]).to_string()
}
