//! Proxy selection
//!
//! Picks one upstream proxy per attempt, uniformly at random. An empty list
//! means requests go out directly.

use rand::seq::SliceRandom;
use rand::Rng;

/// Selects one entry uniformly at random, or `None` when there are none
///
/// Generic over the entry type so the fetcher can select among prebuilt
/// per-proxy clients with the same policy it uses for bare descriptors.
pub fn select_proxy<'a, T, R: Rng + ?Sized>(proxies: &'a [T], rng: &mut R) -> Option<&'a T> {
    proxies.choose(rng)
}
