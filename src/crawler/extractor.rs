//! Catalog page extraction and field normalization
//!
//! This module turns one listing page's markup into typed records:
//! - Locating each product element
//! - Pulling raw title, price, availability and rating text
//! - Normalizing those into numbers with explicit fallbacks
//! - Resolving product links to absolute URLs

use crate::{FieldError, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Currency marker as it appears on the page
const CURRENCY: &str = "£";

/// The currency marker's UTF-8 bytes decoded as Latin-1
const MISENCODED_CURRENCY: &str = "Â£";

/// Class token that precedes the rating word
const RATING_CLASS: &str = "star-rating";

const PRODUCT_SELECTOR: &str = ".product_pod";
const TITLE_LINK_SELECTOR: &str = "h3 a";
const PRICE_SELECTOR: &str = ".price_color";
const AVAILABILITY_SELECTOR: &str = ".availability";
const RATING_SELECTOR: &str = ".star-rating";

/// One normalized catalog item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Product title, `None` when the element carries none
    pub title: Option<String>,

    /// Price with the currency marker stripped, `None` when unparseable
    pub price: Option<f64>,

    /// Star rating 1..=5, `None` when the rating word is unknown
    pub rating: Option<u8>,

    /// Units in stock; 0 when the text carries no number
    pub availability: u32,

    /// Absolute product page URL
    #[serde(rename = "productUrl")]
    pub product_url: String,
}

/// Extracts records from listing pages
///
/// Selectors are compiled once; `extract` is synchronous and keeps the
/// parsed document local to the call.
#[derive(Debug)]
pub struct Extractor {
    /// Base for resolving relative product links
    product_base: Url,
    product: Selector,
    title_link: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
}

impl Extractor {
    /// Creates an extractor resolving product links against the origin
    pub fn new(origin: &Url) -> Result<Self, ScrapeError> {
        Self::with_base(origin.clone())
    }

    /// Creates an extractor resolving product links against `product_base`
    pub fn with_base(product_base: Url) -> Result<Self, ScrapeError> {
        Ok(Self {
            product_base,
            product: compile(PRODUCT_SELECTOR)?,
            title_link: compile(TITLE_LINK_SELECTOR)?,
            price: compile(PRICE_SELECTOR)?,
            availability: compile(AVAILABILITY_SELECTOR)?,
            rating: compile(RATING_SELECTOR)?,
        })
    }

    /// Extracts every recognizable product from the page
    ///
    /// A malformed product element is skipped with a warning; the rest of
    /// the page is still extracted.
    pub fn extract(&self, markup: &str) -> Vec<Record> {
        let document = Html::parse_document(markup);
        let mut records = Vec::new();

        for (position, element) in document.select(&self.product).enumerate() {
            match self.extract_element(element) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping product #{}: {}", position + 1, e);
                }
            }
        }

        tracing::trace!("Extracted {} records", records.len());
        records
    }

    /// Extracts one product element
    ///
    /// Only the product link is required; every other field degrades.
    fn extract_element(&self, element: ElementRef<'_>) -> Result<Record, FieldError> {
        let link = element
            .select(&self.title_link)
            .next()
            .ok_or(FieldError::MissingElement(TITLE_LINK_SELECTOR))?;

        let href = link
            .value()
            .attr("href")
            .ok_or(FieldError::MissingElement("h3 a[href]"))?;

        let product_url = self
            .product_base
            .join(href.trim())
            .map_err(|_| FieldError::InvalidLink(href.to_string()))?
            .to_string();

        let title = link
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let price = element
            .select(&self.price)
            .next()
            .and_then(|e| normalize_price(&element_text(e)));

        let availability = element
            .select(&self.availability)
            .next()
            .map(|e| normalize_availability(&element_text(e)))
            .unwrap_or(0);

        let rating = element
            .select(&self.rating)
            .next()
            .and_then(|e| e.value().attr("class"))
            .and_then(|class| normalize_rating(&rating_word(class)));

        Ok(Record {
            title,
            price,
            rating,
            availability,
            product_url,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Removes the `star-rating` token from a class attribute
fn rating_word(class: &str) -> String {
    class
        .split_whitespace()
        .filter(|token| *token != RATING_CLASS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses display price text into a number
///
/// Both the literal currency marker and its mis-encoded form are stripped.
pub fn parse_price(raw: &str) -> Result<f64, FieldError> {
    let stripped = raw
        .replace(MISENCODED_CURRENCY, "")
        .replace(CURRENCY, "");

    stripped
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FieldError::InvalidPrice(raw.to_string()))
}

/// Normalizes price text, logging and yielding `None` when unparseable
pub fn normalize_price(raw: &str) -> Option<f64> {
    match parse_price(raw) {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::warn!("{}; storing null price", e);
            None
        }
    }
}

/// Maps a rating word to its star count
pub fn parse_rating(word: &str) -> Result<u8, FieldError> {
    match word.trim() {
        "One" => Ok(1),
        "Two" => Ok(2),
        "Three" => Ok(3),
        "Four" => Ok(4),
        "Five" => Ok(5),
        other => Err(FieldError::UnknownRating(other.to_string())),
    }
}

/// Normalizes a rating word, logging and yielding `None` when unknown
pub fn normalize_rating(word: &str) -> Option<u8> {
    match parse_rating(word) {
        Ok(rating) => Some(rating),
        Err(e) => {
            tracing::warn!("{}; storing null rating", e);
            None
        }
    }
}

/// Extracts the first run of digits as a stock count
///
/// Text with no digits means unknown stock and yields 0. A run too large
/// for `u32` saturates.
pub fn normalize_availability(raw: &str) -> u32 {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return 0;
    }

    digits.parse::<u32>().unwrap_or(u32::MAX)
}
