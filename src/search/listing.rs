use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, trace};

use super::strategies::{first_match, RegexStrategy, IMAGE_STRATEGIES, PRICE_STRATEGIES, TITLE_STRATEGIES};
use crate::models::Candidate;

static LISTING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"data-asin="([^"]*)""#).unwrap());
static PRODUCT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{10}$").unwrap());

/// Markup that marks a paid placement
const SPONSORED_MARKERS: &[&str] = &[
    "AdHolder",
    "s-sponsored-label",
    "sp-sponsored-result",
    "puis-sponsored-label",
    "sp_atf",
    "sp_mtf",
    "/sspa/click",
    ">Sponsored<",
];

pub const DEFAULT_WINDOW_BYTES: usize = 8 * 1024;
pub const MIN_TITLE_CHARS: usize = 5;

/// Pulls organic listings out of a search results page
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    pub title: Vec<RegexStrategy>,
    pub price: Vec<RegexStrategy>,
    pub image: Vec<RegexStrategy>,
    pub window_bytes: usize,
    pub min_title_chars: usize,
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self {
            title: TITLE_STRATEGIES.clone(),
            price: PRICE_STRATEGIES.clone(),
            image: IMAGE_STRATEGIES.clone(),
            window_bytes: DEFAULT_WINDOW_BYTES,
            min_title_chars: MIN_TITLE_CHARS,
        }
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Whether a product id is a placeholder rather than a real listing.
fn is_placeholder_id(id: &str) -> bool {
    !PRODUCT_ID.is_match(id) || id.chars().all(|c| c == '0')
}

fn is_sponsored(window: &str) -> bool {
    SPONSORED_MARKERS.iter().any(|marker| window.contains(marker))
}

impl ListingExtractor {
    /// Extracts candidates in page order. Listings that are sponsored, carry
    /// a placeholder id, repeat an earlier id, or have no usable title are
    /// dropped.
    pub fn extract(&self, html: &str) -> Vec<Candidate> {
        let markers: Vec<(usize, String)> = LISTING_MARKER
            .captures_iter(html)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                // Widen to the start of the enclosing tag so classes written
                // before the marker are part of the window.
                let tag_start = html[..whole.start()].rfind('<').unwrap_or(whole.start());
                Some((tag_start, caps[1].to_string()))
            })
            .collect();
        debug!("Found {} listing markers", markers.len());

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (i, (start, product_id)) in markers.iter().enumerate() {
            if is_placeholder_id(product_id) {
                trace!("Skipping placeholder id {:?}", product_id);
                continue;
            }

            let next = markers.get(i + 1).map(|(s, _)| *s).unwrap_or(html.len());
            let end = floor_char_boundary(html, next.min(start + self.window_bytes));
            let window = &html[*start..end.max(*start)];

            if is_sponsored(window) {
                trace!("Skipping sponsored listing {}", product_id);
                continue;
            }
            if seen.contains(product_id) {
                continue;
            }

            let min_chars = self.min_title_chars;
            let Some((strategy, title)) = first_match(&self.title, window, |t| t.chars().count() >= min_chars) else {
                debug!("No usable title for {}; discarding", product_id);
                continue;
            };
            trace!("Title for {} via {}", product_id, strategy);

            let price = first_match(&self.price, window, |_| true).map(|(_, p)| p);
            let image_url = first_match(&self.image, window, |src| src.starts_with("http")).map(|(_, src)| src);

            seen.insert(product_id.clone());
            candidates.push(Candidate {
                title,
                product_id: product_id.clone(),
                price,
                image_url,
                confidence_score: 0,
            });
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(asin: &str, extra_class: &str, inner: &str) -> String {
        format!(
            r#"<div data-asin="{asin}" data-component-type="s-search-result" class="s-result-item {extra_class}">{inner}</div>"#
        )
    }

    fn organic(asin: &str, title: &str) -> String {
        listing(
            asin,
            "",
            &format!(
                r#"<img class="s-image" src="https://m.media-amazon.com/images/I/{asin}.jpg" alt="{title}"><h2 aria-label="{title}"><a><span>{title}</span></a></h2><span class="a-price"><span class="a-offscreen">$19.99</span></span>"#
            ),
        )
    }

    #[test]
    fn test_extracts_organic_listings_in_order() {
        let html = format!(
            "<html>{}{}</html>",
            organic("B004YAVF8I", "Logitech M185 Wireless Mouse"),
            organic("B07FKMDJQZ", "Logitech Pebble Wireless Mouse")
        );
        let candidates = ListingExtractor::default().extract(&html);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].product_id, "B004YAVF8I");
        assert_eq!(candidates[0].title, "Logitech M185 Wireless Mouse");
        assert_eq!(candidates[0].price.as_deref(), Some("$19.99"));
        assert_eq!(
            candidates[0].image_url.as_deref(),
            Some("https://m.media-amazon.com/images/I/B004YAVF8I.jpg")
        );
        assert_eq!(candidates[1].product_id, "B07FKMDJQZ");
    }

    #[test]
    fn test_skips_sponsored_and_placeholder_ids() {
        let html = format!(
            "{}{}{}{}",
            listing("", "", "<h2 aria-label=\"Header widget title\"></h2>"),
            listing("0000000000", "", "<h2 aria-label=\"Zeroed placeholder\"></h2>"),
            listing("B0SPONSOR1", "AdHolder", "<h2 aria-label=\"Sponsored Mouse Deluxe\"></h2>"),
            organic("B004YAVF8I", "Logitech M185 Wireless Mouse"),
        );
        let candidates = ListingExtractor::default().extract(&html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product_id, "B004YAVF8I");
    }

    #[test]
    fn test_discards_untitled_and_duplicate_listings() {
        let html = format!(
            "{}{}{}",
            listing("B000UNTTLD", "", "<h2 aria-label=\"Tiny\"></h2>"),
            organic("B004YAVF8I", "Logitech M185 Wireless Mouse"),
            organic("B004YAVF8I", "Logitech M185 Wireless Mouse"),
        );
        let candidates = ListingExtractor::default().extract(&html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product_id, "B004YAVF8I");
    }

    #[test]
    fn test_window_does_not_bleed_into_next_listing() {
        let html = format!(
            "{}{}",
            listing("B000NOPRCE", "", "<h2 aria-label=\"Mouse without a price\"></h2>"),
            organic("B004YAVF8I", "Logitech M185 Wireless Mouse"),
        );
        let candidates = ListingExtractor::default().extract(&html);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].price, None);
        assert_eq!(candidates[1].price.as_deref(), Some("$19.99"));
    }
}
