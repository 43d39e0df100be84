use serde::{Deserialize, Serialize};
use url::Url;

/// Text signatures that decide stock and page state.
///
/// These track one marketplace's current markup and drift with it, so they
/// are versioned configuration rather than constants. All matching is
/// case-insensitive substring matching against the page body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSignals {
    pub version: String,
    pub in_stock: Vec<String>,
    pub out_of_stock: Vec<String>,
    pub third_party_only: Vec<String>,
    pub not_found: Vec<String>,
    pub bot_check: Vec<String>,
    /// Path prefixes of search-results pages, e.g. `/s`
    pub search_paths: Vec<String>,
}

impl Default for PageSignals {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        }

        Self {
            version: "2024.06".to_string(),
            in_stock: owned(&[
                "id=\"add-to-cart-button\"",
                "id=\"buy-now-button\"",
                "name=\"submit.add-to-cart\"",
                "add to cart",
                "in stock",
            ]),
            out_of_stock: owned(&[
                "currently unavailable",
                "we don't know when or if this item will be back in stock",
                "id=\"outofstock\"",
                "temporarily out of stock",
                "out of stock.",
            ]),
            third_party_only: owned(&[
                "available from these sellers",
                "see all buying options",
                "no featured offers available",
                "id=\"buybox-see-all-buying-choices\"",
            ]),
            not_found: owned(&[
                "page not found",
                "sorry! we couldn't find that page",
                "looking for something?",
                "the web address you entered is not a functioning page",
            ]),
            bot_check: owned(&[
                "enter the characters you see below",
                "/errors/validatecaptcha",
                "to discuss automated access to amazon data",
                "api-services-support@amazon.com",
            ]),
            search_paths: owned(&["/s", "/gp/search", "/search", "/b"]),
        }
    }
}

fn any_match(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| !needle.is_empty() && haystack.contains(&needle.to_lowercase()))
}

impl PageSignals {
    /// True when the URL path has the shape of a search-results page.
    pub fn is_search_path(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.search_paths.iter().any(|prefix| {
            let prefix = prefix.to_lowercase();
            path == prefix
                || path.starts_with(&format!("{}/", prefix))
                || path.starts_with(&format!("{}?", prefix))
        })
    }

    /// Scans a page body once and reports which signal families matched.
    pub fn scan(&self, body: &str) -> SignalScan {
        let body = body.to_lowercase();
        SignalScan {
            in_stock: any_match(&body, &self.in_stock),
            out_of_stock: any_match(&body, &self.out_of_stock),
            third_party_only: any_match(&body, &self.third_party_only),
            not_found: any_match(&body, &self.not_found),
            bot_check: any_match(&body, &self.bot_check),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalScan {
    pub in_stock: bool,
    pub out_of_stock: bool,
    pub third_party_only: bool,
    pub not_found: bool,
    pub bot_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_path_shapes() {
        let signals = PageSignals::default();
        let search = |u: &str| signals.is_search_path(&Url::parse(u).unwrap());

        assert!(search("https://www.amazon.com/s?k=wireless+mouse"));
        assert!(search("https://www.amazon.com/s/ref=nb_sb_noss?field-keywords=mouse"));
        assert!(search("https://www.amazon.com/gp/search?keywords=mouse"));
        assert!(!search("https://www.amazon.com/dp/B004YAVF8I"));
        assert!(!search("https://www.amazon.com/shop/creator"));
        assert!(!search("https://www.amazon.com/stores/page/123"));
    }

    #[test]
    fn test_scan_is_case_insensitive() {
        let signals = PageSignals::default();
        let scan = signals.scan("<div id=\"availability\">Currently Unavailable.</div>");
        assert!(scan.out_of_stock);
        assert!(!scan.in_stock);

        let scan = signals.scan("<input id=\"add-to-cart-button\" value=\"Add to Cart\">");
        assert!(scan.in_stock);
        assert!(!scan.out_of_stock);
    }

    #[test]
    fn test_custom_signal_set_deserializes_with_defaults() {
        let json = r#"{"version": "test", "out_of_stock": ["sold out"]}"#;
        let signals: PageSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.version, "test");
        assert!(signals.scan("SOLD OUT").out_of_stock);
        assert!(!signals.in_stock.is_empty());
    }
}
