use once_cell::sync::Lazy;
use regex::Regex;

/// Marketplace path shapes that carry a product id, tried in order.
pub static PRODUCT_ID_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("dp", Regex::new(r"(?i)/dp/([A-Z0-9]{10})(?:/|$)").unwrap()),
        ("gp_product", Regex::new(r"(?i)/gp/product/([A-Z0-9]{10})(?:/|$)").unwrap()),
        ("gp_aw_d", Regex::new(r"(?i)/gp/aw/d/([A-Z0-9]{10})(?:/|$)").unwrap()),
        ("obidos", Regex::new(r"(?i)/exec/obidos/(?:ASIN|tg/detail/-)/([A-Z0-9]{10})(?:/|$)").unwrap()),
        ("o_asin", Regex::new(r"(?i)/o/ASIN/([A-Z0-9]{10})(?:/|$)").unwrap()),
        ("product", Regex::new(r"(?i)/product/([A-Z0-9]{10})(?:/|$)").unwrap()),
    ]
});

/// Returns the first product id found in a URL path.
pub fn extract_product_id(path: &str) -> Option<String> {
    PRODUCT_ID_PATTERNS.iter().find_map(|(_, re)| {
        re.captures(path)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_known_shapes() {
        assert_eq!(extract_product_id("/dp/B08N5WRWNW"), Some("B08N5WRWNW".to_string()));
        assert_eq!(
            extract_product_id("/Some-Product-Name/dp/B08N5WRWNW/ref=sr_1_1"),
            Some("B08N5WRWNW".to_string())
        );
        assert_eq!(extract_product_id("/gp/product/0596007124"), Some("0596007124".to_string()));
        assert_eq!(extract_product_id("/gp/aw/d/b00x4whp5e"), Some("B00X4WHP5E".to_string()));
        assert_eq!(
            extract_product_id("/exec/obidos/ASIN/B000FA5TP8/"),
            Some("B000FA5TP8".to_string())
        );
    }

    #[test]
    fn test_rejects_wrong_length_tokens() {
        assert_eq!(extract_product_id("/dp/B08N5WRW"), None);
        assert_eq!(extract_product_id("/dp/B08N5WRWNWX"), None);
        assert_eq!(extract_product_id("/s"), None);
    }
}
