use crate::models::Merchant;
use crate::url_parser::{normalize_url, validate_url, LinkKind, MarketplaceConfig, UrlClassifier};

#[test]
fn test_validate_url_rules() {
    assert!(validate_url("https://www.amazon.com/dp/B08N5WRWNW").is_ok());

    let err = validate_url("").unwrap_err();
    assert!(err.to_string().contains("URL cannot be empty"));

    let err = validate_url("amazon.com/dp/B08N5WRWNW").unwrap_err();
    assert!(err.to_string().contains("must start with http:// or https://"));

    let long = format!("https://example.com/{}", "a".repeat(2100));
    assert!(validate_url(&long).is_err());
}

#[test]
fn test_normalize_url() {
    let normalized = normalize_url("https://WWW.Amazon.com/dp/B08N5WRWNW/?tag=b-20&th=1#reviews").unwrap();
    assert_eq!(normalized.as_str(), "https://amazon.com/dp/B08N5WRWNW?tag=b-20&th=1");

    let normalized = normalize_url("https://example.com/").unwrap();
    assert_eq!(normalized.as_str(), "https://example.com/");

    let reordered = normalize_url("https://example.com/p?b=2&a=1").unwrap();
    assert_eq!(reordered.as_str(), "https://example.com/p?a=1&b=2");
}

#[test]
fn test_classify_product_page() {
    let classifier = UrlClassifier::default();
    let classified = classifier
        .classify("https://www.amazon.com/Logitech-M185/dp/B004YAVF8I?tag=creator-20")
        .unwrap();

    assert_eq!(classified.kind, LinkKind::MarketplaceProduct);
    assert_eq!(classified.merchant(), Merchant::Marketplace);
    assert_eq!(classified.product_id.as_deref(), Some("B004YAVF8I"));
    assert_eq!(classified.affiliate_tag.as_deref(), Some("creator-20"));
    assert_eq!(classified.cache_key(), "B004YAVF8I");
}

#[test]
fn test_same_product_different_tags_share_cache_key() {
    let classifier = UrlClassifier::default();
    let a = classifier.classify("https://amazon.com/dp/B004YAVF8I?tag=one-20").unwrap();
    let b = classifier.classify("https://www.amazon.co.uk/gp/product/B004YAVF8I?tag=two-21").unwrap();
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn test_classify_short_link_and_unknown_merchant() {
    let classifier = UrlClassifier::default();

    let short = classifier.classify("https://amzn.to/3xYzAbC").unwrap();
    assert_eq!(short.kind, LinkKind::MarketplaceShortLink);
    assert!(short.product_id.is_none());
    assert_eq!(short.cache_key(), "https://amzn.to/3xYzAbC");

    let other = classifier.classify("https://shop.example.com/dp/B004YAVF8I").unwrap();
    assert_eq!(other.kind, LinkKind::UnknownMerchant);
    assert_eq!(other.merchant(), Merchant::Unknown);
    assert!(other.product_id.is_none());
}

#[test]
fn test_marketplace_page_without_product() {
    let classifier = UrlClassifier::default();
    let page = classifier.classify("https://www.amazon.com/shop/somecreator").unwrap();
    assert_eq!(page.kind, LinkKind::MarketplacePage);
    assert!(page.affiliate_tag.is_none());
}

#[test]
fn test_custom_hosts_and_tag_params() {
    let config = MarketplaceConfig {
        product_hosts: vec!["127.0.0.1".to_string()],
        short_link_hosts: vec![],
        tag_params: vec!["tag".to_string(), "ref_tag".to_string()],
    };
    let classifier = UrlClassifier::new(config);
    let classified = classifier.classify("http://127.0.0.1:8080/dp/B004YAVF8I?ref_tag=x-20").unwrap();
    assert_eq!(classified.kind, LinkKind::MarketplaceProduct);
    assert_eq!(classified.affiliate_tag.as_deref(), Some("x-20"));
}

#[test]
fn test_empty_tag_is_absent() {
    let classifier = UrlClassifier::default();
    let classified = classifier.classify("https://amazon.com/dp/B004YAVF8I?tag=").unwrap();
    assert!(classified.affiliate_tag.is_none());
}
