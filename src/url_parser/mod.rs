//! URL classification for affiliate links: link kind, product id, affiliate tag.

pub mod classifier;
pub mod patterns;
pub mod url_validator;

#[cfg(test)]
mod tests;

pub use classifier::{ClassifiedUrl, LinkKind, MarketplaceConfig, UrlClassifier};
pub use patterns::extract_product_id;
pub use url_validator::{normalize_url, validate_url};
