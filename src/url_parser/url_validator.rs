use anyhow::{bail, Context, Result};
use tracing::error;
use url::Url;

// Constants for validation
const MAX_URL_LENGTH: usize = 2048;

/// Validates basic URL requirements
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        error!("Received empty URL");
        bail!("URL cannot be empty");
    }

    if url.len() > MAX_URL_LENGTH {
        error!("URL exceeds maximum length: {} > {}", url.len(), MAX_URL_LENGTH);
        bail!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        error!("URL lacks proper protocol: {}", url);
        bail!("URL must start with http:// or https://");
    }

    Ok(())
}

/// Host without a leading `www.`
pub fn bare_host(url: &Url) -> String {
    url.host_str()
        .map(|host| host.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}

/// Canonical form of a URL used for comparison and as a cache key.
///
/// Lowercases the host, strips `www.`, drops the fragment and a trailing
/// slash on non-root paths, and sorts the query pairs.
pub fn normalize_url(url: &str) -> Result<Url> {
    validate_url(url)?;
    let mut parsed = Url::parse(url.trim()).with_context(|| format!("Failed to parse URL: {}", url))?;

    let host = bare_host(&parsed);
    if host.is_empty() {
        bail!("URL has no host: {}", url);
    }
    parsed
        .set_host(Some(&host))
        .with_context(|| format!("Failed to set host for {}", url))?;
    parsed.set_fragment(None);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        pairs.sort();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    Ok(parsed)
}
