use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::fetcher::FetchedPage;
use super::signals::PageSignals;
use crate::models::LinkStatus;
use crate::url_parser::{normalize_url, ClassifiedUrl, LinkKind, UrlClassifier};

/// What one fetch showed about a marketplace link's affiliate tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvidence {
    /// The probed URL carried a tag
    pub original_tag: bool,
    /// The URL the fetch ended on carried a tag
    pub resolved_tag: bool,
    /// The fetch ended on a different URL than it started from
    pub redirected: bool,
}

impl TagEvidence {
    /// A tagged link was redirected somewhere without its tag.
    pub fn stripped(&self) -> bool {
        self.original_tag && self.redirected && !self.resolved_tag
    }

    /// Whether the probed link itself ends up without a tag.
    pub fn missing_tag(&self) -> bool {
        if self.original_tag {
            self.stripped()
        } else {
            !self.resolved_tag
        }
    }

    /// Whether another link to the same product ends up without a tag.
    /// Only whether the marketplace strips tags on redirect carries over.
    pub fn missing_tag_for(&self, has_tag: bool) -> bool {
        if has_tag {
            self.stripped()
        } else {
            true
        }
    }
}

/// Outcome of classifying one fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct PageVerdict {
    /// Availability of the page. Never `MISSING_TAG`; the tag check is
    /// layered on top by [`PageVerdict::link_status`].
    pub status: LinkStatus,
    pub http_code: Option<u16>,
    /// Product id of the page the link resolved to, if it is a product page.
    pub resolved_product_id: Option<String>,
    /// Present when the page was readable enough for the tag to matter.
    pub tag: Option<TagEvidence>,
}

impl PageVerdict {
    /// Status of the probed link, with a lost or absent tag reported as
    /// `MISSING_TAG`.
    pub fn link_status(&self) -> LinkStatus {
        with_tag_check(self.status, self.tag.map(|t| t.missing_tag()))
    }
}

/// Applies a tag verdict on top of an availability status.
pub fn with_tag_check(status: LinkStatus, missing_tag: Option<bool>) -> LinkStatus {
    match missing_tag {
        Some(true) => LinkStatus::MissingTag,
        Some(false) | None => status,
    }
}

/// Decides a link's availability from the response it produced. Pure; no I/O.
///
/// Order matters: hard HTTP failures, then the search-results shape of the
/// final URL, then anything that prevents a confident read, then body
/// signals, then redirect detection. Pages that get past the stock checks
/// carry [`TagEvidence`] for marketplace links.
pub fn classify_page(
    target: &ClassifiedUrl,
    page: &FetchedPage,
    classifier: &UrlClassifier,
    signals: &PageSignals,
) -> PageVerdict {
    let http_code = Some(page.status);
    let final_url = normalize_url(&page.final_url).ok();
    let resolved_product_id = final_url.as_ref().and_then(|u| classifier.product_id_of(u));
    let verdict = |status: LinkStatus, tag: Option<TagEvidence>| PageVerdict {
        status,
        http_code,
        resolved_product_id: resolved_product_id.clone(),
        tag,
    };

    if page.status == 404 || page.status == 410 {
        return verdict(LinkStatus::NotFound, None);
    }

    if let Some(final_url) = &final_url {
        if signals.is_search_path(final_url) {
            debug!("{} landed on search results at {}", target.original, final_url);
            return verdict(LinkStatus::SearchRedirect, None);
        }
    }

    if page.status == 429 {
        debug!("{} was rate limited", target.original);
        return verdict(LinkStatus::Unknown, None);
    }
    if !page.is_success() || !page.is_html() {
        trace!(
            "{} not classifiable: status={}, content_type={:?}",
            target.original,
            page.status,
            page.content_type
        );
        return verdict(LinkStatus::Unknown, None);
    }

    let scan = signals.scan(&page.body);
    if scan.bot_check {
        debug!("{} served a bot check page", target.original);
        return verdict(LinkStatus::Unknown, None);
    }
    if scan.not_found {
        return verdict(LinkStatus::NotFound, None);
    }

    let is_marketplace = match target.kind {
        LinkKind::MarketplaceProduct | LinkKind::MarketplaceShortLink | LinkKind::MarketplacePage => true,
        LinkKind::UnknownMerchant => false,
    };

    let tag = if is_marketplace {
        if scan.out_of_stock {
            return verdict(LinkStatus::OutOfStock, None);
        }
        if scan.third_party_only {
            return verdict(LinkStatus::OutOfStockThirdParty, None);
        }

        let evidence = TagEvidence {
            original_tag: target.affiliate_tag.is_some(),
            resolved_tag: final_url.as_ref().and_then(|u| classifier.affiliate_tag(u)).is_some(),
            redirected: final_url.as_ref().is_some_and(|u| *u != target.normalized),
        };
        if evidence.stripped() {
            debug!("{} lost its tag on the way to {}", target.original, page.final_url);
        }
        Some(evidence)
    } else {
        None
    };

    if redirected_elsewhere(target, final_url.as_ref(), resolved_product_id.as_deref()) {
        return verdict(LinkStatus::Redirect, tag);
    }

    let expects_buy_box = match target.kind {
        LinkKind::MarketplaceProduct => true,
        LinkKind::MarketplaceShortLink => resolved_product_id.is_some(),
        LinkKind::MarketplacePage | LinkKind::UnknownMerchant => false,
    };
    if expects_buy_box && !scan.in_stock {
        debug!("{} shows no purchase signal (signals v{})", target.original, signals.version);
        return verdict(LinkStatus::Unknown, tag);
    }

    verdict(LinkStatus::Ok, tag)
}

/// A redirect that ended on a different page than the link pointed at.
/// Short-links always redirect, so only their landing page is judged.
fn redirected_elsewhere(target: &ClassifiedUrl, final_url: Option<&Url>, resolved_product_id: Option<&str>) -> bool {
    let Some(final_url) = final_url else {
        return false;
    };

    match (target.kind, target.product_id.as_deref(), resolved_product_id) {
        (LinkKind::MarketplaceShortLink, _, _) => false,
        (_, Some(original), Some(resolved)) => original != resolved,
        (_, Some(_), None) => true,
        (_, None, _) => {
            let original = &target.normalized;
            original.host_str() != final_url.host_str() || original.path() != final_url.path()
        }
    }
}
