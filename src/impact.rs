//! Rough monthly revenue at risk from a link, by status.

use serde::{Deserialize, Serialize};

use crate::models::LinkStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactSettings {
    /// Fraction of viewers who click the link
    #[serde(alias = "click_through_rate")]
    pub click_through_rate: f64,
    /// Fraction of clicks that purchase
    #[serde(alias = "conversion_rate")]
    pub conversion_rate: f64,
    /// Commission earned per order, in account currency
    #[serde(alias = "average_order_value")]
    pub average_order_value: f64,
}

impl Default for ImpactSettings {
    fn default() -> Self {
        Self {
            click_through_rate: 0.02,
            conversion_rate: 0.03,
            average_order_value: 45.0,
        }
    }
}

/// Share of a link's earnings lost for a given status.
pub fn loss_factor(status: LinkStatus) -> f64 {
    match status {
        LinkStatus::NotFound | LinkStatus::SearchRedirect | LinkStatus::OutOfStock | LinkStatus::MissingTag => 1.0,
        LinkStatus::OutOfStockThirdParty => 0.5,
        LinkStatus::Redirect => 0.25,
        LinkStatus::Ok | LinkStatus::Unknown => 0.0,
    }
}

/// Estimated monthly loss for a link in a video with `view_count` lifetime
/// views. Views are spread evenly over the video's age in months (at least
/// one month).
pub fn estimate_monthly_loss(
    view_count: u64,
    status: LinkStatus,
    settings: &ImpactSettings,
    video_age_months: Option<u32>,
) -> f64 {
    let months = f64::from(video_age_months.unwrap_or(1).max(1));
    let monthly_views = view_count as f64 / months;
    let loss = monthly_views
        * settings.click_through_rate.max(0.0)
        * settings.conversion_rate.max(0.0)
        * settings.average_order_value.max(0.0)
        * loss_factor(status);
    (loss * 100.0).round() / 100.0
}
