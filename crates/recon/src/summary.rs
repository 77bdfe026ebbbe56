use std::collections::HashSet;

use crate::model::{CampaignAggregate, KpiSummary, SponsoredAd};

/// Account-level KPIs over the per-campaign table.
///
/// Missing values contribute nothing to the totals. ROAS is 0.0 when total
/// investment is 0.
pub fn compute_kpis(aggregates: &[CampaignAggregate], sponsored: &[SponsoredAd]) -> KpiSummary {
    let total = |field: fn(&CampaignAggregate) -> Option<f64>| -> f64 {
        aggregates.iter().filter_map(field).sum()
    };
    let investment_total = total(|a| a.investment);
    let revenue_total = total(|a| a.revenue);
    let attributed_sales_total = total(|a| a.attributed_sales);

    let roas = if investment_total == 0.0 {
        0.0
    } else {
        revenue_total / investment_total
    };

    let campaigns: HashSet<&str> = aggregates.iter().map(|a| a.campaign_name.as_str()).collect();
    let listings: HashSet<&str> = sponsored.iter().filter_map(|s| s.listing_id.as_deref()).collect();

    KpiSummary {
        investment_total,
        revenue_total,
        attributed_sales_total,
        roas,
        campaigns_unique: campaigns.len(),
        sponsored_listings_unique: listings.len(),
    }
}
