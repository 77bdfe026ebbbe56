//! Derived datasets built from the raw (pre-aggregation) campaign table.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{CampaignRecord, DailyPoint, DailyTotals};

/// Account-wide totals per day, ascending by date.
///
/// Only meaningful for daily exports. Rows without a readable date are left
/// out; missing metric cells count as zero.
pub fn build_daily_rollup(records: &[CampaignRecord]) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    let mut undated = 0usize;

    for r in records {
        let Some(date) = r.date else {
            undated += 1;
            continue;
        };
        let t = by_date.entry(date).or_default();
        t.investment += r.investment.unwrap_or(0.0);
        t.revenue += r.revenue.unwrap_or(0.0);
        t.attributed_sales += r.attributed_sales.unwrap_or(0.0);
        t.clicks += r.clicks.unwrap_or(0.0);
        t.impressions += r.impressions.unwrap_or(0.0);
    }

    if undated > 0 {
        log::warn!("daily rollup: {undated} undated row(s) left out");
    }

    by_date
        .into_iter()
        .map(|(date, totals)| DailyPoint { date, totals })
        .collect()
}
