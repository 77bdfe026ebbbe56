use std::collections::BTreeMap;

use crate::config::{ReportMode, RoasSource};
use crate::model::{CampaignAggregate, CampaignRecord};

/// Collapse campaign rows into one aggregate per campaign name.
///
/// DAILY groups by name: flow metrics are summed, platform ratios averaged,
/// state fields take the most recent value. CONSOLIDATED passes each row
/// through unchanged. Output is ordered by campaign name in both modes.
pub fn aggregate_campaigns(records: &[CampaignRecord], mode: ReportMode) -> Vec<CampaignAggregate> {
    match mode {
        ReportMode::Daily => aggregate_daily(records),
        ReportMode::Consolidated => pass_through(records),
    }
}

fn pass_through(records: &[CampaignRecord]) -> Vec<CampaignAggregate> {
    let mut by_name: BTreeMap<&str, CampaignAggregate> = BTreeMap::new();
    for r in records {
        if by_name.contains_key(r.campaign_name.as_str()) {
            log::warn!("campaign '{}' listed twice in consolidated report, keeping first row", r.campaign_name);
            continue;
        }
        by_name.insert(&r.campaign_name, from_record(r));
    }
    by_name.into_values().collect()
}

fn from_record(r: &CampaignRecord) -> CampaignAggregate {
    CampaignAggregate {
        campaign_name: r.campaign_name.clone(),
        status: r.status.clone(),
        budget: r.budget,
        target_acos: r.target_acos,
        impressions: r.impressions,
        clicks: r.clicks,
        revenue: r.revenue,
        investment: r.investment,
        attributed_sales: r.attributed_sales,
        roas: r.roas,
        cvr: r.cvr,
        lost_impression_share_budget: r.lost_impression_share_budget,
        lost_impression_share_ranking: r.lost_impression_share_ranking,
    }
}

fn aggregate_daily(records: &[CampaignRecord]) -> Vec<CampaignAggregate> {
    let mut groups: BTreeMap<&str, Vec<&CampaignRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(&r.campaign_name).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(name, mut rows)| {
            // Chronological order only when every granule is dated.
            if rows.iter().all(|r| r.date.is_some()) {
                rows.sort_by_key(|r| r.date);
            }
            CampaignAggregate {
                campaign_name: name.to_string(),
                status: rows.iter().rev().find_map(|r| r.status.clone()),
                budget: last(&rows, |r| r.budget),
                target_acos: last(&rows, |r| r.target_acos),
                impressions: sum(&rows, |r| r.impressions),
                clicks: sum(&rows, |r| r.clicks),
                revenue: sum(&rows, |r| r.revenue),
                investment: sum(&rows, |r| r.investment),
                attributed_sales: sum(&rows, |r| r.attributed_sales),
                roas: mean(&rows, |r| r.roas),
                cvr: mean(&rows, |r| r.cvr),
                lost_impression_share_budget: mean(&rows, |r| r.lost_impression_share_budget),
                lost_impression_share_ranking: mean(&rows, |r| r.lost_impression_share_ranking),
            }
        })
        .collect()
}

fn sum(rows: &[&CampaignRecord], field: impl Fn(&CampaignRecord) -> Option<f64>) -> Option<f64> {
    rows.iter().filter_map(|r| field(r)).fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn mean(rows: &[&CampaignRecord], field: impl Fn(&CampaignRecord) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| field(r)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn last(rows: &[&CampaignRecord], field: impl Fn(&CampaignRecord) -> Option<f64>) -> Option<f64> {
    rows.iter().rev().find_map(|r| field(r))
}

/// Replace platform ROAS with `revenue / investment` when configured to.
pub fn apply_roas_source(aggregates: &mut [CampaignAggregate], source: RoasSource) {
    if source == RoasSource::Platform {
        return;
    }
    for agg in aggregates {
        agg.roas = match (agg.revenue, agg.investment) {
            (Some(revenue), Some(investment)) if investment != 0.0 => Some(revenue / investment),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(name: &str, d: u32, investment: Option<f64>) -> CampaignRecord {
        CampaignRecord {
            campaign_name: name.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, d),
            investment,
            ..Default::default()
        }
    }

    #[test]
    fn daily_sums_flows_and_averages_ratios() {
        let mut a1 = day("A", 1, Some(50.0));
        a1.attributed_sales = Some(0.0);
        a1.cvr = Some(0.005);
        a1.roas = Some(2.0);
        let mut a2 = day("A", 2, Some(60.0));
        a2.attributed_sales = Some(0.0);
        a2.cvr = Some(0.005);
        a2.roas = Some(4.0);
        let b = day("B", 1, Some(40.0));

        let aggs = aggregate_campaigns(&[a1, b, a2], ReportMode::Daily);
        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].campaign_name, "A");
        assert_eq!(aggs[0].investment, Some(110.0));
        assert_eq!(aggs[0].attributed_sales, Some(0.0));
        assert_eq!(aggs[0].cvr, Some(0.005));
        assert_eq!(aggs[0].roas, Some(3.0));
        assert_eq!(aggs[1].campaign_name, "B");
    }

    #[test]
    fn last_value_follows_dates_not_input_order() {
        let mut late = day("A", 9, None);
        late.budget = Some(80.0);
        late.status = Some("Pausada".into());
        let mut early = day("A", 1, None);
        early.budget = Some(30.0);
        early.status = Some("Ativa".into());

        let aggs = aggregate_campaigns(&[late, early], ReportMode::Daily);
        assert_eq!(aggs[0].budget, Some(80.0));
        assert_eq!(aggs[0].status.as_deref(), Some("Pausada"));
    }

    #[test]
    fn undated_group_uses_input_order() {
        let mut first = day("A", 9, None);
        first.budget = Some(80.0);
        let mut second = day("A", 1, None);
        second.date = None;
        second.budget = Some(30.0);

        let aggs = aggregate_campaigns(&[first, second], ReportMode::Daily);
        assert_eq!(aggs[0].budget, Some(30.0));
    }

    #[test]
    fn all_missing_stays_missing() {
        let aggs = aggregate_campaigns(&[day("A", 1, None), day("A", 2, None)], ReportMode::Daily);
        assert_eq!(aggs[0].investment, None);
        assert_eq!(aggs[0].cvr, None);

        let aggs = aggregate_campaigns(&[day("A", 1, None), day("A", 2, Some(5.0))], ReportMode::Daily);
        assert_eq!(aggs[0].investment, Some(5.0));
    }

    #[test]
    fn consolidated_is_a_fixed_point() {
        let mut b = day("B", 1, Some(10.0));
        b.date = None;
        b.roas = Some(7.5);
        let mut a = day("A", 1, Some(20.0));
        a.date = None;

        let once = aggregate_campaigns(&[b, a], ReportMode::Consolidated);
        let records: Vec<CampaignRecord> = once.iter().map(CampaignAggregate::to_record).collect();
        let twice = aggregate_campaigns(&records, ReportMode::Consolidated);
        assert_eq!(once, twice);
        assert_eq!(once[0].campaign_name, "A");
        assert_eq!(once[1].roas, Some(7.5));
    }

    #[test]
    fn consolidated_keeps_first_duplicate() {
        let aggs = aggregate_campaigns(
            &[day("A", 1, Some(1.0)), day("A", 2, Some(2.0))],
            ReportMode::Consolidated,
        );
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].investment, Some(1.0));
    }

    #[test]
    fn derived_roas_replaces_platform_value() {
        let mut a = day("A", 1, Some(50.0));
        a.revenue = Some(200.0);
        a.roas = Some(9.0);
        let mut z = day("Z", 1, Some(0.0));
        z.revenue = Some(10.0);
        z.roas = Some(9.0);
        let mut aggs = aggregate_campaigns(&[a, z], ReportMode::Consolidated);

        apply_roas_source(&mut aggs, RoasSource::Platform);
        assert_eq!(aggs[0].roas, Some(9.0));

        apply_roas_source(&mut aggs, RoasSource::Derived);
        assert_eq!(aggs[0].roas, Some(4.0));
        assert_eq!(aggs[1].roas, None);
    }
}
