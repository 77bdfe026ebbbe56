use crate::model::CampaignAggregate;

pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Campaign metric a ranking is taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Revenue,
    Investment,
    Roas,
    Sales,
}

impl RankMetric {
    pub fn value(self, c: &CampaignAggregate) -> Option<f64> {
        match self {
            Self::Revenue => c.revenue,
            Self::Investment => c.investment,
            Self::Roas => c.roas,
            Self::Sales => c.attributed_sales,
        }
    }
}

impl std::fmt::Display for RankMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revenue => write!(f, "revenue"),
            Self::Investment => write!(f, "investment"),
            Self::Roas => write!(f, "roas"),
            Self::Sales => write!(f, "sales"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankOrder {
    #[default]
    Descending,
    Ascending,
}

/// Top `limit` campaigns by `metric`. Campaigns without the metric are left
/// out; ties keep campaign-name order.
pub fn top_campaigns(
    campaigns: &[CampaignAggregate],
    metric: RankMetric,
    order: RankOrder,
    limit: usize,
) -> Vec<CampaignAggregate> {
    let mut ranked: Vec<(f64, &CampaignAggregate)> = campaigns
        .iter()
        .filter_map(|c| metric.value(c).map(|v| (v, c)))
        .collect();
    ranked.sort_by(|(a, _), (b, _)| match order {
        RankOrder::Descending => b.total_cmp(a),
        RankOrder::Ascending => a.total_cmp(b),
    });
    ranked.into_iter().take(limit).map(|(_, c)| c.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportMode;
    use crate::model::CampaignRecord;

    fn campaigns() -> Vec<CampaignAggregate> {
        let rows: Vec<CampaignRecord> = [("A", Some(10.0)), ("B", Some(30.0)), ("C", None), ("D", Some(20.0))]
            .into_iter()
            .map(|(name, revenue)| CampaignRecord {
                campaign_name: name.into(),
                revenue,
                ..Default::default()
            })
            .collect();
        crate::aggregate::aggregate_campaigns(&rows, ReportMode::Consolidated)
    }

    fn names(v: &[CampaignAggregate]) -> Vec<&str> {
        v.iter().map(|c| c.campaign_name.as_str()).collect()
    }

    #[test]
    fn descending_with_limit() {
        let top = top_campaigns(&campaigns(), RankMetric::Revenue, RankOrder::Descending, 2);
        assert_eq!(names(&top), ["B", "D"]);
    }

    #[test]
    fn ascending_skips_missing() {
        let top = top_campaigns(&campaigns(), RankMetric::Revenue, RankOrder::Ascending, DEFAULT_TOP_LIMIT);
        assert_eq!(names(&top), ["A", "D", "B"]);
        assert!(top_campaigns(&campaigns(), RankMetric::Roas, RankOrder::Descending, 10).is_empty());
    }
}
