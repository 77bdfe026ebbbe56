use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::Thresholds;
use crate::model::{
    Action, CampaignAction, CampaignAggregate, KpiSummary, ListingAction, OrganicListing, SponsoredAd,
};
use crate::summary::compute_kpis;

/// Output of the decision rules. Tables are independent views: one campaign
/// may appear in several of them.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub kpis: KpiSummary,
    pub pause: Vec<CampaignAction>,
    pub promote: Vec<ListingAction>,
    pub scale: Vec<CampaignAction>,
    pub raise_acos: Vec<CampaignAction>,
    /// Rules that could not fire because no row carries their fields.
    pub inactive_rules: Vec<Action>,
}

/// `value > threshold`, false when missing.
fn gt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v > threshold)
}

fn ge(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v >= threshold)
}

fn lt(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v < threshold)
}

fn le(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v <= threshold)
}

/// Descending order on an optional metric; missing sorts last.
fn desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn is_pause(c: &CampaignAggregate, t: &Thresholds) -> bool {
    gt(c.investment, t.min_investment_for_pause)
        && (le(c.attributed_sales, 0.0) || lt(c.cvr, t.max_cvr_for_pause))
}

pub fn is_scale(c: &CampaignAggregate, t: &Thresholds) -> bool {
    gt(c.lost_impression_share_budget, t.min_lost_share_budget_for_scale)
        && ge(c.cvr, t.min_cvr_for_scale)
        && ge(c.roas, t.min_roas_for_scale)
}

pub fn is_raise_acos(c: &CampaignAggregate, t: &Thresholds) -> bool {
    gt(c.lost_impression_share_ranking, t.min_lost_share_ranking_for_acos_raise)
        && ge(c.roas, t.min_roas_for_acos_raise)
}

/// Promotion ignores sponsorship; the caller removes listings already in ads.
pub fn is_promote(l: &OrganicListing, t: &Thresholds) -> bool {
    ge(l.visits, t.min_visits_for_promotion)
        && gt(l.conversion_visits_to_sales, t.min_organic_conversion_for_promotion)
}

fn tag(campaigns: &[CampaignAggregate], action: Action, rule: impl Fn(&CampaignAggregate) -> bool) -> Vec<CampaignAction> {
    campaigns
        .iter()
        .filter(|c| rule(c))
        .map(|c| CampaignAction {
            campaign: c.clone(),
            action,
        })
        .collect()
}

/// Apply the four decision rules and compute the KPI summary.
pub fn evaluate(
    campaigns: &[CampaignAggregate],
    organic: &[OrganicListing],
    sponsored: &[SponsoredAd],
    thresholds: &Thresholds,
    marketplace_prefix: &str,
) -> Evaluation {
    let mut pause = tag(campaigns, Action::Pause, |c| is_pause(c, thresholds));
    pause.sort_by(|a, b| desc(a.campaign.investment, b.campaign.investment));

    let mut scale = tag(campaigns, Action::ScaleBudget, |c| is_scale(c, thresholds));
    scale.sort_by(|a, b| {
        desc(
            a.campaign.lost_impression_share_budget,
            b.campaign.lost_impression_share_budget,
        )
    });

    let mut raise_acos = tag(campaigns, Action::RaiseAcosTarget, |c| is_raise_acos(c, thresholds));
    raise_acos.sort_by(|a, b| {
        desc(
            a.campaign.lost_impression_share_ranking,
            b.campaign.lost_impression_share_ranking,
        )
    });

    let in_ads: HashSet<&str> = sponsored.iter().filter_map(|s| s.listing_id.as_deref()).collect();
    let mut promote: Vec<ListingAction> = organic
        .iter()
        .filter(|l| !in_ads.contains(l.listing_id.as_str()) && is_promote(l, thresholds))
        .map(|l| ListingAction {
            listing: l.clone(),
            ad_code: format!("{marketplace_prefix}{}", l.listing_id),
            action: Action::PromoteToAds,
        })
        .collect();
    promote.sort_by(|a, b| {
        desc(
            a.listing.conversion_visits_to_sales,
            b.listing.conversion_visits_to_sales,
        )
        .then_with(|| desc(a.listing.visits, b.listing.visits))
    });

    let inactive_rules = inactive_rules(campaigns, organic);
    for action in &inactive_rules {
        log::warn!("rule {action} inactive: required fields missing on every row");
    }
    log::info!(
        "rules: {} pause, {} promote, {} scale, {} raise-acos",
        pause.len(),
        promote.len(),
        scale.len(),
        raise_acos.len()
    );

    Evaluation {
        kpis: compute_kpis(campaigns, sponsored),
        pause,
        promote,
        scale,
        raise_acos,
        inactive_rules,
    }
}

/// Rules for which no input row carries every field the rule reads.
fn inactive_rules(campaigns: &[CampaignAggregate], organic: &[OrganicListing]) -> Vec<Action> {
    let any = |f: fn(&CampaignAggregate) -> bool| campaigns.iter().any(f);
    let mut inactive = Vec::new();

    if !any(|c| c.investment.is_some() && (c.attributed_sales.is_some() || c.cvr.is_some())) {
        inactive.push(Action::Pause);
    }
    if !organic
        .iter()
        .any(|l| l.visits.is_some() && l.conversion_visits_to_sales.is_some())
    {
        inactive.push(Action::PromoteToAds);
    }
    if !any(|c| c.lost_impression_share_budget.is_some() && c.cvr.is_some() && c.roas.is_some()) {
        inactive.push(Action::ScaleBudget);
    }
    if !any(|c| c.lost_impression_share_ranking.is_some() && c.roas.is_some()) {
        inactive.push(Action::RaiseAcosTarget);
    }
    inactive
}
