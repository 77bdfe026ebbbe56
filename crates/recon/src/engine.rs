use crate::aggregate::{aggregate_campaigns, apply_roas_source};
use crate::classify::evaluate;
use crate::config::{ReportConfig, ReportMode};
use crate::derived::build_daily_rollup;
use crate::error::ReportError;
use crate::loaders::{load_campaigns, load_organic, load_sponsored};
use crate::model::{Diagnostics, ReportInput, ReportMeta, ReportResult};

/// Run the full report pipeline. Either every table is produced or an error
/// naming the offending input is returned.
pub fn run(config: &ReportConfig, input: &ReportInput) -> Result<ReportResult, ReportError> {
    config.validate()?;
    let mode = config.mode;

    let (organic, organic_load) = load_organic(&input.organic, config)?;
    let (campaign_rows, campaign_load) = load_campaigns(&input.campaign, config, mode)?;
    let (sponsored, sponsored_load) = load_sponsored(&input.sponsored, config)?;

    let mut campaigns = aggregate_campaigns(&campaign_rows, mode);
    apply_roas_source(&mut campaigns, config.roas_source);
    log::info!("{} campaign(s) after {mode} aggregation", campaigns.len());

    let eval = evaluate(
        &campaigns,
        &organic,
        &sponsored,
        &config.thresholds,
        &config.marketplace_prefix,
    );

    let daily = match mode {
        ReportMode::Daily => Some(build_daily_rollup(&campaign_rows)),
        ReportMode::Consolidated => None,
    };

    Ok(ReportResult {
        meta: ReportMeta {
            mode,
            roas_source: config.roas_source,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        kpis: eval.kpis,
        pause: eval.pause,
        promote: eval.promote,
        scale: eval.scale,
        raise_acos: eval.raise_acos,
        campaigns,
        daily,
        diagnostics: Diagnostics {
            loads: vec![organic_load, campaign_load, sponsored_load],
            inactive_rules: eval.inactive_rules,
        },
    })
}
