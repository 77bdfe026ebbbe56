//! `adsgrid report`, `top`, `daily`, `init-config` and `validate`.

use std::io::Write;
use std::path::{Path, PathBuf};

use adsgrid_io::{csv as csv_out, import_any, json, write_outputs, xlsx};
use adsgrid_recon::aggregate::{aggregate_campaigns, apply_roas_source};
use adsgrid_recon::derived::build_daily_rollup;
use adsgrid_recon::loaders::load_campaigns;
use adsgrid_recon::model::{InputKind, ReportInput, ReportResult, WorkbookData};
use adsgrid_recon::ranking::{top_campaigns, RankMetric, RankOrder};
use adsgrid_recon::{ReportConfig, ReportError, ReportMode, Thresholds};

use crate::CliError;

pub struct ReportArgs {
    pub organic: PathBuf,
    pub campaigns: PathBuf,
    pub sponsored: PathBuf,
    pub mode: Option<ReportMode>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub json_output: Option<PathBuf>,
    pub overrides: Vec<(&'static str, f64)>,
    pub quiet: bool,
}

fn export_err(msg: impl Into<String>) -> CliError {
    CliError::report(ReportError::Export(msg.into()))
}

/// Read the config file (or defaults) and apply CLI overrides on top.
fn load_config(
    path: Option<&Path>,
    mode: Option<ReportMode>,
    overrides: &[(&'static str, f64)],
) -> Result<ReportConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
            ReportConfig::from_toml(&text)?
        }
        None => ReportConfig::default(),
    };

    if let Some(mode) = mode {
        config.mode = mode;
    }
    for &(name, value) in overrides {
        set_threshold(&mut config.thresholds, name, value)?;
    }
    config.validate()?;
    Ok(config)
}

fn set_threshold(t: &mut Thresholds, name: &str, value: f64) -> Result<(), CliError> {
    let slot = match name {
        "min_visits_for_promotion" => &mut t.min_visits_for_promotion,
        "min_organic_conversion_for_promotion" => &mut t.min_organic_conversion_for_promotion,
        "min_investment_for_pause" => &mut t.min_investment_for_pause,
        "max_cvr_for_pause" => &mut t.max_cvr_for_pause,
        "min_lost_share_budget_for_scale" => &mut t.min_lost_share_budget_for_scale,
        "min_cvr_for_scale" => &mut t.min_cvr_for_scale,
        "min_roas_for_scale" => &mut t.min_roas_for_scale,
        "min_lost_share_ranking_for_acos_raise" => &mut t.min_lost_share_ranking_for_acos_raise,
        "min_roas_for_acos_raise" => &mut t.min_roas_for_acos_raise,
        other => return Err(CliError::args(format!("unknown threshold '{other}'"))),
    };
    *slot = value;
    Ok(())
}

/// Import one export, naming the input in any failure.
fn read_input(path: &Path, input: InputKind) -> Result<WorkbookData, CliError> {
    let workbook = import_any(path).map_err(|message| {
        CliError::report(ReportError::Unreadable { input, message })
            .with_hint("supported formats: xlsx, xls, xlsb, ods, csv, tsv")
    })?;
    log::debug!("{input}: {} sheet(s) from {}", workbook.sheets.len(), path.display());
    Ok(workbook)
}

fn default_output_name() -> PathBuf {
    PathBuf::from(format!("ads_report_{}.xlsx", chrono::Local::now().format("%Y-%m-%d_%H%M")))
}

// ============================================================================
// report
// ============================================================================

pub fn cmd_report(args: ReportArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref(), args.mode, &args.overrides)?;

    let input = ReportInput {
        organic: read_input(&args.organic, InputKind::Organic)?,
        campaign: read_input(&args.campaigns, InputKind::Campaign)?,
        sponsored: read_input(&args.sponsored, InputKind::Sponsored)?,
    };

    let result = adsgrid_recon::run(&config, &input)?;

    let output = args.output.unwrap_or_else(default_output_name);

    // Render every artifact before touching the filesystem.
    let workbook = xlsx::export_report(&result).map_err(|e| export_err(e))?;
    let json_bytes = if args.json || args.json_output.is_some() {
        Some(json::export_report(&result).map_err(|e| export_err(e))?)
    } else {
        None
    };

    let mut files: Vec<(&Path, &[u8])> = vec![(output.as_path(), workbook.as_slice())];
    if let (Some(path), Some(bytes)) = (args.json_output.as_deref(), json_bytes.as_deref()) {
        files.push((path, bytes));
    }
    write_outputs(&files).map_err(|e| export_err(e))?;

    if let (true, Some(bytes)) = (args.json, json_bytes.as_deref()) {
        let mut out = std::io::stdout().lock();
        out.write_all(bytes)
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|e| CliError::io(e.to_string()))?;
    }

    if !args.quiet {
        print_summary(&result, &output);
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReportResult, output: &Path) {
    let k = &result.kpis;
    eprintln!(
        "{} report: investment {:.2}, revenue {:.2}, sales {}, ROAS {:.2}",
        result.meta.mode, k.investment_total, k.revenue_total, k.attributed_sales_total, k.roas,
    );
    eprintln!(
        "{} campaigns, {} sponsored listings",
        k.campaigns_unique, k.sponsored_listings_unique,
    );
    eprintln!(
        "actions: {} pause, {} promote, {} scale budget, {} raise ACOS target",
        result.pause.len(),
        result.promote.len(),
        result.scale.len(),
        result.raise_acos.len(),
    );
    if let Some(ref daily) = result.daily {
        eprintln!("daily series: {} day(s)", daily.len());
    }

    for load in &result.diagnostics.loads {
        if load.sheet_fallback {
            eprintln!("warning: {}: no matching sheet, used '{}'", load.input, load.sheet);
        }
        if !load.missing_fields.is_empty() {
            eprintln!(
                "warning: {}: columns not found: {}",
                load.input,
                load.missing_fields.join(", "),
            );
        }
    }
    for rule in &result.diagnostics.inactive_rules {
        eprintln!("warning: {rule} rule skipped, its columns are missing");
    }
    eprintln!("wrote {}", output.display());
}

// ============================================================================
// top
// ============================================================================

pub fn cmd_top(
    campaigns: PathBuf,
    mode: Option<ReportMode>,
    config: Option<PathBuf>,
    by: RankMetric,
    ascending: bool,
    limit: usize,
    json_output: bool,
) -> Result<(), CliError> {
    if limit == 0 {
        return Err(CliError::args("--limit must be at least 1"));
    }
    let config = load_config(config.as_deref(), mode, &[])?;
    let workbook = read_input(&campaigns, InputKind::Campaign)?;

    let (records, _) = load_campaigns(&workbook, &config, config.mode)?;
    let mut aggregates = aggregate_campaigns(&records, config.mode);
    apply_roas_source(&mut aggregates, config.roas_source);

    let order = if ascending { RankOrder::Ascending } else { RankOrder::Descending };
    let top = top_campaigns(&aggregates, by, order, limit);

    if json_output {
        let json_str = serde_json::to_string_pretty(&top)
            .map_err(|e| export_err(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let width = top.iter().map(|c| c.campaign_name.chars().count()).max().unwrap_or(8).max(8);
    writeln!(out, "{:>3}  {:<width$}  {:>14}", "#", "campaign", by.to_string())
        .map_err(|e| CliError::io(e.to_string()))?;
    for (i, campaign) in top.iter().enumerate() {
        let value = by.value(campaign).unwrap_or_default();
        writeln!(out, "{:>3}  {:<width$}  {:>14.2}", i + 1, campaign.campaign_name, value)
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    if top.len() < limit {
        eprintln!("{} campaign(s) have a {} value", top.len(), by);
    }
    Ok(())
}

// ============================================================================
// daily
// ============================================================================

pub fn cmd_daily(
    campaigns: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref(), Some(ReportMode::Daily), &[])?;
    let workbook = read_input(&campaigns, InputKind::Campaign)?;

    let (records, _) = load_campaigns(&workbook, &config, ReportMode::Daily)?;
    let points = build_daily_rollup(&records);

    if json_output {
        let json_str = serde_json::to_string_pretty(&points)
            .map_err(|e| export_err(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else if let Some(ref path) = output {
        csv_out::export_daily(&points, path)
            .map_err(|e| export_err(format!("cannot write {}: {e}", path.display())))?;
        if !quiet {
            eprintln!("wrote {} day(s) to {}", points.len(), path.display());
        }
    } else {
        let stdout = std::io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        csv_out::write_daily(&mut writer, &points).map_err(|e| export_err(e))?;
        writer.flush().map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// init-config / validate
// ============================================================================

pub fn cmd_init_config() -> Result<(), CliError> {
    let text = ReportConfig::default().to_toml()?;
    print!("{text}");
    Ok(())
}

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&path), None, &[])?;
    eprintln!(
        "{}: ok ({} mode, roas from {}, prefix {})",
        path.display(),
        config.mode,
        match config.roas_source {
            adsgrid_recon::RoasSource::Platform => "platform",
            adsgrid_recon::RoasSource::Derived => "revenue / investment",
        },
        config.marketplace_prefix,
    );
    Ok(())
}
