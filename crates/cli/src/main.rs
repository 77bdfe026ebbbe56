// adsgrid CLI - ads report from marketplace exports

mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use adsgrid_recon::ranking::{RankMetric, DEFAULT_TOP_LIMIT};
use adsgrid_recon::{ReportError, ReportMode};
use exit_codes::{report_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "adsgrid")]
#[command(about = "Ads performance report from marketplace exports (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the six-sheet action report from the three exports
    #[command(after_help = "\
Examples:
  adsgrid report --organic publicacoes.xlsx --campaigns campanhas.xlsx --sponsored anuncios.xlsx
  adsgrid report --organic pub.xlsx --campaigns camp.csv --sponsored ads.xlsx --mode daily
  adsgrid report --organic pub.xlsx --campaigns camp.xlsx --sponsored ads.xlsx -o report.xlsx --json
  adsgrid report --organic pub.xlsx --campaigns camp.xlsx --sponsored ads.xlsx --config report.toml
  adsgrid report --organic pub.xlsx --campaigns camp.xlsx --sponsored ads.xlsx --min-roas-for-scale 4")]
    Report {
        #[command(flatten)]
        inputs: InputArgs,

        /// Campaign export granularity (overrides the config file)
        #[arg(long)]
        mode: Option<ModeArg>,

        /// TOML report config
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output workbook (default: ads_report_<date>_<time>.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the full report as JSON to a file
        #[arg(long, value_name = "FILE")]
        json_output: Option<PathBuf>,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Rank campaigns by a metric
    #[command(after_help = "\
Examples:
  adsgrid top --campaigns campanhas.xlsx
  adsgrid top --campaigns campanhas.xlsx --by roas --limit 5
  adsgrid top --campaigns campanhas.csv --mode daily --by investment --ascending
  adsgrid top --campaigns campanhas.xlsx --json | jq '.[0].campaign_name'")]
    Top {
        /// Campaign export
        #[arg(long)]
        campaigns: PathBuf,

        /// Campaign export granularity (overrides the config file)
        #[arg(long)]
        mode: Option<ModeArg>,

        /// TOML report config
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Metric to rank on
        #[arg(long, default_value = "revenue")]
        by: MetricArg,

        /// Lowest first
        #[arg(long)]
        ascending: bool,

        /// Number of campaigns to show
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Per-day totals across all campaigns (daily exports only)
    #[command(after_help = "\
Examples:
  adsgrid daily --campaigns campanhas_diario.xlsx
  adsgrid daily --campaigns campanhas_diario.csv -o serie.csv
  adsgrid daily --campaigns campanhas_diario.xlsx --json")]
    Daily {
        /// Campaign export with one row per campaign per day
        #[arg(long)]
        campaigns: PathBuf,

        /// TOML report config
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// CSV output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output JSON to stdout instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Print the default report config
    #[command(after_help = "\
Examples:
  adsgrid init-config > report.toml")]
    InitConfig,

    /// Validate a report config without running
    #[command(after_help = "\
Examples:
  adsgrid validate report.toml")]
    Validate {
        /// Path to the report config
        config: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Organic listings export
    #[arg(long)]
    organic: PathBuf,

    /// Campaigns export
    #[arg(long)]
    campaigns: PathBuf,

    /// Sponsored ads export
    #[arg(long)]
    sponsored: PathBuf,
}

/// Threshold overrides. Unset flags keep the config file (or default) value.
#[derive(Args, Default)]
struct ThresholdArgs {
    #[arg(long, value_name = "N")]
    min_visits_for_promotion: Option<f64>,
    #[arg(long, value_name = "RATIO")]
    min_organic_conversion_for_promotion: Option<f64>,
    #[arg(long, value_name = "AMOUNT")]
    min_investment_for_pause: Option<f64>,
    #[arg(long, value_name = "RATIO")]
    max_cvr_for_pause: Option<f64>,
    #[arg(long, value_name = "PCT")]
    min_lost_share_budget_for_scale: Option<f64>,
    #[arg(long, value_name = "RATIO")]
    min_cvr_for_scale: Option<f64>,
    #[arg(long, value_name = "ROAS")]
    min_roas_for_scale: Option<f64>,
    #[arg(long, value_name = "PCT")]
    min_lost_share_ranking_for_acos_raise: Option<f64>,
    #[arg(long, value_name = "ROAS")]
    min_roas_for_acos_raise: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Daily,
    Consolidated,
}

impl From<ModeArg> for ReportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Daily => ReportMode::Daily,
            ModeArg::Consolidated => ReportMode::Consolidated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Revenue,
    Investment,
    Roas,
    Sales,
}

impl From<MetricArg> for RankMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Revenue => RankMetric::Revenue,
            MetricArg::Investment => RankMetric::Investment,
            MetricArg::Roas => RankMetric::Roas,
            MetricArg::Sales => RankMetric::Sales,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  adsgrid-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    // An explicit ADSGRID_LOG wins over -v/-q.
    let filter = EnvFilter::try_from_env("ADSGRID_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Report { inputs, mode, config, output, json, json_output, thresholds } => {
            report::cmd_report(report::ReportArgs {
                organic: inputs.organic,
                campaigns: inputs.campaigns,
                sponsored: inputs.sponsored,
                mode: mode.map(Into::into),
                config,
                output,
                json,
                json_output,
                overrides: thresholds.into_overrides(),
                quiet: cli.quiet,
            })
        }
        Commands::Top { campaigns, mode, config, by, ascending, limit, json } => report::cmd_top(
            campaigns,
            mode.map(Into::into),
            config,
            by.into(),
            ascending,
            limit,
            json,
        ),
        Commands::Daily { campaigns, config, output, json } => {
            report::cmd_daily(campaigns, config, output, json, cli.quiet)
        }
        Commands::InitConfig => report::cmd_init_config(),
        Commands::Validate { config } => report::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

impl ThresholdArgs {
    fn into_overrides(self) -> Vec<(&'static str, f64)> {
        [
            ("min_visits_for_promotion", self.min_visits_for_promotion),
            ("min_organic_conversion_for_promotion", self.min_organic_conversion_for_promotion),
            ("min_investment_for_pause", self.min_investment_for_pause),
            ("max_cvr_for_pause", self.max_cvr_for_pause),
            ("min_lost_share_budget_for_scale", self.min_lost_share_budget_for_scale),
            ("min_cvr_for_scale", self.min_cvr_for_scale),
            ("min_roas_for_scale", self.min_roas_for_scale),
            ("min_lost_share_ranking_for_acos_raise", self.min_lost_share_ranking_for_acos_raise),
            ("min_roas_for_acos_raise", self.min_roas_for_acos_raise),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a report error with its registry exit code.
    pub fn report(err: ReportError) -> Self {
        let code = report_exit_code(&err);
        let hint = match &err {
            ReportError::MissingColumn { field, .. } if field == "date" => {
                Some("this export has no date column; run with --mode consolidated".to_string())
            }
            ReportError::MissingColumn { .. } => {
                Some("check the header row index in [layout] of the report config".to_string())
            }
            ReportError::Empty { .. } => Some("re-export the file from the marketplace panel".to_string()),
            ReportError::ConfigParse(_) | ReportError::ConfigValidation(_) => {
                Some("adsgrid init-config prints a valid starting point".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReportError> for CliError {
    fn from(err: ReportError) -> Self {
        Self::report(err)
    }
}
