use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{RoasSource, ReportMode};

// ---------------------------------------------------------------------------
// Raw workbook (filled by adsgrid-io, consumed by the loaders)
// ---------------------------------------------------------------------------

/// A single spreadsheet cell as read from an export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as text. Integer-valued numbers drop the fractional
    /// part so numeric ids read back as `123`, not `123.0`.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Self::Bool(b) => if *b { "TRUE".into() } else { "FALSE".into() },
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Header texts at `header_row`, empty when the sheet is shorter.
    pub fn headers(&self, header_row: usize) -> Vec<String> {
        self.rows
            .get(header_row)
            .map(|row| row.iter().map(|c| c.display().trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// Rows below the header row, skipping rows with no content at all.
    pub fn data_rows(&self, header_row: usize) -> impl Iterator<Item = &[Cell]> {
        self.rows
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .map(Vec::as_slice)
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Cell::is_empty))
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkbookData {
    pub sheets: Vec<SheetData>,
}

impl WorkbookData {
    pub fn new(sheets: Vec<SheetData>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.sheets.iter().all(SheetData::is_blank)
    }
}

/// Which of the three uploads a record, report or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Organic,
    Campaign,
    Sponsored,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organic => write!(f, "organic"),
            Self::Campaign => write!(f, "campaign"),
            Self::Sponsored => write!(f, "sponsored"),
        }
    }
}

/// The three uploaded workbooks for one report run.
pub struct ReportInput {
    pub organic: WorkbookData,
    pub campaign: WorkbookData,
    pub sponsored: WorkbookData,
}

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganicListing {
    pub listing_id: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub variant: Option<String>,
    pub sku: Option<String>,
    pub visits: Option<f64>,
    pub units_sold_qty: Option<f64>,
    pub buyers: Option<f64>,
    pub units_sold: Option<f64>,
    pub gross_sales: Option<f64>,
    pub participation: Option<f64>,
    pub conversion_visits_to_sales: Option<f64>,
    pub conversion_visits_to_buyers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SponsoredAd {
    pub listing_id: Option<String>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub revenue: Option<f64>,
    pub investment: Option<f64>,
    pub attributed_sales: Option<f64>,
}

/// One campaign row per reporting granule (a day, or the whole period).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CampaignRecord {
    pub campaign_name: String,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub budget: Option<f64>,
    pub target_acos: Option<f64>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub revenue: Option<f64>,
    pub investment: Option<f64>,
    pub attributed_sales: Option<f64>,
    pub roas: Option<f64>,
    pub cvr: Option<f64>,
    pub lost_impression_share_budget: Option<f64>,
    pub lost_impression_share_ranking: Option<f64>,
}

/// One row per campaign; the unit the decision rules operate on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAggregate {
    pub campaign_name: String,
    pub status: Option<String>,
    pub budget: Option<f64>,
    pub target_acos: Option<f64>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub revenue: Option<f64>,
    pub investment: Option<f64>,
    pub attributed_sales: Option<f64>,
    pub roas: Option<f64>,
    pub cvr: Option<f64>,
    pub lost_impression_share_budget: Option<f64>,
    pub lost_impression_share_ranking: Option<f64>,
}

impl CampaignAggregate {
    /// Re-express an aggregate as a single-granule record (no date).
    pub fn to_record(&self) -> CampaignRecord {
        CampaignRecord {
            campaign_name: self.campaign_name.clone(),
            date: None,
            status: self.status.clone(),
            budget: self.budget,
            target_acos: self.target_acos,
            impressions: self.impressions,
            clicks: self.clicks,
            revenue: self.revenue,
            investment: self.investment,
            attributed_sales: self.attributed_sales,
            roas: self.roas,
            cvr: self.cvr,
            lost_impression_share_budget: self.lost_impression_share_budget,
            lost_impression_share_ranking: self.lost_impression_share_ranking,
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Pause,
    PromoteToAds,
    ScaleBudget,
    RaiseAcosTarget,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pause => write!(f, "PAUSE"),
            Self::PromoteToAds => write!(f, "PROMOTE_TO_ADS"),
            Self::ScaleBudget => write!(f, "SCALE_BUDGET"),
            Self::RaiseAcosTarget => write!(f, "RAISE_ACOS_TARGET"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAction {
    #[serde(flatten)]
    pub campaign: CampaignAggregate,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingAction {
    #[serde(flatten)]
    pub listing: OrganicListing,
    pub ad_code: String,
    pub action: Action,
}

// ---------------------------------------------------------------------------
// Summary + output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub investment_total: f64,
    pub revenue_total: f64,
    pub attributed_sales_total: f64,
    pub roas: f64,
    pub campaigns_unique: usize,
    pub sponsored_listings_unique: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: DailyTotals,
}

/// Per-day sums. Kept as a separate struct so it can be accumulated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub investment: f64,
    pub revenue: f64,
    pub attributed_sales: f64,
    pub clicks: f64,
    pub impressions: f64,
}

/// What happened while turning one workbook into canonical records.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub input: InputKind,
    pub sheet: String,
    pub sheet_fallback: bool,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub missing_fields: Vec<String>,
}

impl LoadReport {
    pub fn new(input: InputKind, sheet: &str, sheet_fallback: bool) -> Self {
        Self {
            input,
            sheet: sheet.to_string(),
            sheet_fallback,
            rows_read: 0,
            rows_kept: 0,
            rows_dropped: 0,
            missing_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub loads: Vec<LoadReport>,
    pub inactive_rules: Vec<Action>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub mode: ReportMode,
    pub roas_source: RoasSource,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    pub meta: ReportMeta,
    pub kpis: KpiSummary,
    pub pause: Vec<CampaignAction>,
    pub promote: Vec<ListingAction>,
    pub scale: Vec<CampaignAction>,
    pub raise_acos: Vec<CampaignAction>,
    pub campaigns: Vec<CampaignAggregate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyPoint>>,
    pub diagnostics: Diagnostics,
}

// ---------------------------------------------------------------------------
// Tabular rendering (sheet writers need fixed column lists)
// ---------------------------------------------------------------------------

/// A record that can be written as one spreadsheet row under fixed headers.
pub trait Tabular {
    fn columns() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

fn opt_num(v: Option<f64>) -> Cell {
    v.map(Cell::Number).unwrap_or(Cell::Empty)
}

fn opt_text(v: &Option<String>) -> Cell {
    v.as_deref().map(Cell::from).unwrap_or(Cell::Empty)
}

const CAMPAIGN_COLUMNS: &[&str] = &[
    "campaign_name",
    "status",
    "budget",
    "target_acos",
    "impressions",
    "clicks",
    "revenue",
    "investment",
    "attributed_sales",
    "roas",
    "cvr",
    "lost_impression_share_budget",
    "lost_impression_share_ranking",
];

const CAMPAIGN_ACTION_COLUMNS: &[&str] = &[
    "campaign_name",
    "status",
    "budget",
    "target_acos",
    "impressions",
    "clicks",
    "revenue",
    "investment",
    "attributed_sales",
    "roas",
    "cvr",
    "lost_impression_share_budget",
    "lost_impression_share_ranking",
    "action",
];

impl Tabular for CampaignAggregate {
    fn columns() -> &'static [&'static str] {
        CAMPAIGN_COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.campaign_name.clone()),
            opt_text(&self.status),
            opt_num(self.budget),
            opt_num(self.target_acos),
            opt_num(self.impressions),
            opt_num(self.clicks),
            opt_num(self.revenue),
            opt_num(self.investment),
            opt_num(self.attributed_sales),
            opt_num(self.roas),
            opt_num(self.cvr),
            opt_num(self.lost_impression_share_budget),
            opt_num(self.lost_impression_share_ranking),
        ]
    }
}

impl Tabular for CampaignAction {
    fn columns() -> &'static [&'static str] {
        CAMPAIGN_ACTION_COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.campaign.cells();
        cells.push(Cell::Text(self.action.to_string()));
        cells
    }
}

impl Tabular for ListingAction {
    fn columns() -> &'static [&'static str] {
        &[
            "listing_id",
            "title",
            "status",
            "variant",
            "sku",
            "visits",
            "units_sold_qty",
            "buyers",
            "units_sold",
            "gross_sales",
            "participation",
            "conversion_visits_to_sales",
            "conversion_visits_to_buyers",
            "ad_code",
            "action",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        let l = &self.listing;
        vec![
            Cell::Text(l.listing_id.clone()),
            opt_text(&l.title),
            opt_text(&l.status),
            opt_text(&l.variant),
            opt_text(&l.sku),
            opt_num(l.visits),
            opt_num(l.units_sold_qty),
            opt_num(l.buyers),
            opt_num(l.units_sold),
            opt_num(l.gross_sales),
            opt_num(l.participation),
            opt_num(l.conversion_visits_to_sales),
            opt_num(l.conversion_visits_to_buyers),
            Cell::Text(self.ad_code.clone()),
            Cell::Text(self.action.to_string()),
        ]
    }
}

impl Tabular for KpiSummary {
    fn columns() -> &'static [&'static str] {
        &[
            "investment_total",
            "revenue_total",
            "attributed_sales_total",
            "roas",
            "campaigns_unique",
            "sponsored_listings_unique",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Number(self.investment_total),
            Cell::Number(self.revenue_total),
            Cell::Number(self.attributed_sales_total),
            Cell::Number(self.roas),
            Cell::Number(self.campaigns_unique as f64),
            Cell::Number(self.sponsored_listings_unique as f64),
        ]
    }
}

impl Tabular for DailyPoint {
    fn columns() -> &'static [&'static str] {
        &["date", "investment", "revenue", "attributed_sales", "clicks", "impressions"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.date),
            Cell::Number(self.totals.investment),
            Cell::Number(self.totals.revenue),
            Cell::Number(self.totals.attributed_sales),
            Cell::Number(self.totals.clicks),
            Cell::Number(self.totals.impressions),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_numbers_display_without_fraction() {
        assert_eq!(Cell::Number(123.0).display(), "123");
        assert_eq!(Cell::Number(1.5).display(), "1.5");
        assert_eq!(Cell::Text(" x ".into()).display(), " x ");
    }

    #[test]
    fn blank_text_counts_as_empty() {
        assert!(Cell::Text("   ".into()).is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn data_rows_skip_header_and_blank_rows() {
        let sheet = SheetData::new(
            "s",
            vec![
                vec![Cell::from("title row")],
                vec![Cell::from("Name"), Cell::from("Value")],
                vec![Cell::from("a"), Cell::Number(1.0)],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::from("b"), Cell::Number(2.0)],
            ],
        );
        assert_eq!(sheet.headers(1), vec!["Name", "Value"]);
        assert_eq!(sheet.data_rows(1).count(), 2);
    }

    #[test]
    fn campaign_action_row_matches_columns() {
        let agg = CampaignAggregate {
            campaign_name: "A".into(),
            status: None,
            budget: Some(10.0),
            target_acos: None,
            impressions: None,
            clicks: None,
            revenue: None,
            investment: Some(110.0),
            attributed_sales: Some(0.0),
            roas: None,
            cvr: None,
            lost_impression_share_budget: None,
            lost_impression_share_ranking: None,
        };
        let action = CampaignAction { campaign: agg, action: Action::Pause };
        let cells = action.cells();
        assert_eq!(cells.len(), CampaignAction::columns().len());
        assert_eq!(cells.last(), Some(&Cell::Text("PAUSE".into())));
    }
}
