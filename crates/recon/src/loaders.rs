//! Schema loaders: raw export sheets -> canonical records.
//!
//! Every field is located through [`ColumnSpec`] keyword sets. A field that
//! cannot be found is recorded in the [`LoadReport`] and left as `None` on
//! every record; only the campaign name (and the date in daily mode) is fatal.

use std::collections::HashSet;

use crate::coerce::{strip_marketplace_prefix, to_date, to_number, to_text, NumberKind};
use crate::config::{ReportConfig, ReportMode};
use crate::error::ReportError;
use crate::model::{
    CampaignRecord, Cell, InputKind, LoadReport, OrganicListing, SheetData, SponsoredAd, WorkbookData,
};
use crate::resolve::{pick_sheet, ColumnSpec};

// ---------------------------------------------------------------------------
// Column specs
// ---------------------------------------------------------------------------

/// Organic export fields, in the order of its fixed 13-column layout.
const ORGANIC_COLUMNS: [ColumnSpec; 13] = [
    ColumnSpec { field: "listing_id", any_of: &[&["id", "anuncio"], &["listing", "id"], &["item", "id"]], none_of: &[] },
    ColumnSpec { field: "title", any_of: &[&["titulo"], &["title"]], none_of: &[] },
    ColumnSpec { field: "status", any_of: &[&["status"], &["estado"]], none_of: &[] },
    ColumnSpec { field: "variant", any_of: &[&["variac"], &["variant"]], none_of: &[] },
    ColumnSpec { field: "sku", any_of: &[&["sku"]], none_of: &[] },
    ColumnSpec { field: "visits", any_of: &[&["visitas", "unica"], &["visitas"], &["visits"]], none_of: &["conversao", "conversion"] },
    ColumnSpec { field: "units_sold_qty", any_of: &[&["qtd", "venda"], &["quantidade", "venda"], &["quantity", "sold"]], none_of: &[] },
    ColumnSpec { field: "buyers", any_of: &[&["compradores"], &["buyers"]], none_of: &["conversao", "conversion"] },
    ColumnSpec { field: "units_sold", any_of: &[&["unidades", "vend"], &["units", "sold"]], none_of: &[] },
    ColumnSpec { field: "gross_sales", any_of: &[&["vendas", "bruta"], &["gross", "sales"]], none_of: &[] },
    ColumnSpec { field: "participation", any_of: &[&["participa"], &["share"]], none_of: &[] },
    ColumnSpec { field: "conversion_visits_to_sales", any_of: &[&["conversao", "vendas"], &["conversion", "sales"]], none_of: &[] },
    ColumnSpec { field: "conversion_visits_to_buyers", any_of: &[&["conversao", "compradores"], &["conversion", "buyers"]], none_of: &[] },
];

const SPONSORED_AD_CODE: ColumnSpec =
    ColumnSpec { field: "ad_code", any_of: &[&["codigo", "anuncio"], &["ad", "code"], &["item", "id"]], none_of: &[] };

const SPONSORED_METRICS: [ColumnSpec; 5] = [
    ColumnSpec { field: "impressions", any_of: &[&["impresso"], &["impressions"]], none_of: &["perdidas", "lost"] },
    ColumnSpec { field: "clicks", any_of: &[&["cliques"], &["clicks"]], none_of: &["custo", "cost"] },
    ColumnSpec { field: "revenue", any_of: &[&["receita"], &["revenue"]], none_of: &[] },
    ColumnSpec { field: "investment", any_of: &[&["investimento"], &["investment"], &["spend"]], none_of: &[] },
    ColumnSpec { field: "attributed_sales", any_of: &[&["vendas", "public"], &["attributed", "sales"], &["ad", "sales"]], none_of: &["receita", "revenue"] },
];

const CAMPAIGN_NAME: ColumnSpec =
    ColumnSpec { field: "campaign_name", any_of: &[&["nome"], &["campaign", "name"], &["campanha"]], none_of: &[] };
const CAMPAIGN_DATE: ColumnSpec =
    ColumnSpec { field: "date", any_of: &[&["desde"], &["date"], &["data"]], none_of: &[] };
const CAMPAIGN_STATUS: ColumnSpec =
    ColumnSpec { field: "status", any_of: &[&["status"], &["estado"]], none_of: &[] };

/// Campaign numeric fields, in the same order as [`CampaignNumbers`].
const CAMPAIGN_METRICS: [(ColumnSpec, NumberKind); 11] = [
    (ColumnSpec { field: "budget", any_of: &[&["orcamento"], &["budget"]], none_of: &["perdidas", "lost"] }, NumberKind::Plain),
    (ColumnSpec { field: "target_acos", any_of: &[&["acos", "objetivo"], &["target", "acos"]], none_of: &[] }, NumberKind::Ratio),
    (ColumnSpec { field: "impressions", any_of: &[&["impresso"], &["impressions"]], none_of: &["perdidas", "lost"] }, NumberKind::Plain),
    (ColumnSpec { field: "clicks", any_of: &[&["cliques"], &["clicks"]], none_of: &["custo", "cost"] }, NumberKind::Plain),
    (ColumnSpec { field: "revenue", any_of: &[&["receita"], &["revenue"]], none_of: &[] }, NumberKind::Plain),
    (ColumnSpec { field: "investment", any_of: &[&["investimento"], &["investment"], &["spend"]], none_of: &[] }, NumberKind::Plain),
    (ColumnSpec { field: "attributed_sales", any_of: &[&["vendas", "public"], &["attributed", "sales"], &["ad", "sales"]], none_of: &["receita", "revenue"] }, NumberKind::Plain),
    (ColumnSpec { field: "roas", any_of: &[&["roas"]], none_of: &[] }, NumberKind::Ratio),
    (ColumnSpec { field: "cvr", any_of: &[&["cvr"], &["conversion", "rate"]], none_of: &[] }, NumberKind::Ratio),
    (ColumnSpec { field: "lost_impression_share_budget", any_of: &[&["perdidas", "orcamento"], &["lost", "budget"]], none_of: &[] }, NumberKind::PercentPoints),
    (ColumnSpec { field: "lost_impression_share_ranking", any_of: &[&["perdidas", "classificacao"], &["lost", "rank"]], none_of: &[] }, NumberKind::PercentPoints),
];

const ORGANIC_SHEET: &[&[&str]] = &[&["publicac"], &["listing"]];
const SPONSORED_SHEET: &[&[&str]] = &[&["anuncios", "patrocinados"], &["sponsored", "ads"]];
const CAMPAIGN_SHEET: &[&[&str]] = &[&["campanha"], &["campaign"]];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cell(row: &[Cell], idx: Option<usize>) -> &Cell {
    const EMPTY: &Cell = &Cell::Empty;
    idx.and_then(|i| row.get(i)).unwrap_or(EMPTY)
}

/// Pick the sheet for `input`; a blank workbook is a structural failure.
fn select_sheet<'a>(
    workbook: &'a WorkbookData,
    input: InputKind,
    alternatives: &[&[&str]],
) -> Result<(&'a SheetData, LoadReport), ReportError> {
    if workbook.sheets.is_empty() || workbook.is_blank() {
        return Err(ReportError::Empty { input });
    }
    let names = workbook.sheet_names();
    let (idx, fell_back) = pick_sheet(&names, alternatives);
    let sheet = &workbook.sheets[idx];
    if fell_back && workbook.sheets.len() > 1 {
        log::warn!("{input} report: no sheet matched, using first sheet '{}'", sheet.name);
    } else {
        log::debug!("{input} report: using sheet '{}'", sheet.name);
    }
    Ok((sheet, LoadReport::new(input, &sheet.name, fell_back)))
}

fn resolve_or_note(spec: &ColumnSpec, headers: &[String], report: &mut LoadReport) -> Option<usize> {
    let idx = spec.resolve(headers);
    if idx.is_none() {
        log::warn!("{} report: column '{}' not found, field left empty", report.input, spec.field);
        report.missing_fields.push(spec.field.to_string());
    }
    idx
}

// ---------------------------------------------------------------------------
// Organic
// ---------------------------------------------------------------------------

pub fn load_organic(
    workbook: &WorkbookData,
    config: &ReportConfig,
) -> Result<(Vec<OrganicListing>, LoadReport), ReportError> {
    let (sheet, mut report) = select_sheet(workbook, InputKind::Organic, ORGANIC_SHEET)?;
    let header_row = config.layout.organic_header_row;
    let headers = sheet.headers(header_row);
    let fixed_layout = headers.len() >= ORGANIC_COLUMNS.len();

    let mut idx = [None; 13];
    for (pos, spec) in ORGANIC_COLUMNS.iter().enumerate() {
        idx[pos] = spec.resolve(&headers).or_else(|| {
            if fixed_layout {
                log::debug!("organic report: column '{}' taken by position #{pos}", spec.field);
                Some(pos)
            } else {
                None
            }
        });
        if idx[pos].is_none() {
            report.missing_fields.push(spec.field.to_string());
        }
    }
    if !report.missing_fields.is_empty() {
        log::warn!("organic report: fields not found: {}", report.missing_fields.join(", "));
    }

    let id_spec = &ORGANIC_COLUMNS[0];
    let id_header = idx[0].and_then(|i| headers.get(i)).cloned().unwrap_or_default();
    let num = |row: &[Cell], pos: usize, kind: NumberKind| to_number(cell(row, idx[pos]), kind);
    let txt = |row: &[Cell], pos: usize| to_text(cell(row, idx[pos]));

    let mut seen = HashSet::new();
    let mut listings = Vec::new();
    for row in sheet.data_rows(header_row) {
        report.rows_read += 1;
        let raw_id = cell(row, idx[0]).display();
        let raw_id = raw_id.trim();
        if raw_id.is_empty()
            || id_spec.is_header_label(raw_id)
            || crate::resolve::normalize(raw_id) == crate::resolve::normalize(&id_header)
        {
            report.rows_dropped += 1;
            continue;
        }
        let listing_id = strip_marketplace_prefix(raw_id, &config.marketplace_prefix);
        if !seen.insert(listing_id.clone()) {
            log::debug!("organic report: duplicate listing '{listing_id}' ignored");
            report.rows_dropped += 1;
            continue;
        }

        listings.push(OrganicListing {
            listing_id,
            title: txt(row, 1),
            status: txt(row, 2),
            variant: txt(row, 3),
            sku: txt(row, 4),
            visits: num(row, 5, NumberKind::Plain),
            units_sold_qty: num(row, 6, NumberKind::Plain),
            buyers: num(row, 7, NumberKind::Plain),
            units_sold: num(row, 8, NumberKind::Plain),
            gross_sales: num(row, 9, NumberKind::Plain),
            participation: num(row, 10, NumberKind::Ratio),
            conversion_visits_to_sales: num(row, 11, NumberKind::Ratio),
            conversion_visits_to_buyers: num(row, 12, NumberKind::Ratio),
        });
    }

    report.rows_kept = listings.len();
    log::info!(
        "organic report: {} listing(s) from sheet '{}' ({} row(s) dropped)",
        report.rows_kept,
        report.sheet,
        report.rows_dropped
    );
    Ok((listings, report))
}

// ---------------------------------------------------------------------------
// Sponsored
// ---------------------------------------------------------------------------

pub fn load_sponsored(
    workbook: &WorkbookData,
    config: &ReportConfig,
) -> Result<(Vec<SponsoredAd>, LoadReport), ReportError> {
    let (sheet, mut report) = select_sheet(workbook, InputKind::Sponsored, SPONSORED_SHEET)?;
    let header_row = config.layout.sponsored_header_row;
    let headers = sheet.headers(header_row);

    let code_idx = resolve_or_note(&SPONSORED_AD_CODE, &headers, &mut report);
    let metric_idx: Vec<Option<usize>> = SPONSORED_METRICS
        .iter()
        .map(|spec| resolve_or_note(spec, &headers, &mut report))
        .collect();
    let num = |row: &[Cell], pos: usize| to_number(cell(row, metric_idx[pos]), NumberKind::Plain);

    let mut ads = Vec::new();
    for row in sheet.data_rows(header_row) {
        report.rows_read += 1;
        let listing_id = to_text(cell(row, code_idx))
            .filter(|code| !SPONSORED_AD_CODE.is_header_label(code))
            .map(|code| strip_marketplace_prefix(&code, &config.marketplace_prefix));
        ads.push(SponsoredAd {
            listing_id,
            impressions: num(row, 0),
            clicks: num(row, 1),
            revenue: num(row, 2),
            investment: num(row, 3),
            attributed_sales: num(row, 4),
        });
    }

    report.rows_kept = ads.len();
    log::info!("sponsored report: {} ad row(s) from sheet '{}'", report.rows_kept, report.sheet);
    Ok((ads, report))
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Load the campaign export. `mode` decides whether a date column is required.
pub fn load_campaigns(
    workbook: &WorkbookData,
    config: &ReportConfig,
    mode: ReportMode,
) -> Result<(Vec<CampaignRecord>, LoadReport), ReportError> {
    let (sheet, mut report) = select_sheet(workbook, InputKind::Campaign, CAMPAIGN_SHEET)?;
    let header_row = config.layout.campaign_header_row;
    let headers = sheet.headers(header_row);

    let name_idx = CAMPAIGN_NAME.resolve(&headers).ok_or_else(|| ReportError::MissingColumn {
        input: InputKind::Campaign,
        field: CAMPAIGN_NAME.field.into(),
    })?;
    let date_idx = match mode {
        ReportMode::Daily => Some(CAMPAIGN_DATE.resolve(&headers).ok_or_else(|| {
            ReportError::MissingColumn {
                input: InputKind::Campaign,
                field: CAMPAIGN_DATE.field.into(),
            }
        })?),
        ReportMode::Consolidated => None,
    };
    let status_idx = resolve_or_note(&CAMPAIGN_STATUS, &headers, &mut report);
    let metric_idx: Vec<Option<usize>> = CAMPAIGN_METRICS
        .iter()
        .map(|(spec, _)| resolve_or_note(spec, &headers, &mut report))
        .collect();

    let mut records = Vec::new();
    let mut missing_dates = 0usize;
    for row in sheet.data_rows(header_row) {
        report.rows_read += 1;
        let Some(campaign_name) = to_text(cell(row, Some(name_idx))) else {
            report.rows_dropped += 1;
            continue;
        };
        if campaign_name == headers[name_idx] {
            report.rows_dropped += 1;
            continue;
        }
        let date = date_idx.and_then(|i| to_date(cell(row, Some(i))));
        if date_idx.is_some() && date.is_none() {
            missing_dates += 1;
        }

        let n: Vec<Option<f64>> = CAMPAIGN_METRICS
            .iter()
            .zip(&metric_idx)
            .map(|((_, kind), idx)| to_number(cell(row, *idx), *kind))
            .collect();

        records.push(CampaignRecord {
            campaign_name,
            date,
            status: to_text(cell(row, status_idx)),
            budget: n[0],
            target_acos: n[1],
            impressions: n[2],
            clicks: n[3],
            revenue: n[4],
            investment: n[5],
            attributed_sales: n[6],
            roas: n[7],
            cvr: n[8],
            lost_impression_share_budget: n[9],
            lost_impression_share_ranking: n[10],
        });
    }

    if missing_dates > 0 {
        log::warn!("campaign report: {missing_dates} row(s) with an unreadable date");
    }
    report.rows_kept = records.len();
    log::info!(
        "campaign report ({mode}): {} row(s) from sheet '{}'",
        report.rows_kept,
        report.sheet
    );
    Ok((records, report))
}
