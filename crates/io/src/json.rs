// JSON export

use adsgrid_recon::model::ReportResult;

/// Render the full report result (meta, KPIs, every table, diagnostics) as
/// pretty-printed JSON in memory.
pub fn export_report(result: &ReportResult) -> Result<Vec<u8>, String> {
    serde_json::to_vec_pretty(result).map_err(|e| format!("Failed to serialize JSON report: {}", e))
}
