// File I/O operations

pub mod csv;
pub mod json;
pub mod xlsx;

use std::path::Path;

use adsgrid_recon::model::WorkbookData;

/// Import any supported export by extension. Zero-length files come back as
/// an empty workbook so the engine can name the input that is empty.
pub fn import_any(path: &Path) -> Result<WorkbookData, String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if meta.len() == 0 {
        log::warn!("{} is empty", path.display());
        return Ok(WorkbookData::default());
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "tsv" | "txt" => crate::csv::import(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => {
            let (workbook, stats) = xlsx::import(path)?;
            log::info!("{}: {}", path.display(), stats.summary());
            Ok(workbook)
        }
        other => Err(format!(
            "unsupported file type '.{}' (expected xlsx, xls, xlsb, ods, csv or tsv)",
            other
        )),
    }
}

/// Write each rendered artifact to its path. If any write fails, the files
/// already written by this call are removed.
pub fn write_outputs(files: &[(&Path, &[u8])]) -> Result<(), String> {
    for (i, (path, bytes)) in files.iter().enumerate() {
        if let Err(e) = std::fs::write(path, bytes) {
            for (written, _) in &files[..i] {
                if let Err(cleanup) = std::fs::remove_file(written) {
                    log::warn!("could not remove {}: {}", written.display(), cleanup);
                }
            }
            return Err(format!("Failed to write {}: {}", path.display(), e));
        }
        log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}
