// CSV/TSV import and daily series export

use std::io::Read;
use std::path::Path;

use adsgrid_recon::model::{Cell, DailyPoint, SheetData, Tabular, WorkbookData};

/// Import a delimited export as a one-sheet workbook. The sheet is named after
/// the file stem so sheet keyword lookup still has something to match.
pub fn import(path: &Path) -> Result<WorkbookData, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string());
    let sheet = import_from_string(&name, &content, delimiter)?;
    Ok(WorkbookData::new(vec![sheet]))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins. When the sample has a
/// header line (split by some candidate, no digits), only candidates that split it compete:
/// decimal commas in numeric rows must not outvote the header's semicolons.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    // Exports open with title rows; sample past them.
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let header = sample_lines.iter().find(|line| {
        !line.bytes().any(|b| b.is_ascii_digit()) && candidates.iter().any(|&d| field_count(line, d) > 1)
    });

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        if header.is_some_and(|line| field_count(line, delim) <= 1) {
            continue;
        }
        let counts: Vec<usize> = sample_lines.iter().map(|line| field_count(line, delim)).collect();

        let widest = counts.iter().copied().max().unwrap_or(0);
        if widest <= 1 {
            continue;
        }

        // Score: (lines at the widest field count) * field count.
        let consistent = counts.iter().filter(|&&c| c == widest).count() as u64;
        let score = consistent * widest as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn import_from_string(name: &str, content: &str, delimiter: u8) -> Result<SheetData, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    // csv skips blank lines; re-insert them so header row indices match the
    // spreadsheet view of the file.
    let mut next_line = 1u64;
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        if let Some(pos) = record.position() {
            for _ in next_line..pos.line() {
                rows.push(Vec::new());
            }
            let embedded: u64 = record.iter().map(|f| f.matches('\n').count() as u64).sum();
            next_line = pos.line() + 1 + embedded;
        }
        rows.push(
            record
                .iter()
                .map(|field| if field.is_empty() { Cell::Empty } else { Cell::Text(field.to_string()) })
                .collect(),
        );
    }

    Ok(SheetData::new(name, rows))
}

/// Write the daily rollup as CSV, one row per date.
pub fn export_daily(points: &[DailyPoint], path: &Path) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    write_daily(&mut writer, points)?;
    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Same as [`export_daily`], into any writer (stdout for the CLI).
pub fn write_daily<W: std::io::Write>(writer: &mut csv::Writer<W>, points: &[DailyPoint]) -> Result<(), String> {
    writer.write_record(DailyPoint::columns()).map_err(|e| e.to_string())?;
    for point in points {
        let record: Vec<String> = point.cells().iter().map(Cell::display).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }
    Ok(())
}
