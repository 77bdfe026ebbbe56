//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Invalid report config                                |
//! | 4    | An input file cannot be opened or parsed             |
//! | 5    | An input file is empty                               |
//! | 6    | A column the report cannot run without is missing    |
//! | 7    | Writing the report failed                            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`report_exit_code`] if it comes from the engine

use adsgrid_recon::ReportError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file fails to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input is not a readable workbook (corrupt, wrong format, missing file).
pub const EXIT_UNREADABLE_INPUT: u8 = 4;

/// Input file has no content.
pub const EXIT_EMPTY_INPUT: u8 = 5;

/// Campaign name, or the date column in daily mode, cannot be resolved.
pub const EXIT_MISSING_COLUMN: u8 = 6;

/// Report workbook, JSON or CSV could not be written.
pub const EXIT_EXPORT: u8 = 7;

/// Map an engine error to its exit code.
pub fn report_exit_code(err: &ReportError) -> u8 {
    match err {
        ReportError::ConfigParse(_) | ReportError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReportError::Unreadable { .. } => EXIT_UNREADABLE_INPUT,
        ReportError::Empty { .. } => EXIT_EMPTY_INPUT,
        ReportError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReportError::Export(_) => EXIT_EXPORT,
    }
}
