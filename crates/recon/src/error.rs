use std::fmt;

use crate::model::InputKind;

#[derive(Debug)]
pub enum ReportError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (negative threshold, bad header row, etc.).
    ConfigValidation(String),
    /// An input could not be opened or parsed as a workbook.
    Unreadable { input: InputKind, message: String },
    /// An input file or workbook has no content.
    Empty { input: InputKind },
    /// A column the report cannot run without is not resolvable.
    MissingColumn { input: InputKind, field: String },
    /// Writing an output artifact (workbook, JSON, CSV) failed.
    Export(String),
}

impl ReportError {
    pub fn input(&self) -> Option<InputKind> {
        match self {
            Self::Unreadable { input, .. } | Self::Empty { input } | Self::MissingColumn { input, .. } => {
                Some(*input)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Unreadable { input, message } => {
                write!(f, "{input} report: cannot read workbook: {message}")
            }
            Self::Empty { input } => write!(f, "{input} report: file is empty"),
            Self::MissingColumn { input, field } => {
                write!(f, "{input} report: required column '{field}' not found")
            }
            Self::Export(msg) => write!(f, "export error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_input() {
        let err = ReportError::Empty { input: InputKind::Sponsored };
        assert_eq!(err.to_string(), "sponsored report: file is empty");
        assert_eq!(err.input(), Some(InputKind::Sponsored));

        let err = ReportError::MissingColumn {
            input: InputKind::Campaign,
            field: "date".into(),
        };
        assert!(err.to_string().contains("'date'"));
        assert!(ReportError::Export("x".into()).input().is_none());
    }
}
