//! Header and sheet lookup by normalized keywords.
//!
//! Export headers drift between releases and locales ("Orçamento" vs
//! "Orcamento", line breaks inside headers, English exports). Matching is done
//! on accent-stripped, lower-cased text: a header matches when every keyword
//! is a substring of it.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// NFKD-decompose, drop combining marks, lower-case, trim.
pub fn normalize(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

fn matches_all(normalized: &str, keywords: &[&str]) -> bool {
    keywords.iter().all(|kw| normalized.contains(&normalize(kw)))
}

/// Index of the first header containing every keyword, in column order.
pub fn resolve<S: AsRef<str>>(headers: &[S], keywords: &[&str]) -> Option<usize> {
    resolve_excluding(headers, keywords, &[])
}

/// Like [`resolve`], but headers containing any `excluded` keyword never match.
pub fn resolve_excluding<S: AsRef<str>>(
    headers: &[S],
    keywords: &[&str],
    excluded: &[&str],
) -> Option<usize> {
    if keywords.is_empty() {
        return None;
    }
    headers.iter().position(|h| {
        let n = normalize(h.as_ref());
        matches_all(&n, keywords) && !excluded.iter().any(|ex| n.contains(&normalize(ex)))
    })
}

/// Index of the first sheet whose name contains every keyword.
pub fn find_sheet<S: AsRef<str>>(names: &[S], keywords: &[&str]) -> Option<usize> {
    resolve(names, keywords)
}

/// Try each keyword set in turn; fall back to the first sheet.
/// Returns `(index, fell_back)`.
pub fn pick_sheet<S: AsRef<str>>(names: &[S], alternatives: &[&[&str]]) -> (usize, bool) {
    alternatives
        .iter()
        .find_map(|kws| find_sheet(names, kws))
        .map(|idx| (idx, false))
        .unwrap_or((0, true))
}

/// How to find one canonical field among an export's headers.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    /// Canonical field name, used in diagnostics.
    pub field: &'static str,
    /// Keyword sets tried in order; the first that resolves wins.
    pub any_of: &'static [&'static [&'static str]],
    /// Headers containing any of these never match.
    pub none_of: &'static [&'static str],
}

impl ColumnSpec {
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Option<usize> {
        let found = self
            .any_of
            .iter()
            .find_map(|kws| resolve_excluding(headers, kws, self.none_of));
        match found {
            Some(idx) => log::debug!(
                "column '{}' -> '{}' (#{idx})",
                self.field,
                headers[idx].as_ref().replace('\n', " ")
            ),
            None => log::debug!("column '{}' not found", self.field),
        }
        found
    }

    /// True when `text` itself looks like this column's header label.
    pub fn is_header_label(&self, text: &str) -> bool {
        let n = normalize(text);
        !n.is_empty()
            && self.any_of.iter().any(|kws| matches_all(&n, kws))
            && !self.none_of.iter().any(|ex| n.contains(&normalize(ex)))
    }
}
