use super::snapshot::FormSnapshot;
use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const INVALID_URL_MESSAGE: &str =
    "Invalid URL. Please enter a valid URL starting with http:// or https://";

pub const DEFAULT_TITLE_BASE: &str = "incident-alert";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlWarning {
    pub field: String,
    pub value: String,
    pub message: String,
}

/// An absolute http(s) URL. Empty input is not checked.
pub fn check_url(raw: &str) -> Result<(), &'static str> {
    match Url::parse(raw.trim()) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(()),
        _ => Err(INVALID_URL_MESSAGE),
    }
}

/// Report and evidence URLs that fail [`check_url`]. Advisory only.
pub fn url_warnings(snapshot: &FormSnapshot) -> Vec<UrlWarning> {
    let mut out = Vec::new();
    for (i, e) in snapshot.evidence.iter().enumerate() {
        for (field, value) in [("reportUrl", &e.report_url), ("evidenceUrl", &e.evidence_url)] {
            if value.trim().is_empty() {
                continue;
            }
            if let Err(message) = check_url(value) {
                out.push(UrlWarning {
                    field: format!("evidence[{}].{}", i, field),
                    value: value.clone(),
                    message: message.to_string(),
                });
            }
        }
    }
    out
}

/// Lowercased title with every non-alphanumeric character replaced by `-`.
/// A title with no alphanumerics at all yields [`DEFAULT_TITLE_BASE`].
pub fn sanitize_title(title: &str) -> String {
    sanitize_or(title, DEFAULT_TITLE_BASE)
}

pub fn sanitize_or(title: &str, fallback: &str) -> String {
    if !title.chars().any(|c| c.is_ascii_alphanumeric()) {
        return fallback.to_string();
    }
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Checks a spreadsheet link before anything is opened or fetched.
pub fn validate_sheets_url(raw: &str) -> CoreResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Please enter a Google Sheets URL".to_string(),
        ));
    }
    let url = Url::parse(trimmed).map_err(|_| {
        CoreError::Validation("Please enter a valid URL".to_string())
    })?;
    if !trimmed.contains("docs.google.com/spreadsheets") {
        return Err(CoreError::Validation(
            "Please enter a valid Google Sheets URL (must contain docs.google.com/spreadsheets)"
                .to_string(),
        ));
    }
    Ok(url)
}

pub fn spreadsheet_id(url: &str) -> Option<String> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").ok())
        .as_ref()?;
    re.captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
