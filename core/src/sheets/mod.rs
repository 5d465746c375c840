//! Google Sheets import: the user edits the sheet in their own browser, then
//! the normalized rows are fetched from the sheets data service and merged
//! into a URL list. The same service fills empty domain or channel columns
//! and archives URLs in place, once the sheet is shared with it for writing.

use crate::config::NetworkConfig;
use crate::error::{CoreError, CoreResult};
use crate::form::validate::{spreadsheet_id, validate_sheets_url};
use crate::state::{AppState, MergeReport, UrlKind, UrlRecord};
use crate::transport::{parse_url, HttpResponse, HttpTransport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DATA_PATH: &str = "google-sheets/data-for-url";
pub const PERMISSIONS_PATH: &str = "google-sheets/check-permissions";
pub const EXTRACT_DOMAINS_PATH: &str = "google-sheets/extract-domains";
pub const EXTRACT_CHANNELS_PATH: &str = "google-sheets/extract-channels";
pub const ARCHIVE_PATH: &str = "google-sheets/archive-urls";

pub const NO_WRITE_ACCESS: &str = "The sheets service cannot edit this Google Sheet. Share it with the service account as an editor and try again.";

/// The external editing step. `open` shows the sheet to the user; `confirm`
/// returns once they are done, `false` meaning they backed out.
pub trait SheetEditor {
    fn open(&mut self, sheet_url: &Url) -> CoreResult<()>;
    fn confirm(&mut self, sheet_url: &Url) -> CoreResult<bool>;
}

#[derive(Debug, Default, Deserialize)]
pub struct SheetsPayload {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BadRequest {
    message: Option<String>,
    #[serde(default)]
    detail: Option<BadRequestDetail>,
}

#[derive(Debug, Deserialize)]
struct BadRequestDetail {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PermissionReply {
    has_permission: bool,
}

/// Outcome of filling the empty domain or channel column of a sheet.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub total_records: u64,
    pub processed_count: u64,
    pub extracted_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub success_rate: f64,
    pub message: Option<String>,
}

impl ExtractionSummary {
    pub fn report(&self, kind: UrlKind) -> String {
        let noun = match kind {
            UrlKind::Trusted => "Domain",
            UrlKind::Malicious => "Channel",
        };
        let mut out = match &self.message {
            Some(m) => m.clone(),
            None => format!("{} extraction completed", noun),
        };
        out.push_str(&format!("\n\nTotal records: {}\n", self.total_records));
        if self.processed_count > 0 {
            out.push_str(&format!("URLs processed: {}\n", self.processed_count));
            out.push_str(&format!("{}s extracted: {}\n", noun, self.extracted_count));
            if self.failed_count > 0 {
                out.push_str(&format!("Failed extractions: {}\n", self.failed_count));
            }
            if self.skipped_count > 0 {
                out.push_str(&format!("Skipped (already processed): {}\n", self.skipped_count));
            }
            out.push_str(&format!("Success rate: {:.1}%", self.success_rate));
        } else if self.skipped_count > 0 {
            out.push_str(&format!("All {} URLs were already processed", self.skipped_count));
        }
        out
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub total_records: u64,
    pub archived_count: u64,
    pub message: Option<String>,
}

impl ArchiveSummary {
    pub fn report(&self) -> String {
        format!(
            "{}\n\nTotal records processed: {}\nURLs archived: {}",
            self.message.as_deref().unwrap_or("Archive completed"),
            self.total_records,
            self.archived_count
        )
    }
}

fn bad_request_detail(body: &[u8]) -> Option<String> {
    let b = serde_json::from_slice::<BadRequest>(body).ok()?;
    b.detail.and_then(|d| d.message).or(b.message)
}

/// The sheet URL as the service expects it: the `#gid=` fragment is dropped,
/// query parameters are kept.
pub fn service_sheet_url(sheet_url: &Url) -> Url {
    let mut clean = sheet_url.clone();
    clean.set_fragment(None);
    clean
}

/// User-facing text for a non-2xx reply from the data service.
pub fn status_message(resp: &HttpResponse) -> String {
    match resp.status {
        401 => "Authentication required. Please check your API credentials.".to_string(),
        403 => "Permission denied. Please ensure the Google Sheet is shared with the service account or is publicly accessible.".to_string(),
        404 => "Google Sheets endpoint not found. Please check the server is running.".to_string(),
        400 => {
            let detail = bad_request_detail(&resp.body)
                .unwrap_or_else(|| "Please check the Google Sheets URL".to_string());
            format!("Invalid request: {}", detail)
        }
        s => format!("Server error: {}", s),
    }
}

fn field(row: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|n| match row.get(*n) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Maps one sheet row onto the fields `kind` keeps.
pub fn record_from_row(row: &Map<String, Value>, kind: UrlKind) -> UrlRecord {
    let mut record = UrlRecord {
        url: field(row, &["URL", "url"]),
        archive_url: field(row, &["Archive URL", "archiveUrl", "archive_url"]),
        is_from_google_sheets: true,
        ..UrlRecord::default()
    };
    match kind {
        UrlKind::Trusted => record.domain = field(row, &["Domain", "domain"]),
        UrlKind::Malicious => record.channel = field(row, &["Channel", "channel"]),
    }
    record
}

pub struct SheetsClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    timeout: Duration,
}

impl<T: HttpTransport> SheetsClient<T> {
    pub fn new(transport: T, cfg: &NetworkConfig) -> Self {
        Self {
            transport,
            base_url: cfg.sheets_base_url.trim_end_matches('/').to_string(),
            timeout: cfg.sheets_timeout(),
        }
    }

    fn service_url(&self, path: &str, sheet_url: &Url) -> CoreResult<Url> {
        let mut url = parse_url(&format!("{}/{}", self.base_url, path), "sheets service")?;
        url.query_pairs_mut().append_pair("url", sheet_url.as_str());
        Ok(url)
    }

    pub fn data_url(&self, sheet_url: &Url) -> CoreResult<Url> {
        self.service_url(DATA_PATH, sheet_url)
    }

    pub fn fetch(&self, sheet_url: &Url) -> CoreResult<SheetsPayload> {
        let resp = self.transport.get(&self.data_url(sheet_url)?, self.timeout)?;
        if !resp.is_success() {
            return Err(CoreError::Network(status_message(&resp)));
        }
        resp.json()
    }

    /// Whether the service account may write to the sheet. A 403 from the
    /// service means the sheet is not shared with it; other failures are
    /// errors.
    pub fn check_write_permission(&self, sheet_url: &Url) -> CoreResult<bool> {
        let mut url = self.service_url(PERMISSIONS_PATH, &service_sheet_url(sheet_url))?;
        url.query_pairs_mut().append_pair("checkWrite", "true");
        let resp = self.transport.get(&url, self.timeout)?;
        match resp.status {
            403 => Ok(false),
            _ if resp.is_success() => Ok(resp.json::<PermissionReply>()?.has_permission),
            s => Err(CoreError::Network(format!("Permission check failed: {}", s))),
        }
    }

    fn require_write(&self, sheet_url: &Url) -> CoreResult<()> {
        if self.check_write_permission(sheet_url)? {
            Ok(())
        } else {
            Err(CoreError::PolicyBlocked(NO_WRITE_ACCESS.to_string()))
        }
    }

    /// Asks the service to fill the empty domain (trusted) or channel
    /// (malicious) cells of the sheet from each row's URL.
    pub fn extract_unspecified(
        &self,
        kind: UrlKind,
        sheet_url: &Url,
    ) -> CoreResult<ExtractionSummary> {
        self.require_write(sheet_url)?;
        let path = match kind {
            UrlKind::Trusted => EXTRACT_DOMAINS_PATH,
            UrlKind::Malicious => EXTRACT_CHANNELS_PATH,
        };
        let url = self.service_url(path, &service_sheet_url(sheet_url))?;
        let resp = self
            .transport
            .post_json(&url, &Value::Object(Map::new()), None, self.timeout)?;
        match resp.status {
            400 => Err(CoreError::Network(bad_request_detail(&resp.body).unwrap_or_else(
                || "Bad request - please check the Google Sheets URL".to_string(),
            ))),
            404 if kind == UrlKind::Malicious => Err(CoreError::Network(
                "Extract channels endpoint not found on the sheets service".to_string(),
            )),
            _ if resp.is_success() => {
                let summary: ExtractionSummary = resp.json()?;
                info!(
                    kind = %kind,
                    extracted = summary.extracted_count,
                    failed = summary.failed_count,
                    "unspecified labels extracted"
                );
                Ok(summary)
            }
            s => Err(CoreError::Network(format!(
                "Extract {} request failed: {}",
                kind.label_field(),
                s
            ))),
        }
    }

    /// Submits every URL without an archive link to the Wayback Machine and
    /// writes the links back into the sheet. `pre_validation` asks the
    /// service to check each URL first.
    pub fn archive_unarchived(
        &self,
        sheet_url: &Url,
        pre_validation: bool,
        timeout: Duration,
    ) -> CoreResult<ArchiveSummary> {
        self.require_write(sheet_url)?;
        let mut url = self.service_url(ARCHIVE_PATH, &service_sheet_url(sheet_url))?;
        url.query_pairs_mut()
            .append_pair("preValidation", if pre_validation { "true" } else { "false" });
        let resp = self
            .transport
            .post_json(&url, &Value::Object(Map::new()), None, timeout)?;
        if !resp.is_success() {
            return Err(CoreError::Network(format!(
                "Archive request failed with status {}. Please check that the archive server is running properly.",
                resp.status
            )));
        }
        let summary: ArchiveSummary = resp.json()?;
        info!(archived = summary.archived_count, total = summary.total_records, "sheet archived");
        Ok(summary)
    }
}

/// Validate, open for editing, wait for confirmation, then fetch and merge.
/// `Ok(None)` when the user backs out before the fetch.
pub fn import_sheet<T: HttpTransport, E: SheetEditor + ?Sized>(
    state: &mut AppState,
    client: &SheetsClient<T>,
    editor: &mut E,
    kind: UrlKind,
    raw_sheet_url: &str,
) -> CoreResult<Option<MergeReport>> {
    let sheet_url = validate_sheets_url(raw_sheet_url)?;
    let _guard = state.sheets_flight.try_begin()?;

    editor.open(&sheet_url)?;
    if !editor.confirm(&sheet_url)? {
        info!(kind = %kind, "sheets import cancelled");
        return Ok(None);
    }

    let payload = client.fetch(&sheet_url).map_err(|e| {
        let reason = match e {
            CoreError::Network(m) => m,
            other => other.to_string(),
        };
        warn!(kind = %kind, error = reason.as_str(), "sheets import failed");
        CoreError::Network(format!(
            "Failed to load {} URLs from Google Sheets: {}",
            kind, reason
        ))
    })?;

    let available_fields = payload
        .data
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();
    let incoming = payload
        .data
        .iter()
        .map(|row| record_from_row(row, kind))
        .collect();
    let report = state.urls_mut(kind).merge_imported(incoming, available_fields);
    info!(
        kind = %kind,
        spreadsheet = spreadsheet_id(sheet_url.as_str()).as_deref().unwrap_or("unknown"),
        reported_count = payload.count.unwrap_or(0),
        added = report.added,
        duplicates = report.duplicates,
        "sheets import merged"
    );
    Ok(Some(report))
}
