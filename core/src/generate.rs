//! One "generate" action: snapshot in, `.docx` (and optional HTML preview)
//! out. Any failure aborts before anything is handed back.

use crate::config::AppConfig;
use crate::docx::assemble::{assemble, core_properties, revision_line_count, AssembledDocument};
use crate::error::CoreResult;
use crate::form::validate::{url_warnings, UrlWarning};
use crate::form::{FormData, FormSnapshot};
use crate::render::{render_html, HtmlReport};
use crate::report::build_sections;
use crate::state::{AppState, SelectionInfo};
use crate::transport::HttpTransport;
use time::Date;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub docx: AssembledDocument,
    pub html: Option<HtmlReport>,
    pub warnings: Vec<UrlWarning>,
    pub selection: SelectionInfo,
}

pub struct GenerateOptions<'a> {
    pub snapshot: &'a FormSnapshot,
    /// Raw snapshot text; its line count is the revision when no page URL is
    /// configured.
    pub snapshot_text: &'a str,
    pub today: Date,
    pub with_html: bool,
}

pub fn generate_report<T: HttpTransport>(
    state: &mut AppState,
    transport: &T,
    cfg: &AppConfig,
    opts: GenerateOptions<'_>,
) -> CoreResult<GeneratedReport> {
    let warnings = url_warnings(opts.snapshot);
    for w in &warnings {
        warn!(field = w.field.as_str(), value = w.value.as_str(), "{}", w.message);
    }

    let fd = FormData::from_snapshot(opts.snapshot, opts.today);
    let (objectives, ttps) = state.report_lines(opts.snapshot)?;
    let selection = state.selection_info();
    if selection.at_cap() {
        info!(selection = %selection, "selection at or over the recommended cap");
    }

    let revision = revision_line_count(
        transport,
        &cfg.document,
        opts.snapshot_text,
        cfg.document.page_timeout(),
    )?;

    let sections = build_sections(&fd, &objectives, &ttps, state.logo());
    let html = opts
        .with_html
        .then(|| render_html(&sections.clone().into_blocks(), &fd.title));
    let docx = assemble(
        sections,
        core_properties(&cfg.document, revision),
        &fd.title,
        state.logo(),
    )?;
    // The logo belongs to this one document.
    state.take_logo();

    Ok(GeneratedReport {
        docx,
        html,
        warnings,
        selection,
    })
}
