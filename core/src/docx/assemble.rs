use super::model::{Block, CoreProperties, Document};
use super::package::{normalize_package, sha256_hex};
use super::word::to_docx;
use crate::config::DocumentConfig;
use crate::error::{CoreError, CoreResult};
use crate::form::validate::sanitize_title;
use crate::report::ReportSections;
use crate::state::ImageLogo;
use crate::transport::{parse_url, DestinationPermit, HttpTransport};
use std::io::Cursor;
use std::time::Duration;
use tracing::info;

pub const REPORT_FILE_PREFIX: &str = "cdn-incident-alert-";
const PAGE_PURPOSE: &str = "form page line count";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub sha256: String,
}

pub fn report_file_name(title: &str, extension: &str) -> String {
    format!("{}{}.{}", REPORT_FILE_PREFIX, sanitize_title(title), extension)
}

pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// Line count stamped into the revision field: the configured page when set,
/// otherwise `fallback_text`. A failed page fetch fails the generation.
pub fn revision_line_count<T: HttpTransport>(
    transport: &T,
    cfg: &DocumentConfig,
    fallback_text: &str,
    timeout: Duration,
) -> CoreResult<usize> {
    match cfg.page_url.as_deref() {
        Some(raw) => {
            let url = parse_url(raw, "page")?;
            let _permit = DestinationPermit::new(transport, &url, PAGE_PURPOSE)?;
            let page = transport.get(&url, timeout)?.ensure_success("page line count")?;
            Ok(line_count(&page.text()))
        }
        None => Ok(line_count(fallback_text)),
    }
}

pub fn core_properties(cfg: &DocumentConfig, revision: usize) -> CoreProperties {
    CoreProperties {
        creator: cfg.creator.clone(),
        title: cfg.template_version.clone(),
        keywords: cfg.baseline_line_count.clone(),
        revision: revision.to_string(),
        subject: cfg.template_date.clone(),
        description: cfg.description.clone(),
    }
}

/// Serializes the sections into one `.docx`. Nothing is returned unless every
/// part was written.
pub fn assemble(
    sections: ReportSections,
    properties: CoreProperties,
    title: &str,
    logo: Option<&ImageLogo>,
) -> CoreResult<AssembledDocument> {
    let doc = Document {
        properties,
        blocks: sections.into_blocks(),
    };
    // The image is only packaged when the footer actually places it.
    let placed = doc.blocks.iter().any(|b| match b {
        Block::Table(t) => t.rows.iter().any(|r| {
            r.cells
                .iter()
                .any(|c| c.paragraphs.iter().any(|p| p.has_logo()))
        }),
        Block::Paragraph(p) => p.has_logo(),
    });
    let logo_png = match logo {
        Some(l) if placed => Some(l.png_data()?),
        _ => None,
    };

    let mut packed = Cursor::new(Vec::new());
    to_docx(&doc, logo_png.as_deref())
        .build()
        .pack(&mut packed)
        .map_err(|e| CoreError::Zip(e.to_string()))?;
    let bytes = normalize_package(&packed.into_inner())?;
    let sha256 = sha256_hex(&bytes);
    let file_name = report_file_name(title, "docx");
    info!(
        file_name = file_name.as_str(),
        bytes = bytes.len(),
        sha256 = sha256.as_str(),
        "report assembled"
    );
    Ok(AssembledDocument {
        file_name,
        bytes,
        sha256,
    })
}
