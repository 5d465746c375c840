//! Application state handed explicitly to every handler and builder.

pub mod inflight;
pub mod logo;
pub mod urls;

use crate::error::{CoreError, CoreResult};
use crate::form::FormSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use inflight::{InFlight, InFlightGuard};
pub use logo::ImageLogo;
pub use urls::{channel_of, domain_of, MergeReport, UrlKind, UrlList, UrlRecord};

pub const OBJECTIVE_CAP: usize = 2;
pub const TTP_CAP: usize = 4;

/// One line of the objectives or TTPs list. Entries that came from the picker
/// carry the technique id they were keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique_id: Option<String>,
    pub text: String,
}

impl LabeledEntry {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            technique_id: None,
            text: text.into(),
        }
    }

    pub fn technique(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            technique_id: Some(id.into()),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Objective,
    Ttp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportMode {
    NavigatorFile,
    Picker,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::NavigatorFile => write!(f, "navigator file"),
            ImportMode::Picker => write!(f, "technique picker"),
        }
    }
}

/// Counter shown next to the picker. The caps are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionInfo {
    pub objectives: usize,
    pub ttps: usize,
}

impl SelectionInfo {
    pub fn at_cap(&self) -> bool {
        self.objectives >= OBJECTIVE_CAP || self.ttps >= TTP_CAP
    }
}

impl fmt::Display for SelectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Objectives: {}/{} | TTPs: {}/{}",
            self.objectives, OBJECTIVE_CAP, self.ttps, TTP_CAP
        )
    }
}

#[derive(Debug)]
pub struct AppState {
    objectives: Vec<LabeledEntry>,
    ttps: Vec<LabeledEntry>,
    import_mode: Option<ImportMode>,
    pub trusted_urls: UrlList,
    pub malicious_urls: UrlList,
    logo: Option<ImageLogo>,
    pub summarizer_flight: InFlight,
    pub navigator_flight: InFlight,
    pub sheets_flight: InFlight,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            objectives: Vec::new(),
            ttps: Vec::new(),
            import_mode: None,
            trusted_urls: UrlList::new(UrlKind::Trusted),
            malicious_urls: UrlList::new(UrlKind::Malicious),
            logo: None,
            summarizer_flight: InFlight::new("pdf summarizer"),
            navigator_flight: InFlight::new("navigator import"),
            sheets_flight: InFlight::new("google sheets import"),
        }
    }

    pub fn objectives(&self) -> &[LabeledEntry] {
        &self.objectives
    }

    pub fn ttps(&self) -> &[LabeledEntry] {
        &self.ttps
    }

    pub fn entries(&self, kind: EntryKind) -> &[LabeledEntry] {
        match kind {
            EntryKind::Objective => &self.objectives,
            EntryKind::Ttp => &self.ttps,
        }
    }

    pub(crate) fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<LabeledEntry> {
        match kind {
            EntryKind::Objective => &mut self.objectives,
            EntryKind::Ttp => &mut self.ttps,
        }
    }

    pub fn urls(&self, kind: UrlKind) -> &UrlList {
        match kind {
            UrlKind::Trusted => &self.trusted_urls,
            UrlKind::Malicious => &self.malicious_urls,
        }
    }

    pub fn urls_mut(&mut self, kind: UrlKind) -> &mut UrlList {
        match kind {
            UrlKind::Trusted => &mut self.trusted_urls,
            UrlKind::Malicious => &mut self.malicious_urls,
        }
    }

    /// True once any import has completed; manual form entries are then ignored.
    pub fn imported(&self) -> bool {
        self.import_mode.is_some()
    }

    pub fn import_mode(&self) -> Option<ImportMode> {
        self.import_mode
    }

    /// Rejects `mode` when the other import mode already populated the lists.
    pub fn ensure_import_mode(&self, mode: ImportMode) -> CoreResult<()> {
        match self.import_mode {
            Some(done) if done != mode => Err(CoreError::Validation(format!(
                "objectives and TTPs were already imported with the {}; {} import is not available in this session",
                done, mode
            ))),
            _ => Ok(()),
        }
    }

    /// Swaps both lists wholesale and marks the session as imported.
    pub fn replace_imported(
        &mut self,
        mode: ImportMode,
        objectives: Vec<LabeledEntry>,
        ttps: Vec<LabeledEntry>,
    ) -> CoreResult<()> {
        self.ensure_import_mode(mode)?;
        self.objectives = objectives;
        self.ttps = ttps;
        self.import_mode = Some(mode);
        Ok(())
    }

    pub(crate) fn reset_lists(&mut self) {
        self.objectives.clear();
        self.ttps.clear();
    }

    pub(crate) fn mark_imported(&mut self, mode: ImportMode) {
        self.import_mode = Some(mode);
    }

    pub fn add_manual_objective(&mut self, text: impl Into<String>) {
        self.objectives.push(LabeledEntry::text(text));
    }

    /// Manual adds stop at [`TTP_CAP`]; imports are not bound by it.
    pub fn add_manual_ttp(&mut self, text: impl Into<String>) -> CoreResult<()> {
        if self.ttps.len() >= TTP_CAP {
            return Err(CoreError::Validation(format!(
                "Maximum {} TTPs allowed",
                TTP_CAP
            )));
        }
        self.ttps.push(LabeledEntry::text(text));
        Ok(())
    }

    pub fn remove(&mut self, kind: EntryKind, index: usize) -> Option<LabeledEntry> {
        let list = self.entries_mut(kind);
        (index < list.len()).then(|| list.remove(index))
    }

    pub fn selection_info(&self) -> SelectionInfo {
        SelectionInfo {
            objectives: self.objectives.len(),
            ttps: self.ttps.len(),
        }
    }

    /// Objective and TTP lines for the report. Without an import, the manual
    /// form entries are appended to whatever was added by hand.
    pub fn report_lines(&self, snapshot: &FormSnapshot) -> CoreResult<(Vec<String>, Vec<String>)> {
        let mut objectives: Vec<String> = self.objectives.iter().map(|e| e.text.clone()).collect();
        let mut ttps: Vec<String> = self.ttps.iter().map(|e| e.text.clone()).collect();
        if self.imported() {
            return Ok((objectives, ttps));
        }
        objectives.extend(snapshot.objectives.iter().filter_map(|e| e.display("Objective")));
        for line in snapshot.ttps.iter().filter_map(|e| e.display("TTP")) {
            if ttps.len() >= TTP_CAP {
                return Err(CoreError::Validation(format!(
                    "Maximum {} TTPs allowed",
                    TTP_CAP
                )));
            }
            ttps.push(line);
        }
        Ok((objectives, ttps))
    }

    pub fn set_logo(&mut self, logo: ImageLogo) {
        self.logo = Some(logo);
    }

    pub fn logo(&self) -> Option<&ImageLogo> {
        self.logo.as_ref()
    }

    /// Hands the logo to one generation.
    pub fn take_logo(&mut self) -> Option<ImageLogo> {
        self.logo.take()
    }
}
