//! PDF summarize flow: download (direct, then proxies), extract, post to the
//! text-generation endpoint, write the result into the incident description.

pub mod client;
pub mod download;
pub mod extract;
pub mod stage;

pub use stage::{SilentObserver, StageTracker, SummarizerObserver, SummarizerStage};

use crate::config::{NetworkConfig, SummarizerConfig};
use crate::error::{CoreError, CoreResult};
use crate::form::FormSnapshot;
use crate::state::AppState;
use crate::transport::{parse_url, HttpTransport};
use client::{build_prompt, SummaryClient};
use download::download_pdf;
use extract::extract_text;
use std::time::Duration;
use tracing::{info, warn};

pub const DESCRIPTION_FIELD: &str = "incidentDescription";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub summary: String,
    pub source: String,
    pub pages: usize,
    pub skipped_pages: Vec<u32>,
}

pub struct Summarizer<'a, T: HttpTransport> {
    transport: &'a T,
    network: &'a NetworkConfig,
    settings: &'a SummarizerConfig,
    api_key: Option<String>,
}

impl<'a, T: HttpTransport> Summarizer<'a, T> {
    pub fn new(
        transport: &'a T,
        network: &'a NetworkConfig,
        settings: &'a SummarizerConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            network,
            settings,
            api_key,
        }
    }

    /// Runs one summarize action. On success the snapshot's incident
    /// description holds the summary; on failure the snapshot is untouched.
    pub fn run(
        &self,
        state: &AppState,
        snapshot: &mut FormSnapshot,
        pdf_url: &str,
        observer: &mut dyn SummarizerObserver,
    ) -> CoreResult<SummaryOutcome> {
        let _guard = state.summarizer_flight.try_begin()?;
        let mut tracker = StageTracker::new(observer);
        tracker.advance(SummarizerStage::Downloading)?;

        match self.stages(&mut tracker, pdf_url) {
            Ok(outcome) => {
                snapshot.incident_description = outcome.summary.clone();
                tracker.observer().field_changed(DESCRIPTION_FIELD);
                tracker.advance(SummarizerStage::Done)?;
                tracker
                    .observer()
                    .hide_after(Duration::from_secs(self.settings.success_display_secs));
                info!(source = outcome.source.as_str(), pages = outcome.pages, "summary written");
                Ok(outcome)
            }
            Err(e) => {
                warn!(stage = %tracker.stage(), error = %e, "summarize failed");
                tracker.fail(&e.to_string())?;
                tracker
                    .observer()
                    .hide_after(Duration::from_secs(self.settings.error_display_secs));
                Err(e)
            }
        }
    }

    fn stages(&self, tracker: &mut StageTracker<'_>, pdf_url: &str) -> CoreResult<SummaryOutcome> {
        if pdf_url.trim().is_empty() {
            return Err(CoreError::Validation("PDF URL is required".to_string()));
        }
        let url = parse_url(pdf_url, "PDF")?;
        let pdf = download_pdf(self.transport, &url, self.network)?;

        tracker.advance(SummarizerStage::Extracting)?;
        let extracted = extract_text(&pdf.bytes, self.settings.min_extracted_chars)?;

        tracker.advance(SummarizerStage::Summarizing)?;
        let prompt = build_prompt(&extracted.text, self.settings.max_input_chars);
        let endpoint = parse_url(&self.network.summarizer_url, "summarizer")?;
        let client = SummaryClient::new(
            self.transport,
            endpoint,
            self.network.summarize_timeout(),
            self.api_key.clone(),
        );
        let summary = client.summarize(&prompt)?;

        Ok(SummaryOutcome {
            summary,
            source: pdf.source,
            pages: extracted.pages,
            skipped_pages: extracted.skipped_pages,
        })
    }
}
