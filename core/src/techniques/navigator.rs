use super::client::TitleLookup;
use crate::error::{CoreError, CoreResult};
use crate::state::{AppState, ImportMode, LabeledEntry};
use serde::Deserialize;
use tracing::info;

/// Tactics whose techniques are reported as objectives.
pub const OBJECTIVE_TACTICS: [&str; 2] = ["plan-strategy", "plan-objectives"];

pub const NAVIGATOR_ERROR_MESSAGE: &str =
    "Failed to process the Navigator file. Please ensure it is a valid JSON file.";

#[derive(Debug, Clone, Deserialize)]
pub struct NavigatorLayer {
    #[serde(default)]
    pub techniques: Vec<NavigatorTechnique>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigatorTechnique {
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub tactic: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NavigatorTechnique {
    fn scored(&self) -> bool {
        self.score.map(|s| s > 0.0).unwrap_or(false)
    }

    fn is_objective(&self) -> bool {
        self.tactic
            .as_deref()
            .map(|t| OBJECTIVE_TACTICS.contains(&t))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorImport {
    pub objectives: usize,
    pub ttps: usize,
    pub skipped: usize,
}

pub fn parse_layer(bytes: &[u8]) -> CoreResult<NavigatorLayer> {
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Validation(format!("{} ({})", NAVIGATOR_ERROR_MESSAGE, e)))
}

/// Replaces both lists with the positively scored techniques of `bytes`.
/// Nothing in `state` changes unless the whole file parses.
pub fn import_navigator(
    state: &mut AppState,
    bytes: &[u8],
    titles: &dyn TitleLookup,
) -> CoreResult<NavigatorImport> {
    let _guard = state.navigator_flight.try_begin()?;
    state.ensure_import_mode(ImportMode::NavigatorFile)?;
    let layer = parse_layer(bytes)?;

    let mut objectives = Vec::new();
    let mut ttps = Vec::new();
    let mut skipped = 0;
    for t in &layer.techniques {
        if !t.scored() {
            skipped += 1;
            continue;
        }
        let title = titles.fetch_title(&t.technique_id);
        let justification = t.comment.as_deref().unwrap_or("");
        if t.is_objective() {
            objectives.push(LabeledEntry::technique(
                &t.technique_id,
                format!("Objective: {} - {}", title, justification),
            ));
        } else {
            ttps.push(LabeledEntry::technique(
                &t.technique_id,
                format!("TTP: {} - {}", title, justification),
            ));
        }
    }

    let summary = NavigatorImport {
        objectives: objectives.len(),
        ttps: ttps.len(),
        skipped,
    };
    state.replace_imported(ImportMode::NavigatorFile, objectives, ttps)?;
    info!(
        objectives = summary.objectives,
        ttps = summary.ttps,
        skipped = summary.skipped,
        "navigator file imported"
    );
    Ok(summary)
}
