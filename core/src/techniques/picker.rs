use crate::error::{CoreError, CoreResult};
use crate::state::{AppState, EntryKind, ImportMode, InFlightGuard, LabeledEntry, SelectionInfo};
use serde::Deserialize;
use tracing::{debug, info};

pub const SELECTION_EVENT: &str = "techniqueSelected";

/// Tactic ids whose techniques are objectives.
pub const OBJECTIVE_TACTIC_IDS: [&str; 2] = ["TA01", "TA02"];

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PickerEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub technique_id: String,
    pub technique_name: String,
    pub tactic: String,
    pub is_objective: bool,
    pub selected: bool,
}

impl PickerEvent {
    pub fn entry_kind(&self) -> EntryKind {
        if self.is_objective || OBJECTIVE_TACTIC_IDS.contains(&self.tactic.as_str()) {
            EntryKind::Objective
        } else {
            EntryKind::Ttp
        }
    }
}

/// One open picker. Opening clears both lists; events then add or remove
/// single entries keyed by technique id.
pub struct PickerSession<'a> {
    state: &'a mut AppState,
    _guard: InFlightGuard,
}

impl<'a> PickerSession<'a> {
    pub fn open(state: &'a mut AppState) -> CoreResult<Self> {
        let guard = state.navigator_flight.try_begin()?;
        state.ensure_import_mode(ImportMode::Picker)?;
        state.reset_lists();
        Ok(Self {
            state,
            _guard: guard,
        })
    }

    pub fn apply(&mut self, event: &PickerEvent) -> SelectionInfo {
        if event.kind != SELECTION_EVENT || event.technique_id.is_empty() {
            debug!(kind = event.kind.as_str(), "ignoring picker message");
            return self.state.selection_info();
        }
        let kind = event.entry_kind();
        let list = self.state.entries_mut(kind);
        let id = event.technique_id.as_str();
        if event.selected {
            if !list.iter().any(|e| e.technique_id.as_deref() == Some(id)) {
                list.push(LabeledEntry::technique(
                    id,
                    format!("{}: {}", id, event.technique_name),
                ));
                debug!(technique_id = id, tactic = event.tactic.as_str(), "technique selected");
            }
        } else {
            list.retain(|e| e.technique_id.as_deref() != Some(id));
            debug!(technique_id = id, tactic = event.tactic.as_str(), "technique deselected");
        }
        self.state.selection_info()
    }

    pub fn selection_info(&self) -> SelectionInfo {
        self.state.selection_info()
    }

    /// Closes the picker and marks the session as imported.
    pub fn finish(self) -> SelectionInfo {
        self.state.mark_imported(ImportMode::Picker);
        let info = self.state.selection_info();
        info!(selection = %info, "technique picker closed");
        info
    }
}

/// One JSON event per line; blank lines are skipped.
pub fn parse_events(text: &str) -> CoreResult<Vec<PickerEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l).map_err(|e| {
                CoreError::Validation(format!("picker event on line {}: {}", i + 1, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: &str, tactic: &str, selected: bool) -> PickerEvent {
        PickerEvent {
            kind: SELECTION_EVENT.to_string(),
            technique_id: id.to_string(),
            technique_name: format!("name {}", id),
            tactic: tactic.to_string(),
            is_objective: false,
            selected,
        }
    }

    #[test]
    fn test_opening_resets_and_events_toggle() {
        let mut s = AppState::new();
        s.add_manual_objective("old");
        {
            let mut p = PickerSession::open(&mut s).unwrap();
            assert_eq!(p.selection_info().objectives, 0);
            p.apply(&ev("T0073", "TA01", true));
            p.apply(&ev("T0073", "TA01", true));
            p.apply(&ev("T0049", "TA17", true));
            let info = p.apply(&ev("T0049", "TA17", false));
            assert_eq!(info.to_string(), "Objectives: 1/2 | TTPs: 0/4");
            p.finish();
        }
        assert_eq!(s.objectives()[0].text, "T0073: name T0073");
        assert_eq!(s.import_mode(), Some(ImportMode::Picker));
    }

    #[test]
    fn test_dedup_is_by_exact_id() {
        let mut s = AppState::new();
        let mut p = PickerSession::open(&mut s).unwrap();
        p.apply(&ev("T0049", "TA17", true));
        p.apply(&ev("T0049.001", "TA17", true));
        p.apply(&ev("T0049", "TA17", false));
        p.finish();
        assert_eq!(s.ttps().len(), 1);
        assert_eq!(s.ttps()[0].technique_id.as_deref(), Some("T0049.001"));
    }

    #[test]
    fn test_is_objective_flag_routes_to_objectives() {
        let mut e = ev("T0066", "TA05", true);
        assert_eq!(e.entry_kind(), EntryKind::Ttp);
        e.is_objective = true;
        assert_eq!(e.entry_kind(), EntryKind::Objective);
    }

    #[test]
    fn test_other_messages_are_ignored() {
        let mut s = AppState::new();
        let mut p = PickerSession::open(&mut s).unwrap();
        let mut e = ev("T0049", "TA17", true);
        e.kind = "resize".to_string();
        assert_eq!(p.apply(&e).ttps, 0);
    }

    #[test]
    fn test_parse_events_ndjson() {
        let text = "{\"type\":\"techniqueSelected\",\"techniqueId\":\"T0049\",\"selected\":true}\n\n";
        let events = parse_events(text).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].selected);
        assert!(parse_events("{oops").is_err());
    }
}
