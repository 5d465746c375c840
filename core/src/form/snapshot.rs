use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

pub const DEFAULT_INCIDENT_NUMBER: &str = "0000";
pub const DEFAULT_TLP_LEVEL: &str = "TLP:CLEAR";

/// What the form hands over at generation time. Every field is optional in the
/// JSON; missing values deserialize to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FormSnapshot {
    pub incident_number: String,
    pub tlp_level: String,
    #[serde(alias = "country")]
    pub countries: Vec<String>,
    pub platforms: Vec<String>,
    pub title: String,
    pub date: String,
    pub threat_actor: String,
    pub authors: Vec<Author>,
    pub summary: SummaryFields,
    pub incident_description: String,
    pub meta_narrative: String,
    pub sub_narratives: Vec<String>,
    pub reach: String,
    pub outcome: String,
    pub actions_taken: String,
    pub recommendations: Vec<String>,
    /// Manual objectives; ignored once an import has completed.
    pub objectives: Vec<ManualEntry>,
    /// Manual TTPs; ignored once an import has completed.
    pub ttps: Vec<ManualEntry>,
    pub evidence: Vec<EvidenceInput>,
    pub observables: Vec<Observable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(alias = "org")]
    pub organisation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ManualEntry {
    pub title: String,
    #[serde(alias = "explanation")]
    pub justification: String,
}

impl ManualEntry {
    /// `<prefix>: <title> - <justification>`, or `None` when both are blank.
    pub fn display(&self, prefix: &str) -> Option<String> {
        let title = self.title.trim();
        let justification = self.justification.trim();
        match (title.is_empty(), justification.is_empty()) {
            (true, true) => None,
            (false, true) => Some(format!("{}: {}", prefix, title)),
            (true, false) => Some(format!("{}: {}", prefix, justification)),
            (false, false) => Some(format!("{}: {} - {}", prefix, title, justification)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryFields {
    pub incident: String,
    pub narrative: String,
    pub impact: String,
    pub ttps: String,
    pub recommendations: String,
}

/// One evidence entry. Empty threat actor, authors or platforms fall back to
/// the form-level values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EvidenceInput {
    pub report_url: String,
    pub threat_actor: String,
    pub evidence_url: String,
    pub authors: Vec<Author>,
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Observable {
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
    pub details: String,
    pub evidence_link: String,
}

/// A resolved footer row: five display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceRow {
    pub report: String,
    pub threat: String,
    pub evidence: String,
    pub authors: String,
    pub platforms: String,
}

impl EvidenceRow {
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
            && self.threat.is_empty()
            && self.evidence.is_empty()
            && self.authors.is_empty()
            && self.platforms.is_empty()
    }
}

/// Flat record the table builders read. Built fresh for every generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub incident_number: String,
    pub tlp_level: String,
    pub country: String,
    pub platforms: String,
    pub title: String,
    pub date: String,
    pub threat_actor: String,
    pub authors: String,
    pub summary: SummaryFields,
    pub incident: String,
    pub meta_narrative: String,
    pub sub_narratives: Vec<String>,
    pub reach: String,
    pub outcome: String,
    pub actions_taken: String,
    pub recommendations: Vec<String>,
    pub evidence_rows: Vec<EvidenceRow>,
}

impl FormData {
    /// Applies form defaults. `today` fills an empty date.
    pub fn from_snapshot(s: &FormSnapshot, today: Date) -> Self {
        let authors = join_authors(&s.authors);
        let platforms = join_list(&s.platforms);
        let threat_actor = s.threat_actor.trim().to_string();

        let evidence_rows = s
            .evidence
            .iter()
            .map(|e| EvidenceRow {
                report: e.report_url.trim().to_string(),
                threat: non_empty_or(e.threat_actor.trim(), &threat_actor),
                evidence: e.evidence_url.trim().to_string(),
                authors: non_empty_or(&join_authors(&e.authors), &authors),
                platforms: non_empty_or(&join_list(&e.platforms), &platforms),
            })
            .filter(|r| !r.is_empty())
            .collect();

        Self {
            incident_number: non_empty_or(s.incident_number.trim(), DEFAULT_INCIDENT_NUMBER),
            tlp_level: non_empty_or(s.tlp_level.trim(), DEFAULT_TLP_LEVEL),
            country: join_list(&s.countries),
            platforms,
            title: s.title.clone(),
            date: non_empty_or(s.date.trim(), &format_date(today)),
            threat_actor,
            authors,
            summary: s.summary.clone(),
            incident: s.incident_description.clone(),
            meta_narrative: s.meta_narrative.clone(),
            sub_narratives: numbered_lines("Sub-Narrative", &s.sub_narratives),
            reach: s.reach.clone(),
            outcome: s.outcome.clone(),
            actions_taken: s.actions_taken.clone(),
            recommendations: numbered_lines("Recommendation", &s.recommendations),
            evidence_rows,
        }
    }
}

/// `Name, Org` pairs joined with `; `. Entries with both parts blank are dropped.
pub fn join_authors(authors: &[Author]) -> String {
    authors
        .iter()
        .filter_map(|a| {
            let name = a.name.trim();
            let org = a.organisation.trim();
            if name.is_empty() && org.is_empty() {
                return None;
            }
            Some(format!(
                "{}, {}",
                if name.is_empty() { "Unknown" } else { name },
                if org.is_empty() { "Unknown Org" } else { org }
            ))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn numbered_lines(label: &str, items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{} {}: {}", label, i + 1, text))
        .collect()
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

pub fn format_date(d: Date) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    d.format(&fmt).unwrap_or_else(|_| d.to_string())
}
