use crate::docx::model::{Cell, Paragraph, Row, Table};
use crate::form::FormData;

/// Shaded heading row over a single body cell, both three columns wide.
fn titled(heading: &str, body: Vec<Paragraph>) -> Table {
    Table::new(vec![
        Row::new(vec![Cell::header(heading).span(3)]),
        Row::new(vec![Cell::new(body).span(3)]),
    ])
}

pub fn incident_table(fd: &FormData) -> Table {
    titled("Incident", vec![Paragraph::text(fd.incident.clone())])
}

/// Meta-narrative, then one paragraph per sub-narrative line.
pub fn narrative_table(fd: &FormData) -> Table {
    let mut body = vec![Paragraph::text(format!("Meta-narrative: {}", fd.meta_narrative))];
    body.extend(fd.sub_narratives.iter().map(|l| Paragraph::text(l.clone())));
    titled("Narrative", body)
}

pub fn impact_table(fd: &FormData) -> Table {
    titled(
        "Impact and Outcome",
        vec![
            Paragraph::text(format!("Reach: {}", fd.reach)),
            Paragraph::text(format!("Outcome: {}", fd.outcome)),
        ],
    )
}

pub fn recommendations_table(fd: &FormData) -> Table {
    let mut body = vec![Paragraph::text(format!("Actions Taken: {}", fd.actions_taken))];
    body.extend(fd.recommendations.iter().map(|l| Paragraph::text(l.clone())));
    titled("Recommendations and Actions Taken", body)
}

/// One row per objective, then one per TTP.
pub fn objectives_table(objectives: &[String], ttps: &[String]) -> Table {
    let mut rows = vec![Row::new(vec![
        Cell::header("Key Objectives and Behaviours").span(3)
    ])];
    rows.extend(
        objectives
            .iter()
            .chain(ttps)
            .map(|line| Row::new(vec![Cell::text(line.clone()).span(3)])),
    );
    Table::new(rows)
}
