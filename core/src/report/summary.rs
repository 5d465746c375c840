use crate::docx::model::{Cell, Row, Table};
use crate::form::snapshot::SummaryFields;

pub const SUMMARY_LABELS: [&str; 5] = ["Incident", "Narrative", "Impact", "TTPs", "Recommendations"];

/// "Summary" heading plus one labelled row per summary field. Empty fields
/// keep their row.
pub fn summary_table(s: &SummaryFields) -> Table {
    let values = [
        &s.incident,
        &s.narrative,
        &s.impact,
        &s.ttps,
        &s.recommendations,
    ];
    let mut rows = vec![Row::new(vec![Cell::header("Summary").span(8)])];
    rows.extend(SUMMARY_LABELS.iter().zip(values).map(|(label, value)| {
        Row::new(vec![
            Cell::header(*label).span(2).width_pct(22.0).bottom(),
            Cell::text(format!(" {}", value))
                .span(6)
                .width_pct(78.0)
                .bottom(),
        ])
    }));
    Table::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_row_per_field_even_when_empty() {
        let t = summary_table(&SummaryFields {
            impact: "wide reach".to_string(),
            ..SummaryFields::default()
        });
        assert_eq!(t.rows.len(), 1 + SUMMARY_LABELS.len());
        assert_eq!(t.rows[3].cells[0].plain_text(), "Impact");
        assert_eq!(t.rows[3].cells[1].plain_text(), " wide reach");
        assert_eq!(t.rows[1].cells[1].plain_text(), " ");
    }
}
