use crate::docx::model::{Align, Cell, Paragraph, Row, Table};
use crate::form::EvidenceRow;
use crate::state::ImageLogo;

pub const FOOTER_COLUMNS: [(&str, f64); 6] = [
    ("Report", 16.6),
    ("Threat Actor", 16.6),
    ("Evidence", 16.7),
    ("Authors", 16.7),
    ("Platforms", 16.7),
    ("Logo", 16.7),
];

/// Header row plus one row per evidence entry. The logo, if any, goes only in
/// the last cell of the final row.
pub fn footer_table(rows: &[EvidenceRow], logo: Option<&ImageLogo>) -> Table {
    let header = Row::new(
        FOOTER_COLUMNS
            .iter()
            .map(|(label, w)| Cell::header(*label).width_pct(*w).aligned(Align::Left))
            .collect(),
    );
    let mut out = vec![header];
    for (i, ev) in rows.iter().enumerate() {
        let is_last = i + 1 == rows.len();
        let logo_paragraph = match (is_last, logo) {
            (true, Some(l)) => Paragraph::logo(l.width, l.height),
            _ => Paragraph::default(),
        };
        let values = [&ev.report, &ev.threat, &ev.evidence, &ev.authors, &ev.platforms];
        let mut cells: Vec<Cell> = values
            .iter()
            .zip(FOOTER_COLUMNS.iter())
            .map(|(v, (_, w))| Cell::text((*v).clone()).width_pct(*w).aligned(Align::Left))
            .collect();
        cells.push(
            Cell::new(vec![logo_paragraph.aligned(Align::Left)]).width_pct(FOOTER_COLUMNS[5].1),
        );
        out.push(Row::new(cells));
    }
    Table::new(out)
}
