use crate::docx::model::{Align, Cell, Paragraph, Row, Table};
use crate::form::FormData;

/// Incident number, TLP marking and the "Date" label.
pub fn header_top(fd: &FormData) -> Table {
    Table::new(vec![Row::new(vec![
        Cell::header(format!("CDN Incident Alert: {}", fd.incident_number))
            .span(3)
            .width_pct(30.0),
        Cell::text(fd.tlp_level.clone()).shaded().span(2),
        Cell::text("Date")
            .shaded()
            .span(2)
            .width_pct(15.0)
            .aligned(Align::Right),
    ])])
}

/// Title label, countries, title and date, followed by a blank full-width row.
pub fn header_bottom(fd: &FormData) -> Table {
    Table::new(vec![
        Row::new(vec![
            Cell::header("Title").width_pct(10.0).bottom(),
            Cell::text(format!(" {}", fd.country))
                .width_pct(10.0)
                .bottom(),
            Cell::text(fd.title.clone()).span(3).width_pct(65.0).bottom(),
            Cell::text(fd.date.clone())
                .span(3)
                .width_pct(15.0)
                .bottom()
                .aligned(Align::Right),
        ]),
        Row::new(vec![Cell::new(vec![Paragraph::blank()]).span(8)]),
    ])
}
