//! Turns the report model into a `docx-rs` document.

use super::model::{
    Align, Block, Cell, CoreProperties, Document, Inline, Paragraph, Row, Table, VAlign, FONT,
    FONT_SIZE, HEADER_FILL,
};
use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, Pic, Run, RunFonts, Shading, ShdType,
    TableCell, TableRow, VAlignType, WidthType,
};

/// Creation and modification stamp written on every report, so equal input
/// gives equal metadata.
pub const DOCUMENT_TIMESTAMP: &str = "2025-05-26T00:00:00Z";

/// A4 portrait in twips.
const PAGE_SIZE: (u32, u32) = (11906, 16838);
/// Text width of an A4 page with one-inch margins, in twips.
const TEXT_WIDTH: usize = 9026;
const FULL_WIDTH_PCT: usize = 5000;

/// Custom property names carrying the template metadata.
pub const PROPERTY_NAMES: [&str; 6] = [
    "creator",
    "title",
    "keywords",
    "revision",
    "subject",
    "description",
];

/// `logo_png` is embedded wherever the model places the logo; without it the
/// placeholder is left empty.
pub fn to_docx(doc: &Document, logo_png: Option<&[u8]>) -> Docx {
    let fonts = RunFonts::new().ascii(FONT).hi_ansi(FONT).east_asia(FONT).cs(FONT);
    let mut docx = Docx::new()
        .default_fonts(fonts)
        .default_size(FONT_SIZE as usize)
        .page_size(PAGE_SIZE.0, PAGE_SIZE.1)
        .created_at(DOCUMENT_TIMESTAMP)
        .updated_at(DOCUMENT_TIMESTAMP);
    for (name, value) in PROPERTY_NAMES.iter().zip(property_values(&doc.properties)) {
        docx = docx.custom_property(*name, value);
    }
    for block in &doc.blocks {
        docx = match block {
            Block::Table(t) => docx.add_table(table(t, logo_png)),
            Block::Paragraph(p) => docx.add_paragraph(paragraph(p, logo_png)),
        };
    }
    docx
}

fn property_values(p: &CoreProperties) -> [&str; 6] {
    [
        &p.creator,
        &p.title,
        &p.keywords,
        &p.revision,
        &p.subject,
        &p.description,
    ]
}

fn table(t: &Table, logo_png: Option<&[u8]>) -> docx_rs::Table {
    let columns = t.grid_columns() as usize;
    let rows = t.rows.iter().map(|r| row(r, logo_png)).collect();
    docx_rs::Table::new(rows)
        .set_grid(vec![TEXT_WIDTH / columns; columns])
        .width(FULL_WIDTH_PCT, WidthType::Pct)
        .clear_all_border()
}

fn row(r: &Row, logo_png: Option<&[u8]>) -> TableRow {
    TableRow::new(r.cells.iter().map(|c| cell(c, logo_png)).collect())
}

fn cell(c: &Cell, logo_png: Option<&[u8]>) -> TableCell {
    let mut out = TableCell::new().clear_all_border();
    if c.paragraphs.is_empty() {
        out = out.add_paragraph(docx_rs::Paragraph::new());
    }
    for p in &c.paragraphs {
        out = out.add_paragraph(paragraph(p, logo_png));
    }
    if c.span > 1 {
        out = out.grid_span(c.span as usize);
    }
    if let Some(w) = c.width {
        out = out.width(w as usize, WidthType::Pct);
    }
    if c.shaded {
        out = out.shading(
            Shading::new()
                .shd_type(ShdType::Clear)
                .color("auto")
                .fill(HEADER_FILL),
        );
    }
    if let Some(VAlign::Bottom) = c.v_align {
        out = out.vertical_align(VAlignType::Bottom);
    }
    out
}

fn paragraph(p: &Paragraph, logo_png: Option<&[u8]>) -> docx_rs::Paragraph {
    let mut out = docx_rs::Paragraph::new();
    if p.tight {
        out = out.line_spacing(LineSpacing::new().before(0).after(0));
    }
    match p.align {
        Some(Align::Left) => out = out.align(AlignmentType::Left),
        Some(Align::Right) => out = out.align(AlignmentType::Right),
        None => {}
    }
    for child in &p.children {
        match child {
            Inline::Text(r) => out = out.add_run(text_run(&r.text, r.bold)),
            Inline::Logo { width, height } => {
                if let Some(png) = logo_png {
                    let pic = Pic::new_with_dimensions(png.to_vec(), *width, *height);
                    out = out.add_run(Run::new().add_image(pic));
                }
            }
        }
    }
    out
}

/// One run; embedded newlines become line breaks.
fn text_run(text: &str, bold: bool) -> Run {
    let mut run = Run::new();
    if bold {
        run = run.bold();
    }
    let normalized = text.replace("\r\n", "\n");
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}
