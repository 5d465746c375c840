//! Plain data model of the report document. Builders produce it and
//! [`super::word`] turns it into a `docx-rs` document. Equal inputs give
//! equal values.

pub const FONT: &str = "Times New Roman";
/// Half-points.
pub const FONT_SIZE: u32 = 22;
pub const HEADER_FILL: &str = "8EAADB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(Run),
    /// The document logo at the given display size in pixels.
    Logo { width: u32, height: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub children: Vec<Inline>,
    pub align: Option<Align>,
    /// Zero spacing before and after.
    pub tight: bool,
}

impl Paragraph {
    pub fn text(text: impl Into<String>) -> Self {
        Self::run(text, false)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::run(text, true)
    }

    fn run(text: impl Into<String>, bold: bool) -> Self {
        Self {
            children: vec![Inline::Text(Run {
                text: text.into(),
                bold,
            })],
            ..Self::default()
        }
    }

    /// Empty paragraph used between sections.
    pub fn blank() -> Self {
        Self {
            tight: true,
            ..Self::default()
        }
    }

    pub fn logo(width: u32, height: u32) -> Self {
        Self {
            children: vec![Inline::Logo { width, height }],
            ..Self::default()
        }
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Inline::Text(r) => Some(r.text.as_str()),
                Inline::Logo { .. } => None,
            })
            .collect()
    }

    pub fn has_logo(&self) -> bool {
        self.children
            .iter()
            .any(|c| matches!(c, Inline::Logo { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
    pub span: u32,
    /// Fiftieths of a percent (5000 = 100%).
    pub width: Option<u32>,
    pub shaded: bool,
    pub v_align: Option<VAlign>,
}

impl Cell {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            span: 1,
            width: None,
            shaded: false,
            v_align: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Paragraph::text(text)])
    }

    /// Bold text on the header fill.
    pub fn header(text: impl Into<String>) -> Self {
        Self::new(vec![Paragraph::bold(text)]).shaded()
    }

    pub fn span(mut self, span: u32) -> Self {
        self.span = span.max(1);
        self
    }

    pub fn width_pct(mut self, pct: f64) -> Self {
        self.width = Some(pct_to_fiftieths(pct));
        self
    }

    pub fn shaded(mut self) -> Self {
        self.shaded = true;
        self
    }

    pub fn bottom(mut self) -> Self {
        self.v_align = Some(VAlign::Bottom);
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        for p in &mut self.paragraphs {
            p.align = Some(align);
        }
        self
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn grid_width(&self) -> u32 {
        self.cells.iter().map(|c| c.span).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn grid_columns(&self) -> u32 {
        self.rows.iter().map(Row::grid_width).max().unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Table(Table),
    Paragraph(Paragraph),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub creator: String,
    pub title: String,
    pub keywords: String,
    pub revision: String,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub properties: CoreProperties,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }
}

pub fn pct_to_fiftieths(pct: f64) -> u32 {
    (pct * 50.0).round().clamp(0.0, 5000.0) as u32
}
