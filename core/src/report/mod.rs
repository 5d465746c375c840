//! Table builders for each report section. Every builder is a pure function
//! of its inputs; empty strings produce empty cells, never missing rows.

pub mod content;
pub mod footer;
pub mod header;
pub mod summary;

use crate::docx::model::{Block, Paragraph, Table};
use crate::form::FormData;
use crate::state::ImageLogo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSections {
    pub header_top: Table,
    pub header_bottom: Table,
    pub summary: Table,
    pub incident: Table,
    pub narrative: Table,
    pub impact: Table,
    pub objectives: Table,
    pub recommendations: Table,
    pub footer: Table,
}

pub fn build_sections(
    fd: &FormData,
    objectives: &[String],
    ttps: &[String],
    logo: Option<&ImageLogo>,
) -> ReportSections {
    ReportSections {
        header_top: header::header_top(fd),
        header_bottom: header::header_bottom(fd),
        summary: summary::summary_table(&fd.summary),
        incident: content::incident_table(fd),
        narrative: content::narrative_table(fd),
        impact: content::impact_table(fd),
        objectives: content::objectives_table(objectives, ttps),
        recommendations: content::recommendations_table(fd),
        footer: footer::footer_table(&fd.evidence_rows, logo),
    }
}

impl ReportSections {
    /// Body order. The two header tables and the summary sit flush; a blank
    /// paragraph separates every later section.
    pub fn into_blocks(self) -> Vec<Block> {
        let spaced = [
            self.incident,
            self.narrative,
            self.impact,
            self.objectives,
            self.recommendations,
            self.footer,
        ];
        let mut blocks = vec![
            Block::Table(self.header_top),
            Block::Table(self.header_bottom),
            Block::Table(self.summary),
        ];
        for table in spaced {
            blocks.push(Block::Paragraph(Paragraph::blank()));
            blocks.push(Block::Table(table));
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::EvidenceRow;

    fn fd() -> FormData {
        FormData {
            incident_number: "0042".to_string(),
            title: "Botnet".to_string(),
            evidence_rows: vec![EvidenceRow {
                report: "r1".to_string(),
                ..EvidenceRow::default()
            }],
            ..FormData::default()
        }
    }

    #[test]
    fn test_builders_are_pure() {
        let objs = vec!["Objective: a".to_string()];
        let a = build_sections(&fd(), &objs, &[], None);
        let b = build_sections(&fd(), &objs, &[], None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_block_order_and_spacers() {
        let blocks = build_sections(&fd(), &[], &[], None).into_blocks();
        let shape: String = blocks
            .iter()
            .map(|b| match b {
                Block::Table(_) => 'T',
                Block::Paragraph(_) => 'p',
            })
            .collect();
        assert_eq!(shape, "TTTpTpTpTpTpTpT");
        match blocks.last() {
            Some(Block::Table(t)) => assert_eq!(t.rows.len(), 2),
            other => panic!("expected footer table, got {:?}", other),
        }
    }
}
