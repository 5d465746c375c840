//! Reads a produced `.docx` back: part names, the template metadata kept in
//! the custom properties, and the text of every table cell.

use super::package::sha256_hex;
use crate::error::{CoreError, CoreResult};
use roxmltree::{Document as XmlDocument, Node};
use serde::Serialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BodyBlock {
    Table,
    Paragraph,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableSummary {
    pub row_count: usize,
    /// Cell texts per row; paragraphs and line breaks become `\n`.
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CorePropertiesSummary {
    pub creator: String,
    pub title: String,
    pub keywords: String,
    pub revision: String,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocxInspection {
    pub sha256: String,
    pub parts: Vec<String>,
    pub blocks: Vec<BodyBlock>,
    pub tables: Vec<TableSummary>,
    pub properties: CorePropertiesSummary,
    pub image_count: usize,
}

pub fn inspect_docx(bytes: &[u8]) -> CoreResult<DocxInspection> {
    let mut zip =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| CoreError::Zip(e.to_string()))?;
    let mut parts: Vec<String> = zip.file_names().map(|s| s.to_string()).collect();
    parts.sort();

    let document = read_part(&mut zip, "word/document.xml")?;
    let custom = read_part(&mut zip, "docProps/custom.xml")?;

    let doc = parse_xml(&document, "word/document.xml")?;
    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name((NS_W, "body")))
        .ok_or_else(|| CoreError::InvalidInput("document.xml has no body".to_string()))?;

    let mut blocks = Vec::new();
    let mut tables = Vec::new();
    for node in body.children().filter(Node::is_element) {
        if node.has_tag_name((NS_W, "tbl")) {
            blocks.push(BodyBlock::Table);
            tables.push(table_summary(node));
        } else if node.has_tag_name((NS_W, "p")) {
            blocks.push(BodyBlock::Paragraph);
        }
    }

    let image_count = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "blip")
        .count();

    let custom_doc = parse_xml(&custom, "docProps/custom.xml")?;
    let prop = |name: &str| -> String {
        custom_doc
            .descendants()
            .find(|n| n.tag_name().name() == "property" && n.attribute("name") == Some(name))
            .and_then(|n| n.children().find(Node::is_element))
            .and_then(|v| v.text())
            .unwrap_or("")
            .to_string()
    };

    Ok(DocxInspection {
        sha256: sha256_hex(bytes),
        parts,
        blocks,
        tables,
        properties: CorePropertiesSummary {
            creator: prop("creator"),
            title: prop("title"),
            keywords: prop("keywords"),
            revision: prop("revision"),
            subject: prop("subject"),
            description: prop("description"),
        },
        image_count,
    })
}

fn read_part(zip: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> CoreResult<String> {
    let mut f = zip
        .by_name(name)
        .map_err(|e| CoreError::Zip(format!("{}: {}", name, e)))?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    Ok(s)
}

fn parse_xml<'a>(text: &'a str, part: &str) -> CoreResult<XmlDocument<'a>> {
    XmlDocument::parse(text)
        .map_err(|e| CoreError::InvalidInput(format!("{} is not well-formed: {}", part, e)))
}

fn table_summary(tbl: Node) -> TableSummary {
    let rows: Vec<Vec<String>> = tbl
        .children()
        .filter(|n| n.has_tag_name((NS_W, "tr")))
        .map(|tr| {
            tr.children()
                .filter(|n| n.has_tag_name((NS_W, "tc")))
                .map(cell_text)
                .collect()
        })
        .collect();
    TableSummary {
        row_count: rows.len(),
        rows,
    }
}

fn cell_text(tc: Node) -> String {
    tc.children()
        .filter(|n| n.has_tag_name((NS_W, "p")))
        .map(|p| {
            let mut s = String::new();
            for n in p.descendants() {
                if n.has_tag_name((NS_W, "t")) {
                    s.push_str(n.text().unwrap_or(""));
                } else if n.has_tag_name((NS_W, "br")) {
                    s.push('\n');
                }
            }
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}
