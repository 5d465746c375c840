//! Standalone HTML rendition of the report body, sharing the table model
//! with the `.docx` output.

use crate::docx::model::{Align, Block, Cell, Inline, Paragraph, Table, VAlign, HEADER_FILL};
use crate::docx::assemble::report_file_name;
use std::fmt::Write as _;

const STYLE: &str = "body{font-family:\"Times New Roman\",Times,serif;font-size:11pt;margin:30px;line-height:1.5;color:black;background:white}\
table{border-collapse:collapse;width:100%;margin-bottom:0;border:none}\
td{padding:10px;vertical-align:top;border:none}\
.preview-template{max-width:800px;margin:0 auto}\
@media print{body{margin:0;padding:20px}td.shaded{-webkit-print-color-adjust:exact;print-color-adjust:exact}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlReport {
    pub file_name: String,
    pub html: String,
}

pub fn render_html(blocks: &[Block], title: &str) -> HtmlReport {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("<title>CDN Incident Alert</title>\n<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n<div class=\"preview-template\">\n");
    for block in blocks {
        match block {
            Block::Table(t) => table(&mut out, t),
            Block::Paragraph(p) => {
                out.push_str("<p>");
                paragraph_content(&mut out, p);
                out.push_str("</p>\n");
            }
        }
    }
    out.push_str("</div>\n</body>\n</html>\n");
    HtmlReport {
        file_name: report_file_name(title, "html"),
        html: out,
    }
}

fn table(out: &mut String, t: &Table) {
    out.push_str("<table>\n");
    for row in &t.rows {
        out.push_str("<tr>");
        for c in &row.cells {
            cell(out, c);
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

fn cell(out: &mut String, c: &Cell) {
    let mut style = String::new();
    if let Some(w) = c.width {
        let _ = write!(style, "width:{}%;", w as f64 / 50.0);
    }
    if c.shaded {
        let _ = write!(style, "background-color:#{};", HEADER_FILL);
    }
    if c.v_align == Some(VAlign::Bottom) {
        style.push_str("vertical-align:bottom;");
    }
    out.push_str("<td");
    if c.span > 1 {
        let _ = write!(out, " colspan=\"{}\"", c.span);
    }
    if c.shaded {
        out.push_str(" class=\"shaded\"");
    }
    if !style.is_empty() {
        let _ = write!(out, " style=\"{}\"", style);
    }
    out.push('>');
    for (i, p) in c.paragraphs.iter().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        if p.align == Some(Align::Right) {
            out.push_str("<div style=\"text-align:right\">");
            paragraph_content(out, p);
            out.push_str("</div>");
        } else {
            paragraph_content(out, p);
        }
    }
    out.push_str("</td>");
}

fn paragraph_content(out: &mut String, p: &Paragraph) {
    for child in &p.children {
        match child {
            Inline::Text(run) => {
                let text = escape_html(&run.text).replace('\n', "<br>");
                if run.bold {
                    let _ = write!(out, "<strong>{}</strong>", text);
                } else {
                    out.push_str(&text);
                }
            }
            Inline::Logo { width, height } => {
                let _ = write!(
                    out,
                    "<span class=\"logo\" style=\"display:inline-block;width:{}px;height:{}px\"></span>",
                    width, height
                );
            }
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormData;
    use crate::report::build_sections;

    #[test]
    fn test_html_has_every_section_and_escapes_text() {
        let fd = FormData {
            incident: "<script>alert(1)</script>".to_string(),
            ..FormData::default()
        };
        let blocks = build_sections(&fd, &[], &[], None).into_blocks();
        let report = render_html(&blocks, "Spam Wave");
        assert_eq!(report.file_name, "cdn-incident-alert-spam-wave.html");
        assert_eq!(report.html.matches("<table>").count(), 9);
        assert!(report.html.contains("&lt;script&gt;"));
        assert!(!report.html.contains("<script>"));
        assert!(report.html.contains("colspan=\"8\""));
    }
}
