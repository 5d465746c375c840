use crate::error::CoreResult;
use crate::form::validate::sanitize_or;
use crate::form::Observable;

pub const OBSERVABLES_HEADER: [&str; 5] = [
    "Platform",
    "Type",
    "Identifier/URL",
    "Details/Notes",
    "Evidence Link",
];

const DEFAULT_OBSERVABLES_BASE: &str = "incident";

pub fn observables_file_name(title: &str) -> String {
    format!("observables-{}.csv", sanitize_or(title, DEFAULT_OBSERVABLES_BASE))
}

/// Every field quoted; newlines inside details become spaces.
pub fn render_observables_csv(rows: &[Observable]) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(OBSERVABLES_HEADER)?;
    for o in rows {
        let details = o.details.replace("\r\n", " ").replace(['\n', '\r'], " ");
        wtr.write_record([
            o.platform.as_str(),
            o.kind.as_str(),
            o.identifier.as_str(),
            details.as_str(),
            o.evidence_link.as_str(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_quotes_and_flattens_details() {
        let rows = vec![Observable {
            platform: "X".to_string(),
            kind: "Account".to_string(),
            identifier: "https://x.example/a?b=1,2".to_string(),
            details: "said \"hi\"\nthen left".to_string(),
            evidence_link: String::new(),
        }];
        let csv = render_observables_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("\"Platform\",\"Type\",\"Identifier/URL\",\"Details/Notes\",\"Evidence Link\"")
        );
        assert_eq!(
            lines.next(),
            Some("\"X\",\"Account\",\"https://x.example/a?b=1,2\",\"said \"\"hi\"\" then left\",\"\"")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_file_name_default() {
        assert_eq!(observables_file_name(""), "observables-incident.csv");
        assert_eq!(observables_file_name("Op X"), "observables-op-x.csv");
    }
}
