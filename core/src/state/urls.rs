use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Host suffixes mapped to the channel name used in the malicious list.
const CHANNELS: &[(&str, &str)] = &[
    ("t.me", "Telegram"),
    ("telegram.me", "Telegram"),
    ("x.com", "Twitter/X"),
    ("twitter.com", "Twitter/X"),
    ("facebook.com", "Facebook"),
    ("fb.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("tiktok.com", "TikTok"),
    ("vk.com", "VK"),
    ("ok.ru", "OK"),
    ("reddit.com", "Reddit"),
    ("linkedin.com", "LinkedIn"),
];

/// Registrable-looking host of `url` without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Platform name for known hosts, otherwise the bare domain.
pub fn channel_of(url: &str) -> Option<String> {
    let domain = domain_of(url)?;
    let named = CHANNELS.iter().find(|(suffix, _)| {
        domain == *suffix || domain.ends_with(&format!(".{}", suffix))
    });
    Some(match named {
        Some((_, name)) => name.to_string(),
        None => domain,
    })
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    #[default]
    Trusted,
    Malicious,
}

impl UrlKind {
    /// Name of the middle column: `domain` for trusted, `channel` for malicious.
    pub fn label_field(self) -> &'static str {
        match self {
            UrlKind::Trusted => "domain",
            UrlKind::Malicious => "channel",
        }
    }
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlKind::Trusted => write!(f, "trusted"),
            UrlKind::Malicious => write!(f, "malicious"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct UrlRecord {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub channel: String,
    pub archive_url: String,
    pub is_from_google_sheets: bool,
}

impl UrlRecord {
    fn key(&self, kind: UrlKind) -> (&str, &str, &str) {
        let label = match kind {
            UrlKind::Trusted => self.domain.as_str(),
            UrlKind::Malicious => self.channel.as_str(),
        };
        (self.url.as_str(), label, self.archive_url.as_str())
    }

    fn label_mut(&mut self, kind: UrlKind) -> &mut String {
        match kind {
            UrlKind::Trusted => &mut self.domain,
            UrlKind::Malicious => &mut self.channel,
        }
    }

    fn is_blank(&self, kind: UrlKind) -> bool {
        let (u, l, a) = self.key(kind);
        u.trim().is_empty() && l.trim().is_empty() && a.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub processed: usize,
    pub added: usize,
    pub duplicates: usize,
    pub empty: usize,
    /// Field names present in the first incoming record.
    pub available_fields: Vec<String>,
}

impl MergeReport {
    pub fn message(&self, kind: UrlKind) -> String {
        if self.processed == 0 {
            return format!("No {} URL data found in Google Sheets", kind);
        }
        format!(
            "Added {} new {} records from Google Sheets ({} duplicates skipped). Available fields: {}",
            self.added,
            kind,
            self.duplicates,
            self.available_fields.join(", ")
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UrlList {
    pub kind: UrlKind,
    pub records: Vec<UrlRecord>,
}

impl UrlList {
    pub fn new(kind: UrlKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[UrlRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, record: &UrlRecord) -> bool {
        let key = record.key(self.kind);
        self.records.iter().any(|r| r.key(self.kind) == key)
    }

    /// Manual entries go to the front of the list.
    pub fn add_manual(&mut self, record: UrlRecord) {
        self.records.insert(
            0,
            UrlRecord {
                is_from_google_sheets: false,
                ..record
            },
        );
    }

    pub fn remove(&mut self, index: usize) -> Option<UrlRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    /// Records whose domain (trusted) or channel (malicious) is empty.
    pub fn unspecified(&self) -> impl Iterator<Item = &UrlRecord> {
        let kind = self.kind;
        self.records
            .iter()
            .filter(move |r| r.key(kind).1.trim().is_empty() && !r.url.trim().is_empty())
    }

    /// Fills empty domains or channels from each record's URL. Returns how
    /// many were filled; unparseable URLs are left alone.
    pub fn fill_unspecified(&mut self) -> usize {
        let kind = self.kind;
        let mut filled = 0;
        for record in &mut self.records {
            if !record.key(kind).1.trim().is_empty() {
                continue;
            }
            let derived = match kind {
                UrlKind::Trusted => domain_of(&record.url),
                UrlKind::Malicious => channel_of(&record.url),
            };
            if let Some(label) = derived {
                *record.label_mut(kind) = label;
                filled += 1;
            }
        }
        filled
    }

    /// Appends imported records, skipping blank ones and exact triple matches.
    /// Existing entries are never overwritten.
    pub fn merge_imported(
        &mut self,
        incoming: Vec<UrlRecord>,
        available_fields: Vec<String>,
    ) -> MergeReport {
        let mut report = MergeReport {
            processed: incoming.len(),
            available_fields,
            ..MergeReport::default()
        };
        for mut record in incoming {
            if record.is_blank(self.kind) {
                report.empty += 1;
                continue;
            }
            if self.contains(&record) {
                report.duplicates += 1;
                continue;
            }
            record.is_from_google_sheets = true;
            self.records.push(record);
            report.added += 1;
        }
        report
    }
}
