use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "INCIDENT_ALERT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub summarizer: SummarizerConfig,
    pub document: DocumentConfig,
    pub storage: StorageConfig,
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub offline: bool,
    /// `{id}` is replaced with the technique identifier.
    pub technique_title_url: String,
    pub summarizer_url: String,
    pub sheets_base_url: String,
    /// Tried in order after the direct download fails; the target URL is
    /// percent-encoded and appended to each prefix.
    pub pdf_proxies: Vec<String>,
    pub pdf_direct_timeout_secs: u64,
    pub pdf_proxy_timeout_secs: u64,
    pub technique_timeout_secs: u64,
    pub summarize_timeout_secs: u64,
    pub sheets_timeout_secs: u64,
    /// The archive call returns only after every URL was submitted.
    pub archive_timeout_secs: u64,
    pub extra_allowlist_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizerConfig {
    pub max_input_chars: usize,
    pub min_extracted_chars: usize,
    pub success_display_secs: u64,
    pub error_display_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    pub creator: String,
    pub template_version: String,
    pub baseline_line_count: String,
    pub template_date: String,
    pub description: String,
    /// Page whose line count is stamped into the revision field. When unset
    /// the form snapshot itself is counted.
    pub page_url: Option<String>,
    pub page_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            summarizer: SummarizerConfig::default(),
            document: DocumentConfig::default(),
            storage: StorageConfig::default(),
            config_path: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            offline: false,
            technique_title_url:
                "https://raw.githubusercontent.com/DISARMFoundation/DISARMframeworks/refs/heads/main/generated_pages/techniques/{id}.md"
                    .to_string(),
            summarizer_url: "https://fimi-incident-form-genai.azurewebsites.net/generate-text"
                .to_string(),
            sheets_base_url: "https://fimi-incident-form-genai.azurewebsites.net".to_string(),
            pdf_proxies: vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://corsproxy.io/?url=".to_string(),
                "https://api.codetabs.com/v1/proxy?quest=".to_string(),
            ],
            pdf_direct_timeout_secs: 8,
            pdf_proxy_timeout_secs: 15,
            technique_timeout_secs: 10,
            summarize_timeout_secs: 60,
            sheets_timeout_secs: 30,
            archive_timeout_secs: 900,
            extra_allowlist_hosts: Vec::new(),
        }
    }
}

impl NetworkConfig {
    pub fn pdf_direct_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_direct_timeout_secs)
    }

    pub fn pdf_proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_proxy_timeout_secs)
    }

    pub fn technique_timeout(&self) -> Duration {
        Duration::from_secs(self.technique_timeout_secs)
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_secs(self.summarize_timeout_secs)
    }

    pub fn sheets_timeout(&self) -> Duration {
        Duration::from_secs(self.sheets_timeout_secs)
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs)
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 12_000,
            min_extracted_chars: 100,
            success_display_secs: 3,
            error_display_secs: 5,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            creator: "CDN Incident Alert authors".to_string(),
            template_version: "V7".to_string(),
            baseline_line_count: "1985".to_string(),
            template_date: "May 26, 2025".to_string(),
            description: "creator: author(s) of the form, title: version of the CDN Incident Report Word Template, keywords: line count of the reference form, revision: line count of the form used for this document, subject: date of the reference form".to_string(),
            page_url: None,
            page_timeout_secs: 10,
        }
    }
}

impl DocumentConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: home_dir().join(".local/state/incident-alert"),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    home_dir().join(".config/incident-alert/config.toml")
}

impl AppConfig {
    /// Defaults, then the TOML file (explicit path, `$INCIDENT_ALERT_CONFIG`,
    /// or the default location if it exists), then `INCIDENT_ALERT_*` env vars.
    pub fn load(config_path: Option<&Path>) -> CoreResult<Self> {
        let explicit = config_path
            .map(ToOwned::to_owned)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let path = explicit.clone().unwrap_or_else(default_config_path);

        let mut cfg = if path.exists() {
            let s = std::fs::read_to_string(&path)?;
            let mut cfg = Self::from_toml_str(&s)?;
            cfg.config_path = Some(path);
            cfg
        } else if let Some(p) = explicit {
            return Err(CoreError::Config(format!(
                "config file not found: {}",
                p.display()
            )));
        } else {
            Self::default()
        };

        cfg.apply_env_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        toml::from_str(s).map_err(|e| CoreError::Config(format!("invalid config TOML: {}", e)))
    }

    pub fn apply_env_overrides<F>(&mut self, get: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("INCIDENT_ALERT_OFFLINE") {
            self.network.offline = parse_bool(&v)
                .ok_or_else(|| CoreError::Config(format!("INCIDENT_ALERT_OFFLINE: {}", v)))?;
        }
        if let Some(v) = get("INCIDENT_ALERT_SUMMARIZER_URL") {
            if !v.trim().is_empty() {
                self.network.summarizer_url = v.trim().to_string();
            }
        }
        if let Some(v) = get("INCIDENT_ALERT_SHEETS_BASE_URL") {
            if !v.trim().is_empty() {
                self.network.sheets_base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(v) = get("INCIDENT_ALERT_PDF_PROXIES") {
            let proxies: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
            self.network.pdf_proxies = proxies;
        }
        if let Some(v) = get("INCIDENT_ALERT_STATE_DIR") {
            if !v.trim().is_empty() {
                self.storage.state_dir = PathBuf::from(v.trim());
            }
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_carry_fixed_timeouts() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.network.pdf_direct_timeout(), Duration::from_secs(8));
        assert_eq!(cfg.network.pdf_proxy_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.summarizer.max_input_chars, 12_000);
        assert!(!cfg.network.pdf_proxies.is_empty());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [network]
            pdf_direct_timeout_secs = 2
            [document]
            template_version = "V8"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.network.pdf_direct_timeout_secs, 2);
        assert_eq!(cfg.network.pdf_proxy_timeout_secs, 15);
        assert_eq!(cfg.document.template_version, "V8");
        assert_eq!(cfg.document.creator, DocumentConfig::default().creator);
    }

    #[test]
    fn env_overrides_apply_last() {
        let env: HashMap<&str, &str> = [
            ("INCIDENT_ALERT_OFFLINE", "yes"),
            ("INCIDENT_ALERT_PDF_PROXIES", "https://a.example/?u=, https://b.example/?u="),
        ]
        .into_iter()
        .collect();
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert!(cfg.network.offline);
        assert_eq!(cfg.network.pdf_proxies.len(), 2);
        assert_eq!(cfg.network.pdf_proxies[1], "https://b.example/?u=");
    }

    #[test]
    fn bad_bool_is_a_config_error() {
        let mut cfg = AppConfig::default();
        let r = cfg.apply_env_overrides(|k| {
            (k == "INCIDENT_ALERT_OFFLINE").then(|| "maybe".to_string())
        });
        assert!(matches!(r, Err(CoreError::Config(_))));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(AppConfig::from_toml_str("network = 3").is_err());
    }
}
