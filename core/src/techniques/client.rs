use crate::config::NetworkConfig;
use crate::transport::{parse_url, HttpTransport};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

const TITLE_PREFIX: &str = "# Technique ";

/// Resolves a display title for a technique id. Never fails: the id itself is
/// the fallback.
pub trait TitleLookup {
    fn fetch_title(&self, technique_id: &str) -> String;
}

pub struct TechniqueClient<T: HttpTransport> {
    transport: T,
    url_template: String,
    timeout: Duration,
}

impl<T: HttpTransport> TechniqueClient<T> {
    pub fn new(transport: T, cfg: &NetworkConfig) -> Self {
        Self {
            transport,
            url_template: cfg.technique_title_url.clone(),
            timeout: cfg.technique_timeout(),
        }
    }

    fn try_fetch(&self, technique_id: &str) -> Option<String> {
        if !is_technique_id(technique_id) {
            debug!(technique_id, "not a technique id; skipping title lookup");
            return None;
        }
        let raw = self.url_template.replace("{id}", technique_id);
        let url = parse_url(&raw, "technique").ok()?;
        let resp = match self.transport.get(&url, self.timeout) {
            Ok(r) => r,
            Err(e) => {
                warn!(technique_id, error = %e, "technique title fetch failed");
                return None;
            }
        };
        if !resp.is_success() {
            warn!(technique_id, status = resp.status, "technique title fetch failed");
            return None;
        }
        title_from_markdown(&resp.text())
    }
}

impl<T: HttpTransport> TitleLookup for TechniqueClient<T> {
    fn fetch_title(&self, technique_id: &str) -> String {
        self.try_fetch(technique_id)
            .unwrap_or_else(|| technique_id.to_string())
    }
}

/// Remainder of the first non-empty `# Technique ` heading.
pub fn title_from_markdown(text: &str) -> Option<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix(TITLE_PREFIX))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(|t| t.to_string())
}

/// `T0049` or `T0049.001`.
pub fn is_technique_id(id: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^T\d{4}(\.\d{3})?$").ok())
        .as_ref()
        .map(|re| re.is_match(id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, CoreResult};
    use crate::transport::HttpResponse;
    use std::cell::RefCell;
    use url::Url;

    struct FakeTransport {
        status: u16,
        body: &'static str,
        requested: RefCell<Vec<String>>,
    }

    impl HttpTransport for FakeTransport {
        fn get(&self, url: &Url, _timeout: Duration) -> CoreResult<HttpResponse> {
            self.requested.borrow_mut().push(url.to_string());
            if self.status == 0 {
                return Err(CoreError::Network("connection refused".to_string()));
            }
            Ok(HttpResponse::new(self.status, self.body.as_bytes().to_vec()))
        }

        fn post_json(
            &self,
            _url: &Url,
            _body: &serde_json::Value,
            _bearer: Option<&str>,
            _timeout: Duration,
        ) -> CoreResult<HttpResponse> {
            unreachable!("technique client never posts")
        }
    }

    fn fake(status: u16, body: &'static str) -> FakeTransport {
        FakeTransport {
            status,
            body,
            requested: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_title_from_heading() {
        let t = fake(200, "intro\n# Technique T0049: Flooding the Information Space\nbody");
        let c = TechniqueClient::new(&t, &NetworkConfig::default());
        assert_eq!(
            c.fetch_title("T0049"),
            "T0049: Flooding the Information Space"
        );
        assert!(t.requested.borrow()[0].ends_with("/techniques/T0049.md"));
    }

    #[test]
    fn test_failures_fall_back_to_id() {
        let cfg = NetworkConfig::default();
        assert_eq!(TechniqueClient::new(fake(404, ""), &cfg).fetch_title("T0002"), "T0002");
        assert_eq!(TechniqueClient::new(fake(0, ""), &cfg).fetch_title("T0002"), "T0002");
        assert_eq!(
            TechniqueClient::new(fake(200, "# Technique   \nno title"), &cfg).fetch_title("T0002"),
            "T0002"
        );
    }

    #[test]
    fn test_malformed_id_is_not_fetched() {
        let t = fake(200, "# Technique X");
        let c = TechniqueClient::new(&t, &NetworkConfig::default());
        assert_eq!(c.fetch_title("../secrets"), "../secrets");
        assert!(t.requested.borrow().is_empty());
        assert!(is_technique_id("T0086.002"));
        assert!(!is_technique_id("TA01"));
    }
}
